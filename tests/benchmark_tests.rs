//! Performance benchmarks for the arbitration hot paths

use server::config::SessionOptions;
use server::registry::Registry;
use server::rules::{ChessRules, RulesEngine};
use server::session::{GameSession, MoveOutcome};
use shared::{MoveRequest, ServerEvent};
use std::time::Instant;
use tokio::sync::mpsc;

/// Benchmarks role assignment and release
#[test]
fn benchmark_role_assignment() {
    let iterations = 100_000;
    let start = Instant::now();

    let mut registry = Registry::new();
    for id in 0..iterations {
        registry.assign_role(id);
        if id % 3 == 0 {
            registry.release(id);
        }
    }

    let duration = start.elapsed();
    println!(
        "Role assignment: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 100ms for 100k iterations
    assert!(duration.as_millis() < 100);
}

/// Benchmarks move validation and FEN serialization
#[test]
fn benchmark_rules_engine() {
    let iterations = 1_000;
    let moves = [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")];
    let start = Instant::now();

    let mut rules = ChessRules::new();
    for i in 0..iterations {
        let (from, to) = moves[i % moves.len()];
        rules.attempt_move(&MoveRequest::new(from, to)).unwrap();
        let _ = rules.fen();
    }

    let duration = start.elapsed();
    println!(
        "Rules engine: {} moves in {:?} ({:.2} μs/move)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks broadcasting accepted moves to a crowd of spectators
#[test]
fn benchmark_move_broadcast() {
    let spectators = 200;
    let rounds = 100;
    let addr = "127.0.0.1:9999".parse().unwrap();

    let mut session = GameSession::new(SessionOptions::default());
    let mut receivers = Vec::new();
    let mut ids = Vec::new();
    for _ in 0..spectators + 2 {
        let (tx, rx) = mpsc::channel(4 * rounds + 4);
        ids.push(session.connect(addr, tx));
        receivers.push(rx);
    }
    let (white, black) = (ids[0], ids[1]);

    let moves = [
        (white, "g1", "f3"),
        (black, "g8", "f6"),
        (white, "f3", "g1"),
        (black, "f6", "g8"),
    ];
    let start = Instant::now();

    for i in 0..rounds {
        let (id, from, to) = moves[i % moves.len()];
        assert_eq!(
            session.try_move(id, MoveRequest::new(from, to)),
            MoveOutcome::Accepted
        );
    }

    let duration = start.elapsed();
    println!(
        "Broadcast: {} moves to {} clients in {:?}",
        rounds,
        spectators + 2,
        duration
    );

    // Every client got its role plus two events per move.
    for rx in receivers.iter_mut() {
        let mut count = 0;
        while let Ok(frame) = rx.try_recv() {
            assert!(ServerEvent::from_json(&frame).is_ok());
            count += 1;
        }
        assert_eq!(count, 1 + 2 * rounds);
    }

    assert!(duration.as_millis() < 1000);
}
