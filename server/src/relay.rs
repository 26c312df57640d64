//! Outbound event fan-out.
//!
//! Events are encoded once and queued on each recipient without waiting, so
//! the session loop never blocks on a socket. Clients whose queue refuses a
//! frame are handed back to the caller, which disconnects them.

use crate::client_manager::{Client, ClientManager};
use crate::registry::ConnectionId;
use log::error;
use serde_json::Value;
use shared::{MoveRequest, ServerEvent};

fn encode(event: &ServerEvent) -> Option<String> {
    match event.to_json() {
        Ok(frame) => Some(frame),
        Err(e) => {
            error!("Failed to encode {:?}: {}", event, e);
            None
        }
    }
}

/// Sends `event` to a single client.
pub fn send_to(client: &Client, event: &ServerEvent) -> bool {
    encode(event).is_some_and(|frame| client.send_frame(frame))
}

/// Sends `event` to every connected client.
///
/// Returns the clients that could not queue it.
pub fn broadcast(clients: &ClientManager, event: &ServerEvent) -> Vec<ConnectionId> {
    let Some(frame) = encode(event) else {
        return Vec::new();
    };
    clients
        .iter()
        .filter(|client| !client.send_frame(frame.clone()))
        .map(|client| client.id)
        .collect()
}

/// Announces an applied move: `move` first, then the new position.
///
/// A client that missed either event is returned once.
pub fn relay_accepted(clients: &ClientManager, request: &MoveRequest, fen: String) -> Vec<ConnectionId> {
    let mut lagging = broadcast(clients, &ServerEvent::Move(request.clone()));
    lagging.extend(broadcast(clients, &ServerEvent::BoardState(fen)));
    lagging.sort_unstable();
    lagging.dedup();
    lagging
}

/// Tells only the requester that its move was refused, echoing its payload.
pub fn relay_rejected(requester: &Client, payload: &Value) -> bool {
    send_to(requester, &ServerEvent::InvalidMove(payload.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Role;
    use std::net::SocketAddr;
    use tokio::sync::mpsc;

    fn manager_with(capacities: &[usize]) -> (ClientManager, Vec<mpsc::Receiver<String>>) {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let mut manager = ClientManager::new();
        let mut receivers = Vec::new();
        for capacity in capacities {
            let (tx, rx) = mpsc::channel(*capacity);
            let id = manager.allocate_id();
            manager.add_client(Client::new(id, addr, Role::Spectator, tx));
            receivers.push(rx);
        }
        (manager, receivers)
    }

    fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            events.push(ServerEvent::from_json(&frame).unwrap());
        }
        events
    }

    #[test]
    fn test_broadcast_reaches_everyone() {
        let (manager, mut receivers) = manager_with(&[4, 4, 4]);

        let lagging = broadcast(&manager, &ServerEvent::SpectatorRole);
        assert!(lagging.is_empty());
        for rx in receivers.iter_mut() {
            assert_eq!(drain(rx), vec![ServerEvent::SpectatorRole]);
        }
    }

    #[test]
    fn test_relay_accepted_orders_move_before_board() {
        let (manager, mut receivers) = manager_with(&[4, 4]);
        let request = MoveRequest::new("e2", "e4");

        assert!(relay_accepted(&manager, &request, "fen".to_string()).is_empty());

        for rx in receivers.iter_mut() {
            assert_eq!(
                drain(rx),
                vec![
                    ServerEvent::Move(request.clone()),
                    ServerEvent::BoardState("fen".to_string()),
                ]
            );
        }
    }

    #[test]
    fn test_relay_rejected_only_reaches_requester() {
        let (manager, mut receivers) = manager_with(&[4, 4]);
        let payload = serde_json::json!({"from": "e2", "to": 5});

        assert!(relay_rejected(manager.get(2).unwrap(), &payload));

        assert!(drain(&mut receivers[0]).is_empty());
        assert_eq!(drain(&mut receivers[1]), vec![ServerEvent::InvalidMove(payload)]);
    }

    #[test]
    fn test_stalled_client_does_not_block_others() {
        let (manager, mut receivers) = manager_with(&[1, 4, 4]);

        let request = MoveRequest::new("d2", "d4");
        let lagging = relay_accepted(&manager, &request, "fen".to_string());

        // The first client only had room for the move event and is reported.
        assert_eq!(lagging, vec![1]);
        assert_eq!(drain(&mut receivers[0]), vec![ServerEvent::Move(request.clone())]);
        assert_eq!(drain(&mut receivers[1]).len(), 2);
        assert_eq!(drain(&mut receivers[2]).len(), 2);
    }

    #[test]
    fn test_broadcast_skips_closed_clients() {
        let (manager, mut receivers) = manager_with(&[4, 4]);
        let closed = receivers.remove(0);
        drop(closed);

        let lagging = broadcast(&manager, &ServerEvent::BoardState("fen".to_string()));
        assert_eq!(lagging, vec![1]);
        assert_eq!(drain(&mut receivers[0]).len(), 1);
    }
}
