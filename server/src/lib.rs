//! # Chess Game Server Library
//!
//! This library provides the authoritative server for a realtime two-player
//! chess game. It decides who plays which color, whose turn it is and which
//! moves are accepted, and keeps every connected client in sync.
//!
//! ## Core Responsibilities
//!
//! ### Role Assignment
//! The first client to connect plays white, the second plays black, and
//! everyone after that watches as a spectator. A role is fixed for the
//! lifetime of the connection. When a player leaves, their color goes to the
//! next client that connects; spectators already watching stay spectators.
//!
//! ### Turn Arbitration
//! A move request is only considered when it comes from the connection that
//! holds the color to move. Anything else is dropped without a reply.
//! Legality is left entirely to the rules engine.
//!
//! ### Move Relay
//! An accepted move is broadcast to every client as a `move` event followed by
//! a `boardState` event carrying the new position. A rejected move is answered
//! with `invalidMove` to the requester only.
//!
//! ## Architecture Design
//!
//! ### Single-Owner Event Loop
//! One task owns the [`session::GameSession`] and processes connects, frames
//! and disconnects strictly one at a time. Connection tasks only forward
//! messages over a channel, so role assignment and the turn-check-then-move
//! sequence are atomic without any locking.
//!
//! ### WebSocket Transport
//! Each client holds one WebSocket carrying JSON text frames. Outbound frames
//! go through a bounded per-connection queue drained by a dedicated writer
//! task; a slow client loses frames instead of stalling the others.
//!
//! ## Module Organization
//!
//! - `registry`: the white and black slots and role assignment
//! - `rules`: the chess rules adapter over shakmaty
//! - `client_manager`: live connections, their roles and outbound queues
//! - `relay`: encoding and fan-out of server events
//! - `session`: the game session tying the above together
//! - `network`: socket handling and the main server loop
//! - `config`: command-line configuration
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let mut server = Server::bind(&config).await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod network;
pub mod registry;
pub mod relay;
pub mod rules;
pub mod session;
