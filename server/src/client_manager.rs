//! Connected client bookkeeping for the game server
//!
//! This module tracks every live WebSocket connection, including:
//! - Server-assigned connection IDs (never reused)
//! - The role each connection was given when it joined
//! - The outbound queue feeding the connection's writer task
//!
//! Slot ownership lives in the registry; the client manager only knows who is
//! connected and how to reach them.

use crate::registry::{ConnectionId, Role};
use log::{info, warn};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// A live connection and the role it holds
#[derive(Debug)]
pub struct Client {
    /// Unique connection identifier assigned by the server
    pub id: ConnectionId,
    /// Remote address, used for logging only
    pub addr: SocketAddr,
    /// Role assigned on connect, fixed for the connection's lifetime
    pub role: Role,
    /// When the connection was accepted
    pub connected_at: Instant,
    /// Encoded frames waiting for the writer task
    outbound: mpsc::Sender<String>,
}

impl Client {
    pub fn new(id: ConnectionId, addr: SocketAddr, role: Role, outbound: mpsc::Sender<String>) -> Self {
        Self {
            id,
            addr,
            role,
            connected_at: Instant::now(),
            outbound,
        }
    }

    /// Queues an encoded frame without waiting.
    ///
    /// Returns false when the queue is full or closed. The frame is lost for
    /// this client only and the caller is expected to disconnect it, so a
    /// stalled socket never sees a partial stream of events.
    pub fn send_frame(&self, frame: String) -> bool {
        match self.outbound.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Outbound queue full for client {}, disconnecting", self.id);
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!("Client {} writer already closed", self.id);
                false
            }
        }
    }
}

/// All currently connected clients
///
/// Iteration order is connection order, which keeps broadcasts deterministic.
pub struct ClientManager {
    clients: BTreeMap<ConnectionId, Client>,
    next_client_id: ConnectionId,
}

impl ClientManager {
    /// Client IDs start from 1 and increment for each new connection.
    pub fn new() -> Self {
        Self {
            clients: BTreeMap::new(),
            next_client_id: 1,
        }
    }

    /// Hands out the next connection ID.
    pub fn allocate_id(&mut self) -> ConnectionId {
        let id = self.next_client_id;
        self.next_client_id += 1;
        id
    }

    pub fn add_client(&mut self, client: Client) {
        info!(
            "Client {} connected from {} as {:?}",
            client.id, client.addr, client.role
        );
        self.clients.insert(client.id, client);
    }

    /// Removes a client, returning it if it was still connected.
    ///
    /// Dropping the returned client closes its outbound queue, which ends the
    /// writer task.
    pub fn remove_client(&mut self, client_id: ConnectionId) -> Option<Client> {
        let client = self.clients.remove(&client_id)?;
        info!(
            "Client {} disconnected after {:.1}s",
            client.id,
            client.connected_at.elapsed().as_secs_f32()
        );
        Some(client)
    }

    pub fn get(&self, client_id: ConnectionId) -> Option<&Client> {
        self.clients.get(&client_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for ClientManager {
    fn default() -> Self {
        Self::new()
    }
}
