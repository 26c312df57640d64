//! The single game session: role assignment, turn arbitration and move relay.
//!
//! A `GameSession` is owned by exactly one task (the server loop). Every
//! connect, move and disconnect runs to completion against it before the next
//! one starts, so the turn check and the position update can never interleave.

use crate::client_manager::{Client, ClientManager};
use crate::config::SessionOptions;
use crate::registry::{ConnectionId, Registry, Role};
use crate::relay;
use crate::rules::{ChessRules, RulesEngine, RulesError};
use log::{debug, info, warn};
use serde_json::Value;
use shared::{ClientEvent, MoveRequest, ServerEvent};
use std::net::SocketAddr;
use tokio::sync::mpsc;

/// What happened to a move request.
#[derive(Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Requester does not hold the slot for the side to move. Nobody is told.
    Dropped,
    /// Applied and broadcast to every client.
    Accepted,
    /// Refused by the rules; only the requester is told.
    Rejected(RulesError),
}

pub struct GameSession<E: RulesEngine = ChessRules> {
    registry: Registry,
    clients: ClientManager,
    engine: E,
    options: SessionOptions,
}

impl GameSession<ChessRules> {
    pub fn new(options: SessionOptions) -> Self {
        Self::with_engine(ChessRules::new(), options)
    }
}

impl<E: RulesEngine> GameSession<E> {
    pub fn with_engine(engine: E, options: SessionOptions) -> Self {
        Self {
            registry: Registry::new(),
            clients: ClientManager::new(),
            engine,
            options,
        }
    }

    /// Registers a new connection, assigns its role and tells it which one.
    pub fn connect(&mut self, addr: SocketAddr, outbound: mpsc::Sender<String>) -> ConnectionId {
        let id = self.clients.allocate_id();
        let role = self.registry.assign_role(id);
        let client = Client::new(id, addr, role, outbound);

        let greeting = match role.color() {
            Some(color) => ServerEvent::PlayerRole(color),
            None => ServerEvent::SpectatorRole,
        };
        relay::send_to(&client, &greeting);
        if self.options.send_board_on_join {
            relay::send_to(&client, &ServerEvent::BoardState(self.engine.fen()));
        }

        self.clients.add_client(client);
        id
    }

    /// Forgets a connection and frees its slot. Spectators are not promoted.
    pub fn disconnect(&mut self, id: ConnectionId) -> Option<Role> {
        self.registry.release(id);
        self.clients.remove_client(id).map(|client| client.role)
    }

    /// Decodes a text frame from `id` and acts on it.
    ///
    /// Frames that are not JSON or name an unknown event are ignored.
    pub fn handle_frame(&mut self, id: ConnectionId, text: &str) {
        match ClientEvent::from_json(text) {
            Ok(ClientEvent::Move(payload)) => {
                self.try_move(id, payload);
            }
            Err(e) => {
                warn!("Ignoring frame from client {}: {}", id, e);
            }
        }
    }

    /// Arbitrates a move request from connection `id`.
    ///
    /// The payload is only read once `id` is known to hold the side to move.
    /// A payload that is not a well-formed move is rejected like an illegal
    /// one and echoed back unchanged.
    pub fn try_move(&mut self, id: ConnectionId, payload: impl Into<Value>) -> MoveOutcome {
        let payload = payload.into();
        let turn = self.engine.turn();
        if self.registry.holder_of(turn) != Some(id) {
            debug!(
                "Dropping {} from client {}: {:?} to move",
                payload, id, turn
            );
            return MoveOutcome::Dropped;
        }

        let attempt = MoveRequest::from_value(&payload)
            .map_err(|e| RulesError::InvalidNotation(e.to_string()))
            .and_then(|request| self.attempt(&request).map(|()| request));

        match attempt {
            Ok(request) => {
                info!("Client {} played {} as {:?}", id, request, turn);
                let mut lagging = relay::relay_accepted(&self.clients, &request, self.engine.fen());
                if self.options.enforce_game_over {
                    if let Some(outcome) = self.engine.outcome() {
                        info!("Game over: {:?}", outcome);
                        lagging.extend(relay::broadcast(&self.clients, &ServerEvent::GameOver(outcome)));
                    }
                }
                self.evict(lagging);
                MoveOutcome::Accepted
            }
            Err(e) => {
                info!("Invalid move {} from client {}: {}", payload, id, e);
                let delivered = self
                    .clients
                    .get(id)
                    .is_some_and(|client| relay::relay_rejected(client, &payload));
                if !delivered {
                    self.evict(vec![id]);
                }
                MoveOutcome::Rejected(e)
            }
        }
    }

    /// Disconnects clients that could not queue an event, so nobody is left
    /// watching a board with a gap in it.
    fn evict(&mut self, lagging: Vec<ConnectionId>) {
        for id in lagging {
            if let Some(role) = self.disconnect(id) {
                warn!("Disconnected client {} ({:?}) after a missed event", id, role);
            }
        }
    }

    fn attempt(&mut self, request: &MoveRequest) -> Result<(), RulesError> {
        if self.options.enforce_game_over && self.engine.outcome().is_some() {
            return Err(RulesError::GameOver);
        }
        self.engine.attempt_move(request)
    }

    pub fn role_of(&self, id: ConnectionId) -> Option<Role> {
        self.clients.get(id).map(|client| client.role)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }
}
