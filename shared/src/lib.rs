//! Wire protocol shared between the game server and its clients.
//!
//! Every frame on the WebSocket is a JSON text message of the form
//! `{"event": "<name>", "data": <payload>}`. Events without a payload omit
//! the `data` key entirely.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Side of the board.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
}

impl Color {
    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

/// A move as submitted by a client.
///
/// Squares are kept as the raw strings the client sent so that accepted and
/// rejected moves can be echoed back verbatim.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
}

impl MoveRequest {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, piece: &str) -> Self {
        self.promotion = Some(piece.to_string());
        self
    }

    /// Reads a move out of a raw `move` payload.
    ///
    /// Fails when `from` or `to` is missing or any field has the wrong type.
    pub fn from_value(payload: &Value) -> Result<Self, ProtocolError> {
        Ok(Self::deserialize(payload)?)
    }
}

impl From<MoveRequest> for Value {
    fn from(request: MoveRequest) -> Self {
        let mut object = Map::new();
        object.insert("from".to_string(), Value::String(request.from));
        object.insert("to".to_string(), Value::String(request.to));
        if let Some(piece) = request.promotion {
            object.insert("promotion".to_string(), Value::String(piece));
        }
        Value::Object(object)
    }
}

impl std::fmt::Display for MoveRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(piece) = &self.promotion {
            write!(f, "={}", piece)?;
        }
        Ok(())
    }
}

/// How a finished game ended.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GameResult {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct GameOutcome {
    pub result: GameResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Color>,
}

/// Events sent from a client to the server.
///
/// The `move` payload stays raw until the sender is known to be on turn, so a
/// badly typed move can still be echoed back in `invalidMove`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    Move(Value),
}

/// Events sent from the server to one or more clients.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    PlayerRole(Color),
    SpectatorRole,
    Move(MoveRequest),
    BoardState(String),
    /// The payload exactly as the requester sent it.
    InvalidMove(Value),
    GameOver(GameOutcome),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed event: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ClientEvent {
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl ServerEvent {
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}
