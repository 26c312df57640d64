//! Player slot ownership and role assignment.
//!
//! The registry holds exactly two slots, one per color. A slot is either free
//! or owned by a single connection, and a connection owns at most one slot.
//! Everyone else is a spectator.

use log::info;
use shared::Color;

pub type ConnectionId = u32;

/// Capacity in which a connection takes part in the game.
///
/// Assigned once on connect and kept for the lifetime of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Player(Color),
    Spectator,
}

impl Role {
    pub fn color(self) -> Option<Color> {
        match self {
            Role::Player(color) => Some(color),
            Role::Spectator => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    white: Option<ConnectionId>,
    black: Option<ConnectionId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, color: Color) -> &mut Option<ConnectionId> {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// Fills the slot for `color` with `connection` if it is free.
    ///
    /// Returns false when the slot is already taken, or when `connection`
    /// already owns the other slot.
    pub fn assign_if_free(&mut self, color: Color, connection: ConnectionId) -> bool {
        if self.holder_of(color.opposite()) == Some(connection) {
            return false;
        }
        let slot = self.slot_mut(color);
        if slot.is_some() {
            return false;
        }
        *slot = Some(connection);
        true
    }

    /// Frees whichever slot `connection` holds. No-op for spectators.
    ///
    /// Returns the color that was released, if any.
    pub fn release(&mut self, connection: ConnectionId) -> Option<Color> {
        for color in [Color::White, Color::Black] {
            let slot = self.slot_mut(color);
            if *slot == Some(connection) {
                *slot = None;
                info!("Released {:?} slot held by connection {}", color, connection);
                return Some(color);
            }
        }
        None
    }

    pub fn holder_of(&self, color: Color) -> Option<ConnectionId> {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    /// Picks a role for a freshly connected client: white first, then black,
    /// then spectator.
    pub fn assign_role(&mut self, connection: ConnectionId) -> Role {
        if self.assign_if_free(Color::White, connection) {
            Role::Player(Color::White)
        } else if self.assign_if_free(Color::Black, connection) {
            Role::Player(Color::Black)
        } else {
            Role::Spectator
        }
    }
}
