//! Chess rules adapter.
//!
//! The server never decides legality itself. Everything about the position
//! goes through a [`RulesEngine`], and the production implementation wraps
//! shakmaty.

use shakmaty::{
    fen::Fen, uci::UciMove, CastlingMode, Chess, EnPassantMode, Position, Rank, Role, Square,
};
use shared::{Color, GameOutcome, GameResult, MoveRequest};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RulesError {
    /// Square or promotion piece that does not parse.
    #[error("invalid notation: {0}")]
    InvalidNotation(String),

    /// Well-formed move that the position does not allow.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// Position is already terminal and further moves are refused.
    #[error("game is already over")]
    GameOver,

    #[error("invalid FEN: {0}")]
    InvalidFen(String),
}

/// The operations the session needs from a chess rules implementation.
pub trait RulesEngine: Send {
    /// Color whose move it is.
    fn turn(&self) -> Color;

    /// Validates `request` against the current position and applies it.
    ///
    /// On error the position must be left untouched.
    fn attempt_move(&mut self, request: &MoveRequest) -> Result<(), RulesError>;

    /// Current position in Forsyth-Edwards notation.
    fn fen(&self) -> String;

    /// Set once the position is checkmate, stalemate or a dead draw.
    fn outcome(&self) -> Option<GameOutcome>;
}

fn from_shakmaty(color: shakmaty::Color) -> Color {
    match color {
        shakmaty::Color::White => Color::White,
        shakmaty::Color::Black => Color::Black,
    }
}

fn parse_square(text: &str) -> Result<Square, RulesError> {
    text.parse::<Square>()
        .map_err(|_| RulesError::InvalidNotation(format!("square {:?}", text)))
}

fn parse_promotion(text: &str) -> Result<Role, RulesError> {
    match text {
        "n" => Ok(Role::Knight),
        "b" => Ok(Role::Bishop),
        "r" => Ok(Role::Rook),
        "q" => Ok(Role::Queen),
        _ => Err(RulesError::InvalidNotation(format!("promotion {:?}", text))),
    }
}

/// Standard chess backed by shakmaty.
#[derive(Debug, Clone, Default)]
pub struct ChessRules {
    position: Chess,
}

impl ChessRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let fen: Fen = fen
            .parse()
            .map_err(|e| RulesError::InvalidFen(format!("{e}")))?;
        let position: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| RulesError::InvalidFen(format!("{e}")))?;
        Ok(Self { position })
    }

    fn is_promotion_square(&self, from: Square, to: Square) -> bool {
        self.position.board().role_at(from) == Some(Role::Pawn)
            && matches!(to.rank(), Rank::First | Rank::Eighth)
    }
}

impl RulesEngine for ChessRules {
    fn turn(&self) -> Color {
        from_shakmaty(self.position.turn())
    }

    fn attempt_move(&mut self, request: &MoveRequest) -> Result<(), RulesError> {
        let from = parse_square(&request.from)?;
        let to = parse_square(&request.to)?;
        let promotion = request.promotion.as_deref().map(parse_promotion).transpose()?;

        // A promotion piece on an ordinary move is ignored, a missing one on
        // a promoting move makes the move illegal.
        let uci = UciMove::Normal {
            from,
            to,
            promotion: promotion.filter(|_| self.is_promotion_square(from, to)),
        };

        let m = uci
            .to_move(&self.position)
            .map_err(|_| RulesError::IllegalMove(request.to_string()))?;

        self.position = self
            .position
            .clone()
            .play(&m)
            .map_err(|_| RulesError::IllegalMove(request.to_string()))?;
        Ok(())
    }

    fn fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Always).to_string()
    }

    fn outcome(&self) -> Option<GameOutcome> {
        if self.position.is_checkmate() {
            Some(GameOutcome {
                result: GameResult::Checkmate,
                winner: Some(self.turn().opposite()),
            })
        } else if self.position.is_stalemate() {
            Some(GameOutcome {
                result: GameResult::Stalemate,
                winner: None,
            })
        } else if self.position.is_insufficient_material() {
            Some(GameOutcome {
                result: GameResult::InsufficientMaterial,
                winner: None,
            })
        } else {
            None
        }
    }
}
