//! Chess rules engine: board representation, move generation, notation
//! codecs, and game sessions.

pub mod movegen;
pub mod pgn;
pub mod position;
pub mod san;
pub mod session;
pub mod types;

pub use position::Position;
pub use session::{DrawRules, GameSession, MoveOutcome, PlyRecord, SessionState, UndoneMove};
pub use types::{
    CastlingRights, Color, EngineError, GamePhase, Move, Piece, PieceKind, Square,
};
