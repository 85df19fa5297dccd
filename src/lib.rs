//! Chess rules engine and game-session core with LLM coaching orchestration.
//!
//! The crate has two halves:
//!
//! - [`engine`] — board representation, legal-move generation, SAN/FEN/PGN
//!   codecs, and [`engine::GameSession`] with exact snapshot-based undo.
//! - [`coach`] — a thin orchestrator that forwards structured game context
//!   to an LLM provider and passes the reply through unmodified.
//!
//! ```
//! use chess_coach::engine::GameSession;
//!
//! let mut session = GameSession::new();
//! let outcome = session.apply_move("e4")?;
//! assert_eq!(outcome.san, "e4");
//! session.undo_last_move()?;
//! # Ok::<(), chess_coach::engine::EngineError>(())
//! ```

pub mod coach;
pub mod config;
pub mod engine;

pub use coach::{CoachError, CoachingContext, CoachingFeedback, CoachingOrchestrator};
pub use config::{CoachConfig, LlmConfig, ProviderConfig};
pub use engine::{
    Color, DrawRules, EngineError, GamePhase, GameSession, Move, MoveOutcome, Piece, PieceKind,
    Position, SessionState, Square,
};
