//! Coaching data types: request context, player parameters, feedback, errors.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::session::GameSession;
use crate::engine::types::GamePhase;

// ---------------------------------------------------------------------------
// Player parameters
// ---------------------------------------------------------------------------

/// Player strength as an ELO rating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillLevel(pub u32);

impl SkillLevel {
    /// Coaching emphasis appropriate to the rating band.
    pub fn guidance(self) -> &'static str {
        if self.0 < 1000 {
            "Focus on:\n\
             - Basic tactical patterns (forks, pins, skewers)\n\
             - Piece development principles\n\
             - King safety\n\
             - Avoiding one-move blunders\n\
             Keep explanations simple and concrete."
        } else if self.0 < 1200 {
            "Focus on:\n\
             - Tactical awareness and pattern recognition\n\
             - Opening principles (control center, develop pieces, castle early)\n\
             - Basic endgame patterns\n\
             - Calculating 2-3 moves ahead"
        } else {
            "Focus on:\n\
             - Strategic planning and pawn structures\n\
             - Advanced tactical combinations\n\
             - Positional understanding\n\
             - Opening repertoire development"
        }
    }
}

impl Default for SkillLevel {
    fn default() -> Self {
        SkillLevel(800)
    }
}

/// How much coaching detail the player asked for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoachingIntensity {
    Low,
    #[default]
    Medium,
    High,
}

impl CoachingIntensity {
    pub fn guidance(self) -> &'static str {
        match self {
            CoachingIntensity::Low => {
                "Give brief, encouraging feedback. Focus on one key point."
            }
            CoachingIntensity::Medium => {
                "Provide balanced feedback with strategic insights and one or two tactical points."
            }
            CoachingIntensity::High => {
                "Give detailed analysis including strategic themes, tactical opportunities, and alternative moves."
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CoachingIntensity::Low => "low",
            CoachingIntensity::Medium => "medium",
            CoachingIntensity::High => "high",
        }
    }
}

impl FromStr for CoachingIntensity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(CoachingIntensity::Low),
            "medium" => Ok(CoachingIntensity::Medium),
            "high" => Ok(CoachingIntensity::High),
            other => Err(format!("unknown coaching intensity '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Request context
// ---------------------------------------------------------------------------

/// Everything the coach needs about a game, captured by value at request
/// time. The session can keep mutating; the context will not change under
/// an in-flight request.
#[derive(Clone, Debug, Serialize)]
pub struct CoachingContext {
    /// SAN of the most recent move, if any ply has been played.
    pub last_move_san: Option<String>,
    /// FEN of the current position.
    pub fen: String,
    pub phase: GamePhase,
    /// SAN history, oldest first.
    pub move_history: Vec<String>,
    pub skill: SkillLevel,
    pub intensity: CoachingIntensity,
}

impl CoachingContext {
    /// Snapshot a session for a coaching request.
    pub fn from_session(
        session: &GameSession,
        skill: SkillLevel,
        intensity: CoachingIntensity,
    ) -> Self {
        let moves = session.move_history();
        CoachingContext {
            last_move_san: moves.last().cloned(),
            fen: session.current_position().to_fen(),
            phase: session.current_phase(),
            move_history: moves,
            skill,
            intensity,
        }
    }
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

/// A coaching response: the provider's text, passed through unmodified.
#[derive(Clone, Debug, Serialize)]
pub struct CoachingFeedback {
    pub text: String,
    pub provider: String,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Coaching-layer errors. Kept apart from `EngineError`: a provider outage
/// never invalidates engine state.
#[derive(Debug, thiserror::Error)]
pub enum CoachError {
    #[error("coaching is disabled")]
    Disabled,

    #[error("missing API key for provider '{0}'")]
    MissingApiKey(String),

    #[error("unsupported provider '{0}'")]
    UnsupportedProvider(String),

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("failed to parse provider response: {0}")]
    ParseError(String),

    #[error("provider error: {0}")]
    ProviderError(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
