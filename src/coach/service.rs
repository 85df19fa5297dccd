//! Coaching orchestration: prompt assembly and provider dispatch.
//!
//! The orchestrator is a thin pass-through. It formats the game context into
//! a prompt, sends it to the configured LLM provider, and returns the reply
//! text unmodified. It never interprets, scores, or rewrites the response,
//! and a provider failure never touches engine state.

use chrono::Utc;

use crate::config::LlmConfig;
use crate::engine::types::Color;

use super::providers::{self, LlmProvider};
use super::types::{CoachError, CoachingContext, CoachingFeedback, SkillLevel};

// ---------------------------------------------------------------------------
// System prompt
// ---------------------------------------------------------------------------

const SYSTEM_PROMPT: &str = "You are a patient, encouraging chess coach. \
You explain ideas at the player's level, reference concrete squares and \
pieces, and keep the tone constructive.";

// ---------------------------------------------------------------------------
// CoachingOrchestrator
// ---------------------------------------------------------------------------

/// Routes coaching requests to an LLM provider.
pub struct CoachingOrchestrator {
    config: LlmConfig,
}

impl CoachingOrchestrator {
    pub fn new(config: LlmConfig) -> Self {
        Self { config }
    }

    /// Whether coaching is available (enabled + at least one provider key).
    pub fn is_available(&self) -> bool {
        self.config.enabled && self.config.auto_detect_provider().is_some()
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Coaching feedback on the most recent move in `ctx`.
    pub async fn feedback_for_move(
        &self,
        ctx: &CoachingContext,
    ) -> Result<CoachingFeedback, CoachError> {
        let prompt = Self::build_move_prompt(ctx);
        self.dispatch(&prompt).await
    }

    /// Post-game summary for a finished game.
    pub async fn analyze_game(
        &self,
        pgn: &str,
        result: &str,
        player_color: Color,
        skill: SkillLevel,
    ) -> Result<CoachingFeedback, CoachError> {
        let prompt = Self::build_analysis_prompt(pgn, result, player_color, skill);
        self.dispatch(&prompt).await
    }

    /// Answer a follow-up question in the context of the current game.
    pub async fn answer_question(
        &self,
        question: &str,
        ctx: &CoachingContext,
        recent_coaching: Option<&str>,
    ) -> Result<CoachingFeedback, CoachError> {
        let prompt = Self::build_question_prompt(question, ctx, recent_coaching);
        self.dispatch(&prompt).await
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn dispatch(&self, prompt: &str) -> Result<CoachingFeedback, CoachError> {
        if !self.config.enabled {
            return Err(CoachError::Disabled);
        }
        let provider = self.resolve_provider()?;
        tracing::debug!(provider = provider.name(), "coaching request");

        let text = provider.ask(SYSTEM_PROMPT, prompt).await?;
        tracing::debug!(provider = provider.name(), chars = text.len(), "coaching response");

        Ok(CoachingFeedback {
            text,
            provider: provider.name().to_string(),
            timestamp: Utc::now(),
        })
    }

    /// Resolve the provider: the configured one when it has a key, otherwise
    /// the first provider with a key.
    fn resolve_provider(&self) -> Result<Box<dyn LlmProvider>, CoachError> {
        let name = if !self.config.provider.is_empty() {
            match self.config.provider_config(&self.config.provider) {
                Some(cfg) if !cfg.api_key.is_empty() => self.config.provider.as_str(),
                Some(_) => self
                    .config
                    .auto_detect_provider()
                    .ok_or_else(|| CoachError::MissingApiKey(self.config.provider.clone()))?,
                None => {
                    return Err(CoachError::UnsupportedProvider(self.config.provider.clone()))
                }
            }
        } else {
            self.config
                .auto_detect_provider()
                .ok_or_else(|| CoachError::MissingApiKey("(none)".to_string()))?
        };

        let cfg = self
            .config
            .provider_config(name)
            .ok_or_else(|| CoachError::UnsupportedProvider(name.to_string()))?;
        providers::create_provider(name, cfg)
    }

    // -----------------------------------------------------------------------
    // Prompt builders
    // -----------------------------------------------------------------------

    fn build_move_prompt(ctx: &CoachingContext) -> String {
        let mut prompt = format!(
            "You are coaching a player rated {} ELO who wants to improve to 1500+.\n\n\
             Game Phase: {}\n",
            ctx.skill.0, ctx.phase
        );
        if let Some(ref san) = ctx.last_move_san {
            prompt.push_str(&format!("Move Played: {san}\n"));
        }
        prompt.push_str(&format!("Current Position (FEN): {}\n", ctx.fen));
        if !ctx.move_history.is_empty() {
            prompt.push_str(&format!("Move History: {}\n", ctx.move_history.join(" ")));
        }
        prompt.push_str(&format!(
            "\nCoaching Intensity: {}\n\n{}\n\n\
             Provide coaching feedback on this move. Consider:\n\
             1. Was this move sound? Why or why not?\n\
             2. What strategic or tactical ideas does it support or miss?\n\
             3. In the context of the {}, what should the player be thinking about?\n\n\
             Keep your response conversational and encouraging. End with a specific \
             question or observation to help them think about the next move.",
            ctx.intensity.guidance(),
            ctx.skill.guidance(),
            ctx.phase
        ));
        prompt
    }

    fn build_analysis_prompt(
        pgn: &str,
        result: &str,
        player_color: Color,
        skill: SkillLevel,
    ) -> String {
        format!(
            "You are analyzing a game for a {} ELO player who played as {}.\n\n\
             Game Result: {}\n\
             PGN:\n{}\n\n\
             Provide a post-game analysis covering:\n\
             1. Overall game assessment - what went well, what didn't\n\
             2. Key moments or turning points\n\
             3. 2-3 specific areas for improvement based on this game\n\
             4. One concrete practice suggestion to work on for next game\n\n\
             Keep the tone encouraging and constructive.",
            skill.0, player_color, result, pgn
        )
    }

    fn build_question_prompt(
        question: &str,
        ctx: &CoachingContext,
        recent_coaching: Option<&str>,
    ) -> String {
        let mut prompt = format!(
            "You are having a conversation with a {} ELO player.\n\n\
             Current Game Context:\n\
             - Phase: {}\n\
             - Position (FEN): {}\n",
            ctx.skill.0, ctx.phase, ctx.fen
        );
        if !ctx.move_history.is_empty() {
            prompt.push_str(&format!(
                "- Move History: {}\n",
                ctx.move_history.join(" ")
            ));
        }
        if let Some(recent) = recent_coaching {
            prompt.push_str(&format!("- Recent Coaching: {recent}\n"));
        }
        prompt.push_str(&format!(
            "\nPlayer's Question: \"{question}\"\n\n{}\n\n\
             Answer their question in a clear, encouraging way. Use the current \
             game context to make your explanation concrete and relevant. If the \
             question relates to the current position, reference specific pieces \
             or squares. Keep your response conversational and helpful.",
            ctx.skill.guidance()
        ));
        prompt
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
