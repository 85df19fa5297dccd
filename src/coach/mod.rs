//! LLM coaching layer: context types, providers, and the orchestrator.

pub mod providers;
pub mod service;
pub mod types;

pub use providers::{create_provider, LlmProvider};
pub use service::CoachingOrchestrator;
pub use types::{
    CoachError, CoachingContext, CoachingFeedback, CoachingIntensity, SkillLevel,
};
