//! Configuration parsed from environment variables.

use crate::coach::types::CoachingIntensity;
use crate::coach::types::SkillLevel;
use crate::engine::session::DrawRules;

// ---------------------------------------------------------------------------
// Provider configuration
// ---------------------------------------------------------------------------

/// Connection settings for one LLM provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
}

/// LLM coaching configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Master switch for the coaching layer.
    pub enabled: bool,
    /// Preferred provider name ("anthropic", "openai"); empty = auto-detect.
    pub provider: String,
    pub anthropic: ProviderConfig,
    pub openai: ProviderConfig,
}

impl LlmConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        let mut cfg = LlmConfig::default();
        cfg.enabled = std::env::var("COACH_LLM_ENABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(cfg.enabled);
        if let Ok(v) = std::env::var("COACH_LLM_PROVIDER") {
            cfg.provider = v;
        }
        if let Ok(v) = std::env::var("ANTHROPIC_API_KEY") {
            cfg.anthropic.api_key = v;
        }
        if let Ok(v) = std::env::var("ANTHROPIC_MODEL") {
            cfg.anthropic.model = v;
        }
        if let Ok(v) = std::env::var("OPENAI_API_KEY") {
            cfg.openai.api_key = v;
        }
        if let Ok(v) = std::env::var("OPENAI_MODEL") {
            cfg.openai.model = v;
        }
        cfg
    }

    /// Config for a provider by name.
    pub fn provider_config(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "anthropic" => Some(&self.anthropic),
            "openai" => Some(&self.openai),
            _ => None,
        }
    }

    /// First provider with an API key set, anthropic preferred.
    pub fn auto_detect_provider(&self) -> Option<&'static str> {
        if !self.anthropic.api_key.is_empty() {
            Some("anthropic")
        } else if !self.openai.api_key.is_empty() {
            Some("openai")
        } else {
            None
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            enabled: false,
            provider: String::new(),
            anthropic: ProviderConfig {
                api_key: String::new(),
                model: "claude-sonnet-4-20250514".to_string(),
                endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            },
            openai: ProviderConfig {
                api_key: String::new(),
                model: "gpt-4o-mini".to_string(),
                endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Coach configuration
// ---------------------------------------------------------------------------

/// Top-level configuration: coaching defaults plus optional draw rules.
#[derive(Debug, Clone)]
pub struct CoachConfig {
    pub llm: LlmConfig,
    /// Skill assumed when the caller does not supply one.
    pub default_skill: SkillLevel,
    /// Coaching depth assumed when the caller does not supply one.
    pub default_intensity: CoachingIntensity,
    /// Draw detection applied to new sessions.
    pub draw_rules: DrawRules,
}

impl CoachConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        let mut cfg = CoachConfig::default();
        cfg.llm = LlmConfig::from_env();
        if let Some(elo) = std::env::var("COACH_DEFAULT_ELO")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            cfg.default_skill = SkillLevel(elo);
        }
        if let Some(intensity) = std::env::var("COACH_INTENSITY")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            cfg.default_intensity = intensity;
        }
        cfg.draw_rules = DrawRules {
            fifty_move: env_flag("COACH_RULE_FIFTY_MOVE"),
            threefold_repetition: env_flag("COACH_RULE_THREEFOLD"),
            insufficient_material: env_flag("COACH_RULE_MATERIAL"),
        };
        cfg
    }
}

impl Default for CoachConfig {
    fn default() -> Self {
        CoachConfig {
            llm: LlmConfig::default(),
            default_skill: SkillLevel(800),
            default_intensity: CoachingIntensity::Medium,
            draw_rules: DrawRules::default(),
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = CoachConfig::default();
        assert!(!config.llm.enabled);
        assert_eq!(config.default_skill, SkillLevel(800));
        assert_eq!(config.default_intensity, CoachingIntensity::Medium);
        assert!(!config.draw_rules.fifty_move);
        assert!(!config.draw_rules.threefold_repetition);
        assert!(!config.draw_rules.insufficient_material);
    }

    #[test]
    fn default_llm_providers() {
        let config = LlmConfig::default();
        assert_eq!(config.anthropic.model, "claude-sonnet-4-20250514");
        assert!(config.anthropic.endpoint.contains("api.anthropic.com"));
        assert!(config.openai.endpoint.contains("api.openai.com"));
    }

    #[test]
    fn provider_config_lookup() {
        let config = LlmConfig::default();
        assert!(config.provider_config("anthropic").is_some());
        assert!(config.provider_config("openai").is_some());
        assert!(config.provider_config("gemini").is_none());
    }

    #[test]
    fn auto_detect_prefers_anthropic() {
        let mut config = LlmConfig::default();
        assert_eq!(config.auto_detect_provider(), None);
        config.openai.api_key = "sk-test".to_string();
        assert_eq!(config.auto_detect_provider(), Some("openai"));
        config.anthropic.api_key = "sk-ant-test".to_string();
        assert_eq!(config.auto_detect_provider(), Some("anthropic"));
    }
}
