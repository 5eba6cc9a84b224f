use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use neurosync_ai::config::default_providers;
use neurosync_ai::{AiConfig, CacheConfig, EnrichmentConfig, GatewayConfig, ProviderSpec};
use neurosync_core::{MoodConfig, PlannerConfig, ScoringWeights};

use crate::state::{ensure_neurosync_home, neurosync_home};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub scoring: ScoringWeights,
    pub mood: MoodConfig,
    pub gateway: GatewayConfig,
    pub enrichment: EnrichmentConfig,
    pub cache: CacheConfig,
    pub logging: LoggingSection,
    pub providers: Vec<ProviderSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSection {
    /// EnvFilter directive used when RUST_LOG is unset.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scoring: ScoringWeights::default(),
            mood: MoodConfig::default(),
            gateway: GatewayConfig::default(),
            enrichment: EnrichmentConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingSection::default(),
            providers: default_providers(),
        }
    }
}

impl Config {
    pub fn planner(&self) -> PlannerConfig {
        PlannerConfig {
            scoring: self.scoring.clone(),
            mood: self.mood.clone(),
        }
    }

    pub fn ai(&self) -> AiConfig {
        AiConfig {
            gateway: self.gateway,
            enrichment: self.enrichment.clone(),
            cache: self.cache,
            providers: self.providers.clone(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(neurosync_home()?.join("config.toml"))
}

pub fn parse_config(s: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(s).context("parse config.toml")?;
    cfg.planner().validate().context("invalid [scoring] or [mood] section")?;
    Ok(cfg)
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = ensure_neurosync_home()?.join("config.toml");
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config(cfg: &Config) -> Result<()> {
    print!("{}", toml::to_string_pretty(cfg).context("serialize config")?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurosync_ai::ProviderKind;

    #[test]
    fn test_empty_file_is_defaults() {
        assert_eq!(parse_config("").unwrap(), Config::default());
    }

    #[test]
    fn test_sections_override() {
        let cfg = parse_config(
            r#"
[scoring]
mood_weight = 0.5

[gateway]
failure_threshold = 5

[cache]
enabled = true

[logging]
level = "neurosync=debug"

[[providers]]
kind = "openai"
model = "gpt-4o"
base_url = "http://localhost:8080"
"#,
        )
        .unwrap();
        assert_eq!(cfg.scoring.mood_weight, 0.5);
        assert_eq!(cfg.scoring.urgency_weight, 0.40);
        assert_eq!(cfg.gateway.failure_threshold, 5);
        assert_eq!(cfg.gateway.cooldown_secs, 30);
        assert!(cfg.cache.enabled);
        assert_eq!(cfg.cache.ttl_hours, 24);
        assert_eq!(cfg.cache.max_entries, 512);
        assert_eq!(cfg.logging.level, "neurosync=debug");
        assert_eq!(cfg.providers.len(), 1);
        assert_eq!(cfg.providers[0].kind, ProviderKind::OpenAi);
        assert_eq!(cfg.providers[0].max_tokens, 1000);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        assert!(parse_config("[scoring]\nurgency_weight = -1.0\n").is_err());
    }

    #[test]
    fn test_defaults_round_trip_through_toml() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(s.contains("[[providers]]"));
        assert_eq!(parse_config(&s).unwrap(), Config::default());
    }
}
