use std::path::PathBuf;

use anyhow::{Context, Result};

/// One year.
const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

/// Secrets that are fine for local runs but must never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &["dev-secret-change-me", "your-secret-key-here"];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    /// 24 hours by default. Some deployments ran with 30 minutes.
    pub token_ttl_minutes: i64,
    pub rosbridge_url: Option<String>,
    pub led_topic: String,
    pub camera_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub vision_model: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = or("PLANTY_PORT", "8000")
            .parse()
            .context("PLANTY_PORT must be a port number")?;
        let token_ttl_minutes: i64 = or("PLANTY_TOKEN_TTL_MINUTES", "1440")
            .parse()
            .context("PLANTY_TOKEN_TTL_MINUTES must be an integer")?;
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&token_ttl_minutes) {
            anyhow::bail!(
                "PLANTY_TOKEN_TTL_MINUTES must be between 1 and {}",
                MAX_TOKEN_TTL_MINUTES
            );
        }

        Ok(Self {
            host: or("PLANTY_HOST", "0.0.0.0"),
            port,
            db_path: or("PLANTY_DB_PATH", "planty.db").into(),
            jwt_secret: or("PLANTY_JWT_SECRET", "dev-secret-change-me"),
            token_ttl_minutes,
            rosbridge_url: get("PLANTY_ROSBRIDGE_URL"),
            led_topic: or("PLANTY_LED_TOPIC", planty_bus::rosbridge::DEFAULT_TOPIC),
            camera_url: get("PLANTY_CAMERA_URL"),
            openai_api_key: get("OPENAI_API_KEY"),
            vision_model: or("PLANTY_VISION_MODEL", planty_vision::openai::DEFAULT_MODEL),
        })
    }

    pub fn uses_placeholder_secret(&self) -> bool {
        PLACEHOLDER_SECRETS.contains(&self.jwt_secret.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.token_ttl_minutes, 1440);
        assert_eq!(cfg.led_topic, "/gpio_controller/commands");
        assert_eq!(cfg.vision_model, "gpt-4o");
        assert!(cfg.rosbridge_url.is_none());
        assert!(cfg.uses_placeholder_secret());
    }

    #[test]
    fn overrides_and_blank_values() {
        let cfg = config(&[
            ("PLANTY_PORT", "9001"),
            ("PLANTY_TOKEN_TTL_MINUTES", "30"),
            ("PLANTY_JWT_SECRET", "s3cret"),
            ("PLANTY_ROSBRIDGE_URL", "ws://wireguard:9090"),
            ("PLANTY_CAMERA_URL", "  "),
        ])
        .unwrap();
        assert_eq!(cfg.port, 9001);
        assert_eq!(cfg.token_ttl_minutes, 30);
        assert_eq!(cfg.rosbridge_url.as_deref(), Some("ws://wireguard:9090"));
        assert!(cfg.camera_url.is_none());
        assert!(!cfg.uses_placeholder_secret());
    }

    #[test]
    fn bad_numbers_fail() {
        assert!(config(&[("PLANTY_PORT", "http")]).is_err());
        assert!(config(&[("PLANTY_TOKEN_TTL_MINUTES", "0")]).is_err());
        assert!(config(&[("PLANTY_TOKEN_TTL_MINUTES", "1000000000000")]).is_err());
        assert!(config(&[("PLANTY_TOKEN_TTL_MINUTES", "525600")]).is_ok());
    }
}
