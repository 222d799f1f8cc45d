//! Environment-driven service configuration.
//!
//! Credentials are mandatory: the service refuses to start without them.

use anyhow::{anyhow, Context, Result};
use std::time::Duration;

const DEFAULT_HF_API_URL: &str = "https://router.huggingface.co/hf-inference/models";
const DEFAULT_SENTIMENT_MODEL: &str = "w11wo/indonesian-roberta-sentiment-classifier";
const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_MODELS: &str = "gemini-2.5-flash,gemini-2.0-flash,gemini-1.5-flash";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// Settings for the remote sentiment classifier.
#[derive(Debug, Clone)]
pub struct SentimentConfig {
    /// Full inference URL (`<HF_API_URL>/<model>`)
    pub endpoint: String,
    pub api_token: String,
    pub timeout: Duration,
}

/// Settings for the remote key-point generator.
#[derive(Debug, Clone)]
pub struct KeyPointConfig {
    pub base_url: String,
    pub api_key: String,
    /// Tried in order, first success wins
    pub models: Vec<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub bind_addr: String,
    pub sentiment: SentimentConfig,
    pub key_points: KeyPointConfig,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| get(key).ok_or_else(|| anyhow!("{} must be set", key));
        let secs = |key: &str, default: u64| -> Result<Duration> {
            match get(key) {
                Some(raw) => raw
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("{} must be a whole number of seconds, got {:?}", key, raw)),
                None => Ok(Duration::from_secs(default)),
            }
        };

        let database_url = require("DATABASE_URL")?;
        let api_token = require("HF_API_TOKEN")?;
        let api_key = require("GEMINI_API_KEY")?;

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("DB_MAX_CONNECTIONS must be a positive integer, got {:?}", raw))?,
            None => 5,
        };

        let hf_base = get("HF_API_URL").unwrap_or_else(|| DEFAULT_HF_API_URL.to_string());
        let model = get("HF_SENTIMENT_MODEL").unwrap_or_else(|| DEFAULT_SENTIMENT_MODEL.to_string());

        let models: Vec<String> = get("GEMINI_MODELS")
            .unwrap_or_else(|| DEFAULT_GEMINI_MODELS.to_string())
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if models.is_empty() {
            return Err(anyhow!("GEMINI_MODELS must name at least one model"));
        }

        Ok(Self {
            database_url,
            db_max_connections,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            sentiment: SentimentConfig {
                endpoint: format!("{}/{}", hf_base.trim_end_matches('/'), model),
                api_token,
                timeout: secs("SENTIMENT_TIMEOUT_SECS", 15)?,
            },
            key_points: KeyPointConfig {
                base_url: get("GEMINI_API_URL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                api_key,
                models,
                timeout: secs("KEY_POINTS_TIMEOUT_SECS", 30)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgres://localhost/reviews"),
        ("HF_API_TOKEN", "hf_token"),
        ("GEMINI_API_KEY", "gemini_key"),
    ];

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(
            config.sentiment.endpoint,
            "https://router.huggingface.co/hf-inference/models/w11wo/indonesian-roberta-sentiment-classifier"
        );
        assert_eq!(config.sentiment.timeout, Duration::from_secs(15));
        assert_eq!(
            config.key_points.models,
            vec!["gemini-2.5-flash", "gemini-2.0-flash", "gemini-1.5-flash"]
        );
    }

    #[test]
    fn test_missing_credentials_fail() {
        for missing in ["DATABASE_URL", "HF_API_TOKEN", "GEMINI_API_KEY"] {
            let pairs: Vec<(&str, &str)> = REQUIRED.iter().copied().filter(|(k, _)| *k != missing).collect();
            let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
            assert!(err.to_string().contains(missing), "unexpected error: {}", err);
        }
    }

    #[test]
    fn test_blank_credential_counts_as_missing() {
        let mut pairs = REQUIRED.to_vec();
        pairs[1] = ("HF_API_TOKEN", "   ");
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("GEMINI_MODELS", " model-a , ,model-b "));
        pairs.push(("HF_API_URL", "http://127.0.0.1:9000/"));
        pairs.push(("HF_SENTIMENT_MODEL", "org/model"));
        pairs.push(("SENTIMENT_TIMEOUT_SECS", "3"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.key_points.models, vec!["model-a", "model-b"]);
        assert_eq!(config.sentiment.endpoint, "http://127.0.0.1:9000/org/model");
        assert_eq!(config.sentiment.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("KEY_POINTS_TIMEOUT_SECS", "soon"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }
}
