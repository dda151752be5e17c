//! Configuration module

use std::env;
use std::path::PathBuf;

use phishguard_core::constants;
use phishguard_core::logic::heuristic::HeuristicOptions;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Model artifact to load at startup
    pub model_path: PathBuf,

    /// Heuristic pre-screen toggles for `/api/v1/check`
    pub heuristics: HeuristicOptions,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            model_path: env::var("MODEL_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(constants::get_model_path),

            heuristics: HeuristicOptions {
                flag_keywords: env_flag("HEURISTIC_FLAG_KEYWORDS", true),
                flag_long_urls: env_flag("HEURISTIC_FLAG_LONG_URLS", true),
            },

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|s| parse_flag(&s).unwrap_or(default))
        .unwrap_or(default)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
