//! Runtime configuration.
//!
//! Values come from the process environment, which is first seeded from a `.env`
//! file (desktop dev) or, failing that, from the config file bundled into the binary.

use std::env;

/// Bundled config for builds that ship without a `.env` next to them
const BUNDLED_CONFIG: &str = include_str!("../assets/config.env");

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OWNER_ID: &str = "local-user";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub supabase: Option<SupabaseConfig>,
    pub owner_id: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = get("GEMINI_API_KEY").ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;
        let gemini = GeminiConfig {
            api_key,
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            base_url: get("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
        };

        // The hosted backend is optional; without it appointments stay in memory.
        let supabase = match (get("SUPABASE_URL"), get("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Some(SupabaseConfig { url, anon_key }),
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!("SUPABASE_URL and SUPABASE_ANON_KEY must be set together");
                None
            }
            (None, None) => None,
        };

        Ok(Self {
            gemini,
            supabase,
            owner_id: get("PETPAL_OWNER_ID").unwrap_or_else(|| DEFAULT_OWNER_ID.to_string()),
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load_dotenv() {
    // First try to load from .env file (desktop dev)
    if dotenvy::dotenv().is_ok() {
        return;
    }

    load_bundled_config();
}

#[cfg(target_arch = "wasm32")]
pub fn load_dotenv() {
    load_bundled_config();
}

fn load_bundled_config() {
    for (key, value) in parse_env_lines(BUNDLED_CONFIG) {
        // Only set if not already set (allow env override)
        if env::var(key).is_err() {
            // SAFETY: called once at startup before the runtime spawns any threads
            unsafe {
                env::set_var(key, value);
            }
        }
    }
}

/// `KEY=VALUE` pairs from env-file text, skipping comments and blank lines.
fn parse_env_lines(text: &str) -> Vec<(&str, &str)> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect()
}
