/*!
 * Runtime Configuration
 *
 * Environment-driven settings shared by both scenarios.
 */

use super::limits::{
    DEFAULT_MAX_MESSAGE_BYTES, DEFAULT_PIPELINE_SOURCE, MAX_MAX_MESSAGE_BYTES,
    MIN_MAX_MESSAGE_BYTES,
};
use serde::Serialize;

pub const ENV_TRACE_JSON: &str = "PIPEWORKS_TRACE_JSON";
pub const ENV_LOG: &str = "PIPEWORKS_LOG";
pub const ENV_MAX_MESSAGE_BYTES: &str = "PIPEWORKS_MAX_MESSAGE_BYTES";
pub const ENV_SOURCE: &str = "PIPEWORKS_SOURCE";

/// Scenario configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Emit JSON log lines instead of the compact format (default: false)
    pub trace_json: bool,

    /// Filter used when RUST_LOG is not set (default: "warn")
    pub log_filter: String,

    /// Upper bound for one framed message (default: 64KB)
    pub max_message_bytes: usize,

    /// File listed by the first pipeline stage (default: "scores")
    pub pipeline_source: String,
}

impl Config {
    /// Read configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let trace_json = lookup(ENV_TRACE_JSON)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(defaults.trace_json);

        let log_filter = lookup(ENV_LOG)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        let max_message_bytes = match lookup(ENV_MAX_MESSAGE_BYTES) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(value) => value.clamp(MIN_MAX_MESSAGE_BYTES, MAX_MAX_MESSAGE_BYTES),
                Err(e) => {
                    tracing::warn!(
                        value = %raw,
                        error = %e,
                        "Ignoring invalid {}", ENV_MAX_MESSAGE_BYTES
                    );
                    defaults.max_message_bytes
                }
            },
            None => defaults.max_message_bytes,
        };

        let pipeline_source = lookup(ENV_SOURCE)
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.pipeline_source);

        Self {
            trace_json,
            log_filter,
            max_message_bytes,
            pipeline_source,
        }
    }

    /// Single-line JSON form for the startup log
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("<unserializable config: {}>", e))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trace_json: false,
            log_filter: "warn".to_string(),
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            pipeline_source: DEFAULT_PIPELINE_SOURCE.to_string(),
        }
    }
}
