//! Environment-driven harness configuration
//!
//! | Variable                 | Default | Meaning                                  |
//! |--------------------------|---------|------------------------------------------|
//! | `SEARCHBED_RETRY_BUDGET` | `1`     | Attempts per test body; 0/1 = no retry   |
//! | `SEARCHBED_LOG`          | `info`  | Tracing filter for harness log output    |

use std::env;

/// Harness-wide configuration, loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Total attempts allowed per test body. `0` and `1` both mean a single
    /// invocation with no retry.
    pub retry_budget: u32,
    /// Tracing filter directive for harness log output.
    pub log_filter: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            retry_budget: 1,
            log_filter: "info".to_owned(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for unset or unparseable values.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            retry_budget: env_u32("SEARCHBED_RETRY_BUDGET", defaults.retry_budget),
            log_filter: env_value("SEARCHBED_LOG").unwrap_or(defaults.log_filter),
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    #[cfg(test)]
    if let Some(v) = test_env::override_value(key) {
        return v.filter(|s| !s.trim().is_empty());
    }
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_value(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
