//! Configuration for check compilation and execution.

use crate::logging::LogConfig;
use serde::{Deserialize, Serialize};

/// Glyph emitted for a passing check.
pub const DEFAULT_PASS_GLYPH: &str = "🟢";
/// Glyph emitted for a failing check.
pub const DEFAULT_FAIL_GLYPH: &str = "🔴";

/// Settings shared by a [`CheckBuilder`](crate::builder::CheckBuilder) for its
/// whole lifetime.
///
/// # Examples
///
/// ```rust
/// use warehouse_guard::config::CheckConfig;
///
/// let config = CheckConfig::plain().with_debug(true);
/// assert_eq!(config.pass_glyph, "PASS");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Status glyph rendered for passing checks
    pub pass_glyph: String,
    /// Status glyph rendered for failing checks
    pub fail_glyph: String,
    /// Log the compiled SQL at `INFO` instead of `DEBUG`
    pub debug: bool,
    /// Log tuning
    pub log: LogConfig,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            pass_glyph: DEFAULT_PASS_GLYPH.to_string(),
            fail_glyph: DEFAULT_FAIL_GLYPH.to_string(),
            debug: false,
            log: LogConfig::default(),
        }
    }
}

impl CheckConfig {
    /// ASCII glyphs, for terminals and files that don't render emoji.
    pub fn plain() -> Self {
        Self::default().with_glyphs("PASS", "FAIL")
    }

    /// Sets the pass/fail glyphs.
    pub fn with_glyphs(mut self, pass: impl Into<String>, fail: impl Into<String>) -> Self {
        self.pass_glyph = pass.into();
        self.fail_glyph = fail.into();
        self
    }

    /// Sets debug mode.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Sets the logging configuration.
    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }
}
