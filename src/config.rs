//! Runtime configuration for the marketplace core.
//!
//! Configuration is read from a TOML document. Every field has a default so
//! an empty document yields the platform defaults:
//!
//! ```toml
//! [marketplace]
//! budget_min = 50
//! budget_max = 2000
//! auto_withdraw_days = 7
//! urgency_window_hours = 24
//! max_title_length = 100
//! max_description_length = 2000
//!
//! [chat]
//! edit_window_minutes = 15
//! max_content_length = 2000
//! max_attachments = 5
//! page_size = 50
//!
//! [realtime]
//! typing_ttl_ms = 3000
//!
//! [scheduler]
//! sweep_interval_secs = 300
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

use crate::chat::domain::ChatRules;
use crate::marketplace::domain::{BudgetBounds, MarketplaceRules};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use serde::{Deserialize, Serialize};
use std::time::Duration as StdDuration;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration path has no file name component.
    #[error("configuration path '{0}' does not name a file")]
    InvalidPath(Utf8PathBuf),

    /// The configuration file could not be read.
    #[error("failed to read configuration from '{path}': {source}")]
    Read {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is not valid TOML for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is outside its permitted range.
    #[error("invalid configuration value for {field}: {reason}")]
    Invalid {
        /// Dotted field name.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },
}

/// Task and bid rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceSection {
    /// Platform-wide lower budget bound.
    pub budget_min: u32,
    /// Platform-wide upper budget bound.
    pub budget_max: u32,
    /// Days after placement before a pending bid is withdrawn.
    pub auto_withdraw_days: u32,
    /// Hours before the deadline at which a task counts as urgent.
    pub urgency_window_hours: u32,
    /// Maximum task title length in characters.
    pub max_title_length: usize,
    /// Maximum task description length in characters.
    pub max_description_length: usize,
}

impl Default for MarketplaceSection {
    fn default() -> Self {
        let rules = MarketplaceRules::default();
        Self {
            budget_min: rules.budget_bounds.floor(),
            budget_max: rules.budget_bounds.ceiling(),
            auto_withdraw_days: 7,
            urgency_window_hours: 24,
            max_title_length: rules.max_title_length,
            max_description_length: rules.max_description_length,
        }
    }
}

/// Chat rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSection {
    /// Minutes after creation during which the sender may edit a message.
    pub edit_window_minutes: u32,
    /// Maximum message length in characters.
    pub max_content_length: usize,
    /// Maximum attachments per message.
    pub max_attachments: usize,
    /// Default page size for conversation listings.
    pub page_size: usize,
}

impl Default for ChatSection {
    fn default() -> Self {
        Self {
            edit_window_minutes: 15,
            max_content_length: 2000,
            max_attachments: 5,
            page_size: 50,
        }
    }
}

/// Real-time delivery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeSection {
    /// Milliseconds of silence after which a typing indicator expires.
    pub typing_ttl_ms: u64,
}

impl Default for RealtimeSection {
    fn default() -> Self {
        Self {
            typing_ttl_ms: 3000,
        }
    }
}

/// Background scheduler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    /// Seconds between expiry sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 300,
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-field output.
    #[default]
    Pretty,
    /// Single-line output without targets.
    Compact,
    /// Structured JSON lines.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level directive when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Pretty,
        }
    }
}

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    /// Task and bid rules.
    pub marketplace: MarketplaceSection,
    /// Chat rules.
    pub chat: ChatSection,
    /// Real-time delivery settings.
    pub realtime: RealtimeSection,
    /// Background scheduler settings.
    pub scheduler: SchedulerSection,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl MarketplaceConfig {
    /// Parses and validates a TOML configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents and
    /// [`ConfigError::Invalid`] when a value is out of range.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise
    /// the errors of [`Self::from_toml_str`].
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let file_name = path
            .file_name()
            .ok_or_else(|| ConfigError::InvalidPath(path.to_owned()))?;
        let parent = path
            .parent()
            .filter(|dir| !dir.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        let read_error = |source| ConfigError::Read {
            path: path.to_owned(),
            source,
        };
        let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
        let raw = dir.read_to_string(file_name).map_err(read_error)?;
        Self::from_toml_str(&raw)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let section = &self.marketplace;
        if section.budget_min == 0 || section.budget_min > section.budget_max {
            return Err(ConfigError::Invalid {
                field: "marketplace.budget_min",
                reason: format!(
                    "expected 0 < budget_min <= budget_max, got {}..{}",
                    section.budget_min, section.budget_max
                ),
            });
        }
        ensure_positive("marketplace.auto_withdraw_days", u64::from(section.auto_withdraw_days))?;
        ensure_positive(
            "marketplace.urgency_window_hours",
            u64::from(section.urgency_window_hours),
        )?;
        ensure_positive(
            "chat.edit_window_minutes",
            u64::from(self.chat.edit_window_minutes),
        )?;
        ensure_positive(
            "chat.page_size",
            u64::try_from(self.chat.page_size).unwrap_or(u64::MAX),
        )?;
        ensure_positive("realtime.typing_ttl_ms", self.realtime.typing_ttl_ms)?;
        ensure_positive("scheduler.sweep_interval_secs", self.scheduler.sweep_interval_secs)?;
        Ok(())
    }

    /// Returns the task and bid rules described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the budget bounds are invalid.
    pub fn marketplace_rules(&self) -> Result<MarketplaceRules, ConfigError> {
        let section = &self.marketplace;
        let budget_bounds = BudgetBounds::new(section.budget_min, section.budget_max).map_err(
            |err| ConfigError::Invalid {
                field: "marketplace.budget_min",
                reason: err.to_string(),
            },
        )?;
        Ok(MarketplaceRules {
            budget_bounds,
            max_title_length: section.max_title_length,
            max_description_length: section.max_description_length,
            auto_withdraw_after: chrono::Duration::days(i64::from(section.auto_withdraw_days)),
            urgency_window: chrono::Duration::hours(i64::from(section.urgency_window_hours)),
        })
    }

    /// Returns the chat rules described by this configuration.
    #[must_use]
    pub fn chat_rules(&self) -> ChatRules {
        ChatRules {
            edit_window: chrono::Duration::minutes(i64::from(self.chat.edit_window_minutes)),
            max_content_length: self.chat.max_content_length,
            max_attachments: self.chat.max_attachments,
            page_size: self.chat.page_size,
        }
    }

    /// Returns how long a typing indicator lives without a refresh.
    #[must_use]
    pub const fn typing_ttl(&self) -> StdDuration {
        StdDuration::from_millis(self.realtime.typing_ttl_ms)
    }

    /// Returns the interval between expiry sweeps.
    #[must_use]
    pub const fn sweep_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.scheduler.sweep_interval_secs)
    }
}

fn ensure_positive(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            field,
            reason: "must be greater than zero".to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, LogFormat, MarketplaceConfig};
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    fn empty_document_yields_defaults() {
        let config = MarketplaceConfig::from_toml_str("").expect("empty config is valid");

        assert_eq!(config, MarketplaceConfig::default());
        assert_eq!(config.marketplace.budget_min, 50);
        assert_eq!(config.marketplace.budget_max, 2000);
        assert_eq!(config.typing_ttl(), Duration::from_secs(3));
        assert_eq!(config.chat_rules().edit_window, chrono::Duration::minutes(15));
    }

    #[rstest]
    fn sections_override_defaults() {
        let raw = r#"
            [marketplace]
            budget_min = 100
            budget_max = 500

            [logging]
            level = "debug"
            format = "json"
        "#;
        let config = MarketplaceConfig::from_toml_str(raw).expect("valid config");
        let rules = config.marketplace_rules().expect("valid rules");

        assert_eq!(rules.budget_bounds.floor(), 100);
        assert_eq!(rules.budget_bounds.ceiling(), 500);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.chat.max_attachments, 5);
    }

    #[rstest]
    #[case("[marketplace]\nbudget_min = 900\nbudget_max = 100\n")]
    #[case("[realtime]\ntyping_ttl_ms = 0\n")]
    #[case("[scheduler]\nsweep_interval_secs = 0\n")]
    fn out_of_range_values_are_rejected(#[case] raw: &str) {
        let result = MarketplaceConfig::from_toml_str(raw);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[rstest]
    fn malformed_document_is_a_parse_error() {
        let result = MarketplaceConfig::from_toml_str("[chat\nedit_window_minutes = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
