//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `tickhub.toml` in the working directory, or the path named by
//! `TICKHUB_CONFIG`. Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use serde::Deserialize;

use tickhub_app::services::trigger_service::ChangedRequest;
use tickhub_domain::cron::{At, Interval};
use tickhub_domain::entity::{State, Target};
use tickhub_domain::error::TickHubError;
use tickhub_domain::time;

const DEFAULT_PATH: &str = "tickhub.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Delay gate settings.
    pub gate: GateConfig,
    /// Trigger rules registered at startup.
    pub rules: Vec<RuleConfig>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Delay gate configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Satisfied notifications buffered per subscriber.
    pub channel_capacity: usize,
}

/// One `[[rules]]` table.
///
/// Exactly one of `every`, `cron` or `changed` must be set.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub name: String,
    /// Unit, weekday or `HH:MM[:SS]` duration.
    pub every: Option<String>,
    /// `HH:MM[:SS]` anchor for `every`.
    pub at: Option<String>,
    /// Raw six or seven field cron expression.
    pub cron: Option<String>,
    /// Targets in short form (`Name`, `group:Name`, `thing:uid`).
    pub changed: Vec<String>,
    pub to: Vec<String>,
    pub from: Vec<String>,
    /// `HH:MM[:SS]` the new state must hold before the rule fires.
    #[serde(rename = "for")]
    pub hold: Option<String>,
}

/// A rule resolved into a service call.
#[derive(Debug)]
pub enum Declaration {
    Every { interval: Interval, at: Option<At> },
    Cron(String),
    Changed(ChangedRequest),
}

impl Config {
    /// Load configuration from `TICKHUB_CONFIG` or `tickhub.toml` (if
    /// present) then apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or a rule
    /// is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("TICKHUB_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TICKHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.gate.channel_capacity == 0 {
            return Err(ConfigError::Validation(
                "gate.channel_capacity must be non-zero".to_string(),
            ));
        }
        for rule in &self.rules {
            rule.declaration()?;
        }
        Ok(())
    }
}

impl RuleConfig {
    /// Resolve the rule into the call it stands for.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when the rule sets no kind or
    /// several, and [`ConfigError::Rule`] when a value does not parse.
    pub fn declaration(&self) -> Result<Declaration, ConfigError> {
        let kinds = [
            self.every.is_some(),
            self.cron.is_some(),
            !self.changed.is_empty(),
        ];
        if kinds.iter().filter(|set| **set).count() != 1 {
            return Err(ConfigError::Validation(format!(
                "rule `{}` must set exactly one of `every`, `cron` or `changed`",
                self.name
            )));
        }

        self.reject_foreign_fields()?;

        if let Some(every) = &self.every {
            let interval = every.parse().map_err(|err| self.rule_error(err))?;
            let at = self.at.as_deref().map(At::from);
            return Ok(Declaration::Every { interval, at });
        }
        if let Some(cron) = &self.cron {
            return Ok(Declaration::Cron(cron.clone()));
        }

        let mut request = ChangedRequest::new(self.changed.iter().map(|t| Target::parse(t)))
            .to(self.to.iter().map(|v| State::from(v.as_str())))
            .from(self.from.iter().map(|v| State::from(v.as_str())));
        if let Some(hold) = &self.hold {
            let duration = time::parse_duration(hold).map_err(|err| self.rule_error(err))?;
            request = request.for_duration(duration);
        }
        Ok(Declaration::Changed(request))
    }

    /// Fields that only apply to another rule kind are errors, not ignored.
    fn reject_foreign_fields(&self) -> Result<(), ConfigError> {
        let foreign: Vec<(&str, bool)> = if self.every.is_some() {
            vec![
                ("to", !self.to.is_empty()),
                ("from", !self.from.is_empty()),
                ("for", self.hold.is_some()),
            ]
        } else if self.cron.is_some() {
            vec![
                ("at", self.at.is_some()),
                ("to", !self.to.is_empty()),
                ("from", !self.from.is_empty()),
                ("for", self.hold.is_some()),
            ]
        } else {
            vec![("at", self.at.is_some())]
        };
        match foreign.into_iter().find(|(_, set)| *set) {
            Some((field, _)) => Err(ConfigError::Validation(format!(
                "rule `{}` sets `{field}`, which does not apply to its kind",
                self.name
            ))),
            None => Ok(()),
        }
    }

    pub(crate) fn rule_error(&self, source: TickHubError) -> ConfigError {
        ConfigError::Rule {
            name: self.name.clone(),
            source,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "tickhubd=info,tickhub_app=info".to_string(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
    /// A rule value the domain rejects.
    #[error("invalid rule `{name}`: {source}")]
    Rule {
        name: String,
        #[source]
        source: TickHubError,
    },
}
