//! Workload configuration.
//!
//! Options arrive either as a JSON document (camelCase keys) or as the flat
//! key/value pairs of a workload test file. Every option has a default, so an
//! empty option set yields [`RollbackConfig::default`].

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Option keys recognised by [`RollbackConfig::from_options`].
pub const KNOWN_OPTIONS: &[&str] = &[
    "meanDelay",
    "clogDuration",
    "testDuration",
    "aggressiveFailures",
    "enableFailures",
    "multiple",
];

/// Largest accepted duration option, in seconds.
pub const MAX_DURATION_SECS: u64 = 1_000_000_000;

/// Smallest accepted `meanDelay`.
pub const MIN_MEAN_DELAY: Duration = Duration::from_millis(1);

/// Errors produced while reading workload options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The value could not be parsed as the option's type.
    #[error("invalid value '{value}' for option '{option}'")]
    InvalidValue {
        /// Option key.
        option: String,
        /// Raw value as given.
        value: String,
    },

    /// A duration option was negative or not finite.
    #[error("option '{option}' must be a finite, non-negative number of seconds")]
    Negative {
        /// Option key.
        option: String,
    },

    /// A duration option exceeded [`MAX_DURATION_SECS`].
    #[error("option '{option}' must be at most {max} seconds")]
    TooLarge {
        /// Option key.
        option: String,
        /// Upper bound in seconds.
        max: u64,
    },

    /// The option key is not one this workload understands.
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    /// The JSON document could not be decoded.
    #[error("invalid configuration document: {0}")]
    Parse(String),
}

/// Flat key/value workload options, as found in a workload test file.
///
/// ```
/// use rollback::WorkloadOptions;
///
/// let options = WorkloadOptions::from_pairs([("clogDuration", "1.5")]);
/// assert_eq!(options.get_option::<f64>("clogDuration"), Ok(Some(1.5)));
/// assert_eq!(options.get_option::<f64>("meanDelay"), Ok(None));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkloadOptions {
    values: BTreeMap<String, String>,
}

impl WorkloadOptions {
    /// Create an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an option set from `(key, value)` pairs. Later keys win.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse `key=value` tokens, such as command-line arguments.
    pub fn parse_args<'a>(
        args: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ConfigError> {
        let mut options = Self::new();
        for arg in args {
            let (key, value) = arg.split_once('=').ok_or_else(|| ConfigError::InvalidValue {
                option: arg.to_string(),
                value: String::new(),
            })?;
            options.set(key.trim(), value.trim());
        }
        Ok(options)
    }

    /// Set one option.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Typed lookup. `Ok(None)` when the key is absent.
    pub fn get_option<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.values
            .get(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|_| ConfigError::InvalidValue {
                    option: key.to_string(),
                    value: raw.clone(),
                })
            })
            .transpose()
    }

    /// Keys present in this option set.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Configuration of the rollback workload.
///
/// Durations are seconds, matching the option surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RollbackConfig {
    /// Mean inter-arrival time between occurrences in repeating mode.
    pub mean_delay: f64,
    /// Duration of every injected fault.
    pub clog_duration: f64,
    /// Overall bound on the workload's run phase.
    pub test_duration: f64,
    /// Kill the coordinator instead of isolating it.
    #[serde(alias = "enableFailures")]
    pub aggressive_failures: bool,
    /// Repeat occurrences at Poisson-spaced intervals instead of firing once.
    pub multiple: bool,
}

impl Default for RollbackConfig {
    fn default() -> Self {
        Self {
            mean_delay: 20.0,
            clog_duration: 3.0,
            test_duration: 10.0,
            aggressive_failures: false,
            multiple: true,
        }
    }
}

impl RollbackConfig {
    /// Read a configuration from key/value options, rejecting unknown keys.
    pub fn from_options(options: &WorkloadOptions) -> Result<Self, ConfigError> {
        if let Some(unknown) = options.keys().find(|k| !KNOWN_OPTIONS.contains(k)) {
            return Err(ConfigError::UnknownOption(unknown.to_string()));
        }

        let defaults = Self::default();
        // `aggressiveFailures` wins over its older spelling when both are set.
        let aggressive_failures = match options.get_option::<bool>("aggressiveFailures")? {
            Some(v) => v,
            None => options
                .get_option::<bool>("enableFailures")?
                .unwrap_or(defaults.aggressive_failures),
        };

        let config = Self {
            mean_delay: options
                .get_option("meanDelay")?
                .unwrap_or(defaults.mean_delay),
            clog_duration: options
                .get_option("clogDuration")?
                .unwrap_or(defaults.clog_duration),
            test_duration: options
                .get_option("testDuration")?
                .unwrap_or(defaults.test_duration),
            aggressive_failures,
            multiple: options
                .get_option("multiple")?
                .unwrap_or(defaults.multiple),
        };
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration from a JSON document.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(document).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every duration is a finite, non-negative number of seconds
    /// no larger than [`MAX_DURATION_SECS`], and that arrivals are spaced by at
    /// least [`MIN_MEAN_DELAY`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (option, secs) in [
            ("meanDelay", self.mean_delay),
            ("clogDuration", self.clog_duration),
            ("testDuration", self.test_duration),
        ] {
            if Duration::try_from_secs_f64(secs).is_err() {
                return Err(ConfigError::Negative {
                    option: option.to_string(),
                });
            }
            if secs > MAX_DURATION_SECS as f64 {
                return Err(ConfigError::TooLarge {
                    option: option.to_string(),
                    max: MAX_DURATION_SECS,
                });
            }
        }
        if self.mean_delay() < MIN_MEAN_DELAY {
            return Err(ConfigError::InvalidValue {
                option: "meanDelay".to_string(),
                value: self.mean_delay.to_string(),
            });
        }
        Ok(())
    }

    /// Whether the workload instance `client_id` drives faults.
    ///
    /// Only the first client does; every other instance is a no-op so that one
    /// cluster sees one fault schedule.
    pub fn enabled_for(&self, client_id: usize) -> bool {
        client_id == 0
    }

    /// Mean inter-arrival time.
    pub fn mean_delay(&self) -> Duration {
        secs(self.mean_delay)
    }

    /// Duration of each injected fault.
    pub fn clog_duration(&self) -> Duration {
        secs(self.clog_duration)
    }

    /// Overall bound on the run phase.
    pub fn test_duration(&self) -> Duration {
        secs(self.test_duration)
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}
