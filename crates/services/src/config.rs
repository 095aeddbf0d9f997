use std::env;
use std::num::NonZeroU32;
use std::time::Duration;

use interview_core::reconciler::DEFAULT_PERSIST_EVERY;
use interview_core::resume::DEFAULT_RESUME_MAX_CHARS;

use crate::error::ConfigError;

pub const DEFAULT_DB_URL: &str = "sqlite://interview.sqlite3";
pub const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for an OpenAI-compatible chat completions endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OracleConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Upper bound on one request, connect to last byte.
    pub timeout: Duration,
}

impl OracleConfig {
    /// `Ok(None)` unless `INTERVIEW_AI_API_KEY` is set and non-blank.
    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = lookup("INTERVIEW_AI_API_KEY").filter(|k| !k.trim().is_empty())
        else {
            return Ok(None);
        };
        let base_url =
            lookup("INTERVIEW_AI_BASE_URL").unwrap_or_else(|| DEFAULT_AI_BASE_URL.into());
        let model = lookup("INTERVIEW_AI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.into());
        let timeout = match lookup("INTERVIEW_AI_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "INTERVIEW_AI_TIMEOUT_SECS",
                        raw,
                    });
                }
            },
            None => DEFAULT_AI_TIMEOUT,
        };
        Ok(Some(Self {
            base_url,
            api_key,
            model,
            timeout,
        }))
    }
}

/// Runtime settings for the interview services.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterviewConfig {
    pub db_url: String,
    pub oracle: Option<OracleConfig>,
    pub persist_every: NonZeroU32,
    pub resume_max_chars: usize,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            db_url: DEFAULT_DB_URL.into(),
            oracle: None,
            persist_every: DEFAULT_PERSIST_EVERY,
            resume_max_chars: DEFAULT_RESUME_MAX_CHARS,
        }
    }
}

impl InterviewConfig {
    /// Read settings from `INTERVIEW_*` environment variables, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when a numeric variable does not parse
    /// or is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` with an explicit variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for malformed numeric values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let db_url = lookup("INTERVIEW_DB_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.db_url);
        let persist_every = match lookup("INTERVIEW_PERSIST_EVERY_SECS") {
            Some(raw) => parse_persist_every(&raw)?,
            None => defaults.persist_every,
        };
        let resume_max_chars = match lookup("INTERVIEW_RESUME_MAX_CHARS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "INTERVIEW_RESUME_MAX_CHARS",
                        raw,
                    });
                }
            },
            None => defaults.resume_max_chars,
        };

        Ok(Self {
            db_url,
            oracle: OracleConfig::from_lookup(&lookup)?,
            persist_every,
            resume_max_chars,
        })
    }

    #[must_use]
    pub fn with_db_url(mut self, db_url: impl Into<String>) -> Self {
        self.db_url = db_url.into();
        self
    }

    #[must_use]
    pub fn with_persist_every(mut self, persist_every: NonZeroU32) -> Self {
        self.persist_every = persist_every;
        self
    }
}

/// Parse a write-through period in seconds (at least 1).
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for zero or non-numeric input.
pub fn parse_persist_every(raw: &str) -> Result<NonZeroU32, ConfigError> {
    raw.trim()
        .parse::<NonZeroU32>()
        .map_err(|_| ConfigError::InvalidValue {
            key: "INTERVIEW_PERSIST_EVERY_SECS",
            raw: raw.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = InterviewConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, InterviewConfig::default());
        assert_eq!(config.persist_every.get(), 5);
        assert!(config.oracle.is_none());
    }

    #[test]
    fn reads_all_variables() {
        let config = InterviewConfig::from_lookup(lookup(&[
            ("INTERVIEW_DB_URL", "sqlite::memory:"),
            ("INTERVIEW_AI_API_KEY", "sk-test"),
            ("INTERVIEW_AI_MODEL", "local-model"),
            ("INTERVIEW_PERSIST_EVERY_SECS", "2"),
            ("INTERVIEW_RESUME_MAX_CHARS", "1200"),
        ]))
        .unwrap();
        assert_eq!(config.db_url, "sqlite::memory:");
        assert_eq!(config.persist_every.get(), 2);
        assert_eq!(config.resume_max_chars, 1200);
        let oracle = config.oracle.unwrap();
        assert_eq!(oracle.model, "local-model");
        assert_eq!(oracle.base_url, DEFAULT_AI_BASE_URL);
        assert_eq!(oracle.timeout, DEFAULT_AI_TIMEOUT);
    }

    #[test]
    fn oracle_timeout_is_configurable() {
        let config = InterviewConfig::from_lookup(lookup(&[
            ("INTERVIEW_AI_API_KEY", "sk-test"),
            ("INTERVIEW_AI_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.oracle.unwrap().timeout, Duration::from_secs(5));

        let err = InterviewConfig::from_lookup(lookup(&[
            ("INTERVIEW_AI_API_KEY", "sk-test"),
            ("INTERVIEW_AI_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue {
            key: "INTERVIEW_AI_TIMEOUT_SECS",
            ..
        }));
    }

    #[test]
    fn blank_api_key_disables_remote_oracle() {
        let config =
            InterviewConfig::from_lookup(lookup(&[("INTERVIEW_AI_API_KEY", "  ")])).unwrap();
        assert!(config.oracle.is_none());
    }

    #[test]
    fn rejects_zero_and_garbage_numbers() {
        let err = InterviewConfig::from_lookup(lookup(&[("INTERVIEW_PERSIST_EVERY_SECS", "0")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidValue {
            key: "INTERVIEW_PERSIST_EVERY_SECS",
            raw: "0".into(),
        });

        let err = InterviewConfig::from_lookup(lookup(&[("INTERVIEW_RESUME_MAX_CHARS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue {
            key: "INTERVIEW_RESUME_MAX_CHARS",
            ..
        }));
    }
}
