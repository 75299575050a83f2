use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Execution settings for a saga.
///
/// The defaults reproduce the plain sequential behaviour: no time limit on
/// invocations and silent acceptance of compensations that match no activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SagaConfig {
    activity_timeout: Option<Duration>,
    strict_compensation_registration: bool,
}

impl SagaConfig {
    /// Limit applied to every activity and compensation invocation.
    ///
    /// Requires a tokio runtime with the timer enabled when set.
    #[must_use]
    pub fn activity_timeout(&self) -> Option<Duration> {
        self.activity_timeout
    }

    /// Whether `build()` rejects compensations that matched no activity.
    #[must_use]
    pub fn strict_compensation_registration(&self) -> bool {
        self.strict_compensation_registration
    }

    #[must_use]
    pub fn with_activity_timeout(mut self, timeout: Duration) -> Self {
        self.activity_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_strict_compensation_registration(mut self, strict: bool) -> Self {
        self.strict_compensation_registration = strict;
        self
    }

    /// Parse configuration from the `[saga]` table of a TOML document.
    ///
    /// A document without a `[saga]` table yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid TOML, contains unknown
    /// keys in `[saga]`, or sets `activity-timeout-ms` to zero.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        let Some(section) = file.saga else {
            return Ok(Self::default());
        };

        let activity_timeout = match section.activity_timeout_ms {
            Some(0) => {
                return Err(ConfigError::ZeroValue {
                    key: "activity-timeout-ms",
                });
            }
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        };

        Ok(Self {
            activity_timeout,
            strict_compensation_registration: section.strict_compensation_registration,
        })
    }

    /// Read and parse a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails to parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    saga: Option<SagaSection>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct SagaSection {
    activity_timeout_ms: Option<u64>,
    #[serde(default)]
    strict_compensation_registration: bool,
}
