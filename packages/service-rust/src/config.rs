//! Service-level configuration.

/// Environment variable holding the published service identifier.
pub const SERVICE_ID_VAR: &str = "MILLRUN_SERVICE_ID";
/// Environment variable holding the published service version.
pub const SERVICE_VERSION_VAR: &str = "MILLRUN_SERVICE_VERSION";

/// Errors raised while loading configuration.
///
/// Configuration errors are startup-fatal: the process must not start
/// serving with an incomplete identity.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("configuration value [{var}] is missing or empty")]
    MissingValue { var: &'static str },
}

/// Identity published in the module descriptor.
///
/// Both values are used verbatim; neither may be empty.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Identifier of this processing module.
    pub service_id: String,
    /// Version string of this processing module.
    pub service_version: String,
}

impl ServiceConfig {
    /// Builds a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingValue`] when either value is empty or
    /// whitespace-only.
    pub fn new(
        service_id: impl Into<String>,
        service_version: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let service_id = service_id.into();
        let service_version = service_version.into();
        if service_id.trim().is_empty() {
            return Err(ConfigError::MissingValue {
                var: SERVICE_ID_VAR,
            });
        }
        if service_version.trim().is_empty() {
            return Err(ConfigError::MissingValue {
                var: SERVICE_VERSION_VAR,
            });
        }
        Ok(Self {
            service_id,
            service_version,
        })
    }

    /// Loads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingValue`] when either variable is unset
    /// or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    ///
    /// `from_env` is this with `std::env::var`; tests inject closures to
    /// avoid mutating process-global state.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingValue`] when either variable resolves
    /// to nothing or to an empty value.
    pub fn from_lookup(
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let id = lookup(SERVICE_ID_VAR).ok_or(ConfigError::MissingValue {
            var: SERVICE_ID_VAR,
        })?;
        let version = lookup(SERVICE_VERSION_VAR).ok_or(ConfigError::MissingValue {
            var: SERVICE_VERSION_VAR,
        })?;
        Self::new(id, version)
    }
}

impl Default for ServiceConfig {
    /// Test-friendly identity; production deployments configure the real
    /// one through the environment.
    fn default() -> Self {
        Self {
            service_id: "millrun".to_string(),
            service_version: "dev".to_string(),
        }
    }
}
