//! Service identity
//!
//! The identity names the process for every telemetry subsystem. It is
//! validated once at construction and immutable afterwards; an unnamed
//! service is the one misconfiguration that cannot be deferred to the
//! subsystem that uses it.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BeaconError;

/// Deployment environment the service runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
    /// On-device deployments (robots, edge gateways).
    Embedded,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
            Environment::Embedded => "embedded",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = BeaconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            "embedded" => Ok(Environment::Embedded),
            other => Err(BeaconError::Validation(format!(
                "unsupported environment '{}'; expected development/staging/production/embedded",
                other
            ))),
        }
    }
}

/// Immutable service identity shared by all telemetry subsystems.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceIdentity {
    name: String,
    version: String,
    environment: Environment,
    #[serde(default)]
    attributes: HashMap<String, String>,
}

impl ServiceIdentity {
    /// Create an identity with the given service name.
    ///
    /// Fails with `Validation` if the name is empty. Version defaults to
    /// "unknown" and environment to development.
    pub fn new(name: impl Into<String>) -> Result<Self, BeaconError> {
        let name = name.into();
        if name.is_empty() {
            return Err(BeaconError::Validation(
                "service name is required".to_string(),
            ));
        }

        Ok(Self {
            name,
            version: "unknown".to_string(),
            environment: Environment::default(),
            attributes: HashMap::new(),
        })
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Attach an additional service-level attribute.
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_is_rejected() {
        let err = ServiceIdentity::new("").unwrap_err();
        assert!(matches!(err, BeaconError::Validation(_)));
    }

    #[test]
    fn empty_name_is_rejected_regardless_of_other_fields() {
        // Builder methods never run because construction already failed.
        assert!(ServiceIdentity::new(String::new()).is_err());
    }

    #[test]
    fn defaults_are_applied() {
        let identity = ServiceIdentity::new("svc").unwrap();
        assert_eq!(identity.name(), "svc");
        assert_eq!(identity.version(), "unknown");
        assert_eq!(identity.environment(), Environment::Development);
        assert!(identity.attributes().is_empty());
    }

    #[test]
    fn builder_fields_are_recorded() {
        let identity = ServiceIdentity::new("svc")
            .unwrap()
            .with_version("1.2.3")
            .with_environment(Environment::Production)
            .with_attribute("team", "platform");
        assert_eq!(identity.version(), "1.2.3");
        assert_eq!(identity.environment(), Environment::Production);
        assert_eq!(identity.attributes().get("team").unwrap(), "platform");
    }

    #[test]
    fn environment_parses_known_values() {
        assert_eq!(
            "embedded".parse::<Environment>().unwrap(),
            Environment::Embedded
        );
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
    }

    #[test]
    fn environment_rejects_unknown_values() {
        let err = "jetson-nano".parse::<Environment>().unwrap_err();
        assert!(matches!(err, BeaconError::Validation(_)));
    }

    #[test]
    fn environment_deserializes_lowercase() {
        let env: Environment = serde_json::from_str("\"staging\"").unwrap();
        assert_eq!(env, Environment::Staging);
        assert!(serde_json::from_str::<Environment>("\"qa\"").is_err());
    }
}
