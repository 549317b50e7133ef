//! Schema configuration.
//!
//! Configuration can be read from a TOML document under the `[schema]`
//! section.
//!
//! # Example Configuration
//!
//! ```toml
//! [schema]
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! validate_introspection = true
//! date_scalar_mode = "isoDate"
//! auth_mode = "error"
//! ```

use serde::{Deserialize, Serialize};

use crate::resolvers::AuthMode;
use crate::types::DateScalarMode;

/// Schema generation and execution limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Maximum query depth allowed.
    /// Default: 15
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    /// Default: 500
    #[serde(default = "default_max_complexity")]
    pub max_complexity: usize,

    /// Enable introspection queries.
    /// Default: true
    #[serde(default = "default_introspection")]
    pub introspection: bool,

    /// Run an introspection query against the generated schema and fail the
    /// build on errors. Only applies to the async builder and when
    /// introspection is enabled.
    /// Default: true
    #[serde(default = "default_validate_introspection")]
    pub validate_introspection: bool,

    /// How date values are exposed.
    /// Default: "isoDate"
    #[serde(default)]
    pub date_scalar_mode: DateScalarMode,

    /// What denied access resolves to.
    /// Default: "error"
    #[serde(default)]
    pub auth_mode: AuthMode,
}

fn default_max_depth() -> usize {
    15
}

fn default_max_complexity() -> usize {
    500
}

fn default_introspection() -> bool {
    true
}

fn default_validate_introspection() -> bool {
    true
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_complexity: default_max_complexity(),
            introspection: default_introspection(),
            validate_introspection: default_validate_introspection(),
            date_scalar_mode: DateScalarMode::default(),
            auth_mode: AuthMode::default(),
        }
    }
}

impl SchemaConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("schema.max_depth must be > 0".into());
        }
        if self.max_complexity == 0 {
            return Err("schema.max_complexity must be > 0".into());
        }
        Ok(())
    }

    /// Returns whether the async builder should run the introspection check.
    #[must_use]
    pub fn runs_introspection_check(&self) -> bool {
        self.introspection && self.validate_introspection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchemaConfig::default();
        assert_eq!(config.max_depth, 15);
        assert_eq!(config.max_complexity, 500);
        assert!(config.introspection);
        assert!(config.validate_introspection);
        assert_eq!(config.date_scalar_mode, DateScalarMode::IsoDate);
        assert_eq!(config.auth_mode, AuthMode::Error);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_limits() {
        let mut config = SchemaConfig::default();
        config.max_depth = 0;
        assert!(config.validate().is_err());

        let mut config = SchemaConfig::default();
        config.max_complexity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_introspection_check_requires_introspection() {
        let mut config = SchemaConfig::default();
        assert!(config.runs_introspection_check());
        config.introspection = false;
        assert!(!config.runs_introspection_check());
    }

    #[test]
    fn test_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Document {
            schema: SchemaConfig,
        }

        let toml = r#"
            [schema]
            max_depth = 20
            introspection = false
            date_scalar_mode = "timestamp"
            auth_mode = "null"
        "#;

        let document: Document = toml::from_str(toml).unwrap();
        let config = document.schema;
        assert_eq!(config.max_depth, 20);
        assert_eq!(config.max_complexity, 500);
        assert!(!config.introspection);
        assert_eq!(config.date_scalar_mode, DateScalarMode::Timestamp);
        assert_eq!(config.auth_mode, AuthMode::Null);
    }
}
