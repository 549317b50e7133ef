//! Scalar types and the scalar registry consulted during type resolution.
//!
//! Built-in GraphQL scalars map to themselves. The date scalar is rendered as
//! `DateTime` (ISO-8601 strings) or `Timestamp` (epoch milliseconds) depending
//! on [`DateScalarMode`]. Any other scalar must be registered in a
//! [`ScalarsMap`] before the schema is generated.

use std::fmt;
use std::sync::{Arc, LazyLock};

use async_graphql::Value;
use async_graphql::dynamic::Scalar;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// ISO-8601 date-time: YYYY-MM-DDThh:mm:ss(.sss)(Z|+hh:mm)
static ISO_DATE_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])T([01]\d|2[0-3]):[0-5]\d:[0-5]\d(\.\d+)?(Z|[+-]([01]\d|2[0-3]):[0-5]\d)$",
    )
    .expect("Invalid ISO date regex")
});

/// Scalar referenced by a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Int,
    Float,
    Boolean,
    Id,
    /// Date value, rendered according to [`DateScalarMode`].
    Date,
    /// Scalar registered in the [`ScalarsMap`] under this name.
    Custom(String),
}

impl ScalarType {
    /// Returns a custom scalar reference.
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("String"),
            Self::Int => f.write_str("Int"),
            Self::Float => f.write_str("Float"),
            Self::Boolean => f.write_str("Boolean"),
            Self::Id => f.write_str("ID"),
            Self::Date => f.write_str("Date"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

/// How date values are exposed in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateScalarMode {
    /// ISO-8601 strings through the `DateTime` scalar.
    #[default]
    IsoDate,
    /// Epoch milliseconds through the `Timestamp` scalar.
    Timestamp,
}

impl DateScalarMode {
    /// Returns the schema name of the date scalar.
    #[must_use]
    pub fn scalar_name(self) -> &'static str {
        match self {
            Self::IsoDate => "DateTime",
            Self::Timestamp => "Timestamp",
        }
    }

    /// Builds the engine scalar for this mode.
    pub(crate) fn to_scalar(self) -> Scalar {
        match self {
            Self::IsoDate => Scalar::new(self.scalar_name())
                .description("A date-time string in ISO-8601 format")
                .validator(|value| match value {
                    Value::String(s) => ISO_DATE_REGEX.is_match(s),
                    _ => false,
                }),
            Self::Timestamp => Scalar::new(self.scalar_name())
                .description("A date-time as the number of milliseconds since the Unix epoch")
                .validator(|value| matches!(value, Value::Number(n) if n.is_i64() || n.is_u64())),
        }
    }
}

type ScalarValidator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Definition of a user scalar.
#[derive(Clone)]
pub struct ScalarDefinition {
    name: String,
    description: Option<String>,
    specified_by_url: Option<String>,
    validator: Option<ScalarValidator>,
}

impl ScalarDefinition {
    /// Creates a scalar accepting any value.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            specified_by_url: None,
            validator: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn specified_by_url(mut self, url: impl Into<String>) -> Self {
        self.specified_by_url = Some(url.into());
        self
    }

    /// Restricts accepted input values.
    #[must_use]
    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Returns the schema name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn to_scalar(&self) -> Scalar {
        let mut scalar = Scalar::new(&self.name);
        if let Some(description) = &self.description {
            scalar = scalar.description(description);
        }
        if let Some(url) = &self.specified_by_url {
            scalar = scalar.specified_by_url(url);
        }
        if let Some(validator) = &self.validator {
            let validator = Arc::clone(validator);
            scalar = scalar.validator(move |value| validator(value));
        }
        scalar
    }
}

impl fmt::Debug for ScalarDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

/// User scalars available to type resolution, keyed by schema name.
#[derive(Debug, Clone, Default)]
pub struct ScalarsMap {
    scalars: IndexMap<String, ScalarDefinition>,
}

impl ScalarsMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a scalar, replacing any previous one with the same name.
    #[must_use]
    pub fn with(mut self, definition: ScalarDefinition) -> Self {
        self.insert(definition);
        self
    }

    pub fn insert(&mut self, definition: ScalarDefinition) {
        self.scalars.insert(definition.name.clone(), definition);
    }

    pub fn get(&self, name: &str) -> Option<&ScalarDefinition> {
        self.scalars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scalars.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScalarDefinition> {
        self.scalars.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_scalar_names() {
        assert_eq!(DateScalarMode::IsoDate.scalar_name(), "DateTime");
        assert_eq!(DateScalarMode::Timestamp.scalar_name(), "Timestamp");
        assert_eq!(DateScalarMode::default(), DateScalarMode::IsoDate);
    }

    #[test]
    fn test_iso_date_regex() {
        assert!(ISO_DATE_REGEX.is_match("2024-01-15T10:30:00Z"));
        assert!(ISO_DATE_REGEX.is_match("2024-01-15T10:30:00.123+01:00"));
        assert!(!ISO_DATE_REGEX.is_match("2024-01-15"));
        assert!(!ISO_DATE_REGEX.is_match("yesterday"));
    }

    #[test]
    fn test_scalars_map_replaces_by_name() {
        let map = ScalarsMap::new()
            .with(ScalarDefinition::new("Email"))
            .with(ScalarDefinition::new("Email").description("An e-mail address"));
        assert!(map.contains("Email"));
        assert_eq!(map.iter().count(), 1);
        assert!(map.get("Url").is_none());
    }

    #[test]
    fn test_scalar_display_names() {
        assert_eq!(ScalarType::Id.to_string(), "ID");
        assert_eq!(ScalarType::custom("Email").to_string(), "Email");
    }
}
