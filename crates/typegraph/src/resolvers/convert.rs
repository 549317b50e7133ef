//! Mapping handler results onto engine field values.

use std::sync::Arc;

use async_graphql::dynamic::FieldValue;
use async_graphql::{Name, Value};

use super::ResolvedValue;
use crate::error::SchemaError;
use crate::metadata::{ClassTable, EnumMetadata, TargetId};

/// Translation between enum item names and their internal values.
#[derive(Debug)]
pub(crate) struct EnumMapping {
    name: String,
    items: Vec<(Name, Value)>,
}

impl EnumMapping {
    pub fn new(metadata: &EnumMetadata) -> Self {
        Self {
            name: metadata.name.clone(),
            items: metadata
                .values
                .iter()
                .map(|(key, value)| (Name::new(key), value.clone()))
                .collect(),
        }
    }

    /// Maps an internal value to its item name.
    pub fn to_output(&self, value: &Value) -> async_graphql::Result<Value> {
        if let Some((name, _)) = self.items.iter().find(|(_, internal)| internal == value) {
            return Ok(Value::Enum(name.clone()));
        }
        match value {
            Value::Enum(name) if self.items.iter().any(|(item, _)| item == name) => {
                Ok(value.clone())
            }
            _ => Err(async_graphql::Error::new(format!(
                "Enum '{}' cannot represent value: {value}",
                self.name
            ))),
        }
    }

    /// Maps item names back to internal values, element-wise for lists.
    pub fn to_internal(&self, value: &Value) -> Value {
        match value {
            Value::Enum(name) => self.internal(name.as_str()).unwrap_or_else(|| value.clone()),
            Value::String(name) => self.internal(name).unwrap_or_else(|| value.clone()),
            Value::List(items) => Value::List(items.iter().map(|item| self.to_internal(item)).collect()),
            _ => value.clone(),
        }
    }

    fn internal(&self, name: &str) -> Option<Value> {
        self.items
            .iter()
            .find(|(item, _)| item.as_str() == name)
            .map(|(_, internal)| internal.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AbstractKind {
    Union,
    Interface,
}

/// Picks the concrete object type of a value returned for a union or
/// interface field.
#[derive(Debug)]
pub(crate) struct AbstractTypeResolver {
    pub type_name: String,
    pub kind: AbstractKind,
    /// Possible object types with their schema names, in declaration order.
    pub candidates: Vec<(TargetId, String)>,
    pub classes: Arc<ClassTable>,
}

impl AbstractTypeResolver {
    pub fn resolve(&self, value: &ResolvedValue) -> async_graphql::Result<String> {
        let resolved = match value {
            ResolvedValue::Instance(instance) => {
                let target = instance.target();
                self.candidates
                    .iter()
                    .find(|(candidate, _)| *candidate == target)
                    .or_else(|| {
                        self.candidates
                            .iter()
                            .find(|(candidate, _)| self.classes.is_assignable(target, *candidate))
                    })
            }
            ResolvedValue::Value(Value::Object(map)) => match map.get("__typename") {
                Some(Value::String(type_name)) => self
                    .candidates
                    .iter()
                    .find(|(_, candidate)| candidate == type_name),
                _ => None,
            },
            _ => None,
        };

        resolved.map(|(_, name)| name.clone()).ok_or_else(|| {
            let err = match self.kind {
                AbstractKind::Union => SchemaError::UnionResolveType {
                    union_name: self.type_name.clone(),
                },
                AbstractKind::Interface => SchemaError::InterfaceResolveType {
                    interface_name: self.type_name.clone(),
                },
            };
            err.into_graphql_error()
        })
    }
}

/// How a resolved value becomes an engine field value.
#[derive(Debug, Clone)]
pub(crate) enum OutputKind {
    /// Scalars.
    Leaf,
    Enum(Arc<EnumMapping>),
    /// Object types; the value becomes the parent of the nested fields.
    Object,
    /// Unions and interfaces.
    Abstract(Arc<AbstractTypeResolver>),
}

impl OutputKind {
    pub fn to_field_value(
        &self,
        value: ResolvedValue,
    ) -> async_graphql::Result<Option<FieldValue<'static>>> {
        match value {
            ResolvedValue::Null | ResolvedValue::Value(Value::Null) => Ok(None),
            ResolvedValue::List(items) => self.list(items).map(Some),
            ResolvedValue::Value(Value::List(items)) if !matches!(self, Self::Leaf) => self
                .list(items.into_iter().map(ResolvedValue::Value).collect())
                .map(Some),
            value => self.single(value).map(Some),
        }
    }

    fn list(&self, items: Vec<ResolvedValue>) -> async_graphql::Result<FieldValue<'static>> {
        let items = items
            .into_iter()
            .map(|item| Ok(self.to_field_value(item)?.unwrap_or(FieldValue::NULL)))
            .collect::<async_graphql::Result<Vec<_>>>()?;
        Ok(FieldValue::list(items))
    }

    fn single(&self, value: ResolvedValue) -> async_graphql::Result<FieldValue<'static>> {
        match self {
            Self::Leaf => Ok(FieldValue::value(value.into_value())),
            Self::Enum(mapping) => Ok(FieldValue::value(mapping.to_output(&value.into_value())?)),
            Self::Object => Ok(FieldValue::owned_any(value)),
            Self::Abstract(resolver) => {
                let type_name = resolver.resolve(&value)?;
                Ok(FieldValue::owned_any(value).with_type(type_name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::EnumId;
    use crate::resolvers::Instance;

    fn color_mapping() -> EnumMapping {
        EnumMapping::new(&EnumMetadata {
            id: EnumId(0),
            name: "Color".into(),
            description: None,
            values: [
                ("RED".to_string(), Value::from("red")),
                ("GREEN".to_string(), Value::from("green")),
            ]
            .into_iter()
            .collect(),
        })
    }

    #[test]
    fn test_enum_mapping_round_trips_items() {
        let mapping = color_mapping();
        assert_eq!(
            mapping.to_output(&Value::from("red")).ok(),
            Some(Value::Enum(Name::new("RED")))
        );
        assert_eq!(mapping.to_internal(&Value::Enum(Name::new("GREEN"))), Value::from("green"));
        assert_eq!(
            mapping.to_internal(&Value::List(vec![Value::Enum(Name::new("RED"))])),
            Value::List(vec![Value::from("red")])
        );
        assert!(mapping.to_output(&Value::from("blue")).is_err());
    }

    #[test]
    fn test_abstract_resolution() {
        let mut classes = ClassTable::new();
        let animal = classes.declare("Animal", None);
        let dog = classes.declare("Dog", Some(animal));
        let puppy = classes.declare("Puppy", Some(dog));
        let cat = classes.declare("Cat", Some(animal));
        let resolver = AbstractTypeResolver {
            type_name: "Pet".into(),
            kind: AbstractKind::Union,
            candidates: vec![(dog, "Dog".into()), (cat, "Cat".into())],
            classes: Arc::new(classes),
        };

        let name = |value: ResolvedValue| resolver.resolve(&value).ok();
        assert_eq!(name(Instance::new(cat).into()), Some("Cat".into()));
        assert_eq!(name(Instance::new(puppy).into()), Some("Dog".into()));
        assert_eq!(
            name(ResolvedValue::from_json(serde_json::json!({"__typename": "Cat"}))),
            Some("Cat".into())
        );

        let err = resolver
            .resolve(&Instance::new(animal).into())
            .expect_err("no member matches");
        assert!(err.message.contains("Pet"));
    }
}
