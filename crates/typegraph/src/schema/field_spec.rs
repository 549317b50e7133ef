//! Engine-independent description of generated fields and arguments.
//!
//! Field maps are assembled as [`FieldSpec`]s keyed by schema name, merged
//! across inheritance, and only then turned into engine fields.

use std::sync::Arc;

use async_graphql::Value;
use async_graphql::dynamic::{Field, InputValue, InterfaceField, SubscriptionField, TypeRef};
use indexmap::IndexMap;

use crate::resolvers::FieldRuntime;
use crate::subscriptions::{SubscriptionSource, create_subscription_field};

#[derive(Clone)]
pub(crate) struct ArgSpec {
    pub name: String,
    pub type_ref: TypeRef,
    pub description: Option<String>,
    pub default_value: Option<Value>,
}

impl ArgSpec {
    pub fn into_input_value(self) -> InputValue {
        let mut input = InputValue::new(self.name, self.type_ref);
        if let Some(description) = self.description {
            input = input.description(description);
        }
        if let Some(default_value) = self.default_value {
            input = input.default_value(default_value);
        }
        input
    }
}

#[derive(Clone)]
pub(crate) struct FieldSpec {
    pub name: String,
    pub type_ref: TypeRef,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub args: IndexMap<String, ArgSpec>,
    pub runtime: Arc<FieldRuntime>,
}

impl FieldSpec {
    pub fn into_field(self) -> Field {
        let mut field = Field::new(self.name, self.type_ref, self.runtime.resolver());
        for arg in self.args.into_values() {
            field = field.argument(arg.into_input_value());
        }
        if let Some(description) = self.description {
            field = field.description(description);
        }
        if let Some(reason) = self.deprecation_reason {
            field = field.deprecation(Some(&reason));
        }
        field
    }

    pub fn into_interface_field(self) -> InterfaceField {
        let mut field = InterfaceField::new(self.name, self.type_ref);
        for arg in self.args.into_values() {
            field = field.argument(arg.into_input_value());
        }
        if let Some(description) = self.description {
            field = field.description(description);
        }
        if let Some(reason) = self.deprecation_reason {
            field = field.deprecation(Some(&reason));
        }
        field
    }

    /// Streams the field's handler result for every payload of `source`.
    pub fn into_subscription_field(self, source: SubscriptionSource) -> SubscriptionField {
        let mut field = create_subscription_field(self.name, self.type_ref, self.runtime, source);
        for arg in self.args.into_values() {
            field = field.argument(arg.into_input_value());
        }
        if let Some(description) = self.description {
            field = field.description(description);
        }
        if let Some(reason) = self.deprecation_reason {
            field = field.deprecation(Some(&reason));
        }
        field
    }
}

/// Inserts `fields` into `map`. An existing name keeps its position and takes
/// the new definition.
pub(crate) fn merge_fields<T>(map: &mut IndexMap<String, T>, fields: impl IntoIterator<Item = (String, T)>) {
    for (name, field) in fields {
        map.insert(name, field);
    }
}
