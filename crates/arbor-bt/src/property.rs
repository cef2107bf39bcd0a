//! Named bindings from a display name to a field of a node.
//!
//! A property lets host code read and write node fields by name without knowing
//! node ids. Several bindings may share a display name; reads take the first
//! binding that yields a value of the requested type, writes go to the first
//! binding that accepts it.

use std::fmt;

use arbor_core::SeedMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::naming::unique_name;
use crate::nodes::UntilCondition;
use crate::tree::{NodeId, Tree};

/// Display name given to properties created without one.
pub const DEFAULT_PROPERTY_NAME: &str = "Property";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub display_name: String,
    pub node: NodeId,
    pub field: String,
}

/// Value stored in a bindable node field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Text(String),
    Until(UntilCondition),
    SeedMode(SeedMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    Text,
    Until,
    SeedMode,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Text => "text",
            FieldType::Until => "until condition",
            FieldType::SeedMode => "seed mode",
        };
        f.write_str(name)
    }
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Bool(_) => FieldType::Bool,
            FieldValue::Int(_) => FieldType::Int,
            FieldValue::Float(_) => FieldType::Float,
            FieldValue::Text(_) => FieldType::Text,
            FieldValue::Until(_) => FieldType::Until,
            FieldValue::SeedMode(_) => FieldType::SeedMode,
        }
    }
}

/// A field exposed for binding, as listed by [`crate::Node::bindable_fields`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: &'static str,
    pub ty: FieldType,
}

/// Rust types that can be read from and written to node fields.
pub trait PropertyValue: Sized {
    const TYPE: FieldType;

    fn from_field(value: FieldValue) -> Option<Self>;

    fn into_field(self) -> FieldValue;
}

macro_rules! property_value {
    ($ty:ty, $variant:ident) => {
        impl PropertyValue for $ty {
            const TYPE: FieldType = FieldType::$variant;

            fn from_field(value: FieldValue) -> Option<Self> {
                match value {
                    FieldValue::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_field(self) -> FieldValue {
                FieldValue::$variant(self)
            }
        }

        impl From<$ty> for FieldValue {
            fn from(value: $ty) -> Self {
                FieldValue::$variant(value)
            }
        }
    };
}

property_value!(bool, Bool);
property_value!(i32, Int);
property_value!(f32, Float);
property_value!(String, Text);
property_value!(UntilCondition, Until);
property_value!(SeedMode, SeedMode);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyError {
    #[error("no property named `{0}`")]
    NotFound(String),
    #[error("node {0} does not exist")]
    NodeMissing(NodeId),
    #[error("node {node} has no field `{field}`")]
    FieldMissing { node: NodeId, field: String },
    #[error("field `{field}` holds a {actual} value, not {expected}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        actual: FieldType,
    },
    #[error("no tree instance is loaded")]
    NoInstance,
}

impl Tree {
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, display_name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.display_name == display_name)
    }

    /// Reads field `field` of node `id`.
    pub fn get_field(&self, id: NodeId, field: &str) -> Result<FieldValue, PropertyError> {
        let node = self.node(id).ok_or(PropertyError::NodeMissing(id))?;
        node.field(field).ok_or_else(|| PropertyError::FieldMissing {
            node: id,
            field: field.to_string(),
        })
    }

    /// Authoring write to a node field. Regenerates the version.
    pub fn set_field(
        &mut self,
        id: NodeId,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), PropertyError> {
        self.write_field(id, field, value.into())?;
        self.touch();
        Ok(())
    }

    fn write_field(
        &mut self,
        id: NodeId,
        field: &str,
        value: FieldValue,
    ) -> Result<(), PropertyError> {
        let current = self.get_field(id, field)?;
        if current.field_type() != value.field_type() {
            return Err(PropertyError::TypeMismatch {
                field: field.to_string(),
                expected: current.field_type(),
                actual: value.field_type(),
            });
        }

        let node = self
            .node_slot_mut(id)
            .ok_or(PropertyError::NodeMissing(id))?;
        if node.store_field(field, value) {
            Ok(())
        } else {
            Err(PropertyError::FieldMissing {
                node: id,
                field: field.to_string(),
            })
        }
    }

    /// Reads the first binding named `name` that holds a `T`.
    pub fn try_get_property<T: PropertyValue>(&self, name: &str) -> Result<T, PropertyError> {
        let mut last = PropertyError::NotFound(name.to_string());
        for binding in self.properties.iter().filter(|p| p.display_name == name) {
            match self.get_field(binding.node, &binding.field) {
                Ok(value) => {
                    let actual = value.field_type();
                    match T::from_field(value) {
                        Some(v) => return Ok(v),
                        None => {
                            last = PropertyError::TypeMismatch {
                                field: binding.field.clone(),
                                expected: T::TYPE,
                                actual,
                            }
                        }
                    }
                }
                Err(err) => last = err,
            }
        }
        Err(last)
    }

    /// Runtime write through the first binding named `name` that accepts a `T`.
    ///
    /// Runtime writes change instance state only; the version is left alone.
    pub fn try_set_property<T: PropertyValue>(
        &mut self,
        name: &str,
        value: T,
    ) -> Result<(), PropertyError> {
        let value = value.into_field();
        let bindings: Vec<(NodeId, String)> = self
            .properties
            .iter()
            .filter(|p| p.display_name == name)
            .map(|p| (p.node, p.field.clone()))
            .collect();

        let mut last = PropertyError::NotFound(name.to_string());
        for (node, field) in bindings {
            match self.write_field(node, &field, value.clone()) {
                Ok(()) => return Ok(()),
                Err(err) => last = err,
            }
        }
        Err(last)
    }

    /// Reads property `name`, or `T::default()` when it cannot be read.
    pub fn get_property<T: PropertyValue + Default>(&self, name: &str) -> T {
        match self.try_get_property(name) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(property = %name, error = %err, "property read failed");
                T::default()
            }
        }
    }

    pub fn set_property<T: PropertyValue>(&mut self, name: &str, value: T) -> bool {
        match self.try_set_property(name, value) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(property = %name, error = %err, "property write failed");
                false
            }
        }
    }

    /// Binds field `field` of node `id` under a display name unique within the tree.
    ///
    /// Returns the display name actually used.
    pub fn add_property(
        &mut self,
        display_name: &str,
        id: NodeId,
        field: &str,
    ) -> Result<String, PropertyError> {
        self.get_field(id, field)?;

        let base = if display_name.trim().is_empty() {
            DEFAULT_PROPERTY_NAME
        } else {
            display_name
        };
        let name = unique_name(self.properties.iter().map(|p| p.display_name.as_str()), base);
        self.properties.push(Property {
            display_name: name.clone(),
            node: id,
            field: field.to_string(),
        });
        self.touch();
        Ok(name)
    }

    /// Removes every binding named `display_name`. Returns how many were removed.
    pub fn remove_property(&mut self, display_name: &str) -> usize {
        let before = self.properties.len();
        self.properties.retain(|p| p.display_name != display_name);
        let removed = before - self.properties.len();
        if removed > 0 {
            self.touch();
        }
        removed
    }

    /// Renames every binding called `from`. A taken `to` is made unique first.
    pub fn rename_property(&mut self, from: &str, to: &str) -> Option<String> {
        if !self.properties.iter().any(|p| p.display_name == from) {
            return None;
        }

        let name = unique_name(
            self.properties
                .iter()
                .filter(|p| p.display_name != from)
                .map(|p| p.display_name.as_str()),
            to,
        );
        for binding in self.properties.iter_mut().filter(|p| p.display_name == from) {
            binding.display_name = name.clone();
        }
        self.touch();
        Some(name)
    }
}
