//! Document shape declaration and validation.
//!
//! A [`Schema`] fixes the shape of a document up front: which keys exist,
//! which are objects or sequences, and which primitive kind each leaf has.
//! Schemas parse from a compact JSON dialect where a string names a
//! primitive kind, a one-element array wraps the element schema of a
//! sequence, and an object maps keys to nested descriptors:
//!
//! ```
//! # use veneer::Schema;
//! let schema = Schema::from_json(&serde_json::json!({
//!     "title": "string",
//!     "done": "boolean",
//!     "posts": [{ "body": "string", "stars": "number" }],
//! })).unwrap();
//! # drop(schema);
//! ```
//!
//! Validation is structural and closed over the declared keys only: extra
//! keys in a snapshot are tolerated, missing or mistyped ones are not.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::snapshot::{PathStep, Value, render_path, wildcard_path};

pub mod errors;
pub use errors::SchemaError;

/// The leaf kinds a schema may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
    BigInt,
    Null,
    Undefined,
}

impl PrimitiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::BigInt => "bigint",
            PrimitiveKind::Null => "null",
            PrimitiveKind::Undefined => "undefined",
        }
    }

    /// Parses a kind name as used in schema documents.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(PrimitiveKind::String),
            "number" => Some(PrimitiveKind::Number),
            "boolean" => Some(PrimitiveKind::Boolean),
            "bigint" => Some(PrimitiveKind::BigInt),
            "null" => Some(PrimitiveKind::Null),
            "undefined" => Some(PrimitiveKind::Undefined),
            _ => None,
        }
    }

    /// Whether `value` is of this kind.
    pub fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (PrimitiveKind::String, Value::String(_))
                | (PrimitiveKind::Number, Value::Number(_))
                | (PrimitiveKind::Boolean, Value::Bool(_))
                | (PrimitiveKind::BigInt, Value::BigInt(_))
                | (PrimitiveKind::Null, Value::Null)
                | (PrimitiveKind::Undefined, Value::Undefined)
        )
    }
}

/// One node of a schema tree.
///
/// Sequence arity (exactly one element schema) and kind names are checked
/// while parsing, so a constructed tree is always well formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaNode {
    /// A leaf of the given kind.
    Primitive(PrimitiveKind),
    /// A homogeneous sequence.
    Sequence(Box<SchemaNode>),
    /// An object with a fixed key set.
    Object(BTreeMap<String, SchemaNode>),
}

/// A complete document schema. The root is always an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: BTreeMap<String, SchemaNode>,
}

impl Schema {
    /// Builds a schema from already-constructed nodes.
    pub fn new(fields: BTreeMap<String, SchemaNode>) -> Self {
        Self { fields }
    }

    /// Parses a schema from its JSON descriptor form.
    pub fn from_json(descriptor: &serde_json::Value) -> Result<Self, SchemaError> {
        let serde_json::Value::Object(entries) = descriptor else {
            return Err(SchemaError::MalformedDescriptor {
                path: String::new(),
                found: json_kind(descriptor).to_string(),
            });
        };
        let mut path = Vec::new();
        let mut fields = BTreeMap::new();
        for (key, value) in entries {
            path.push(PathStep::Key(key.clone()));
            fields.insert(key.clone(), node_from_json(&mut path, value)?);
            path.pop();
        }
        Ok(Self { fields })
    }

    /// Parses a schema from JSON text.
    pub fn parse(text: &str) -> crate::Result<Self> {
        let descriptor: serde_json::Value = serde_json::from_str(text)?;
        Ok(Self::from_json(&descriptor)?)
    }

    /// The declared top-level fields.
    pub fn fields(&self) -> &BTreeMap<String, SchemaNode> {
        &self.fields
    }

    /// Checks `value` against the schema.
    ///
    /// The root must be an object carrying every declared key with a
    /// matching shape; undeclared keys are ignored. The returned error
    /// names the first offending path.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaError> {
        let Some(entries) = value.as_map() else {
            return Err(SchemaError::KindMismatch {
                path: String::new(),
                expected: "object".to_string(),
                found: value.type_name().to_string(),
            });
        };
        let mut path = Vec::new();
        for (key, node) in &self.fields {
            path.push(PathStep::Key(key.clone()));
            match entries.get(key) {
                None => {
                    return Err(SchemaError::MissingKey {
                        path: render_path(&path),
                    });
                }
                Some(child) => validate_node(&mut path, node, child)?,
            }
            path.pop();
        }
        Ok(())
    }
}

fn node_from_json(
    path: &mut Vec<PathStep>,
    descriptor: &serde_json::Value,
) -> Result<SchemaNode, SchemaError> {
    match descriptor {
        serde_json::Value::String(name) => match PrimitiveKind::parse(name) {
            Some(kind) => Ok(SchemaNode::Primitive(kind)),
            None => Err(SchemaError::UnknownKind {
                path: wildcard_path(path),
                kind: name.clone(),
            }),
        },
        serde_json::Value::Array(items) => {
            if items.len() != 1 {
                return Err(SchemaError::InvalidArrayDescriptor {
                    path: wildcard_path(path),
                    found: items.len(),
                });
            }
            path.push(PathStep::Index(0));
            let element = node_from_json(path, &items[0])?;
            path.pop();
            Ok(SchemaNode::Sequence(Box::new(element)))
        }
        serde_json::Value::Object(entries) => {
            let mut fields = BTreeMap::new();
            for (key, value) in entries {
                path.push(PathStep::Key(key.clone()));
                fields.insert(key.clone(), node_from_json(path, value)?);
                path.pop();
            }
            Ok(SchemaNode::Object(fields))
        }
        other => Err(SchemaError::MalformedDescriptor {
            path: wildcard_path(path),
            found: json_kind(other).to_string(),
        }),
    }
}

fn validate_node(
    path: &mut Vec<PathStep>,
    node: &SchemaNode,
    value: &Value,
) -> Result<(), SchemaError> {
    match node {
        SchemaNode::Primitive(kind) => {
            if kind.matches(value) {
                Ok(())
            } else {
                Err(SchemaError::KindMismatch {
                    path: render_path(path),
                    expected: kind.name().to_string(),
                    found: value.type_name().to_string(),
                })
            }
        }
        SchemaNode::Sequence(element) => {
            let Some(items) = value.as_list() else {
                return Err(SchemaError::KindMismatch {
                    path: render_path(path),
                    expected: "array".to_string(),
                    found: value.type_name().to_string(),
                });
            };
            for (index, item) in items.iter().enumerate() {
                path.push(PathStep::Index(index));
                validate_node(path, element, item)?;
                path.pop();
            }
            Ok(())
        }
        SchemaNode::Object(fields) => {
            let Some(entries) = value.as_map() else {
                return Err(SchemaError::KindMismatch {
                    path: render_path(path),
                    expected: "object".to_string(),
                    found: value.type_name().to_string(),
                });
            };
            for (key, child_node) in fields {
                path.push(PathStep::Key(key.clone()));
                match entries.get(key) {
                    None => {
                        return Err(SchemaError::MissingKey {
                            path: render_path(path),
                        });
                    }
                    Some(child) => validate_node(path, child_node, child)?,
                }
                path.pop();
            }
            Ok(())
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
