//! Structural contract checks for every persisted artifact
//!
//! A schema is a static table of field name to [`FieldRule`]. Validation walks
//! the JSON value recursively and reports every violation with its dotted
//! path, rather than stopping at the first one.

pub mod definitions;

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub use definitions::{
    AGGREGATED_DASHBOARD, ORG_GOVERNANCE_SUMMARY, REPOSITORY_SNAPSHOT, RUN_METADATA,
};

/// JSON value kinds a field may take
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JsonType {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Array,
    Object,
}

impl JsonType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => JsonType::Int,
            Value::Number(_) => JsonType::Float,
            Value::String(_) => JsonType::Str,
            Value::Array(_) => JsonType::Array,
            Value::Object(_) => JsonType::Object,
        }
    }

    fn name(self) -> &'static str {
        match self {
            JsonType::Null => "null",
            JsonType::Bool => "bool",
            JsonType::Int => "int",
            JsonType::Float => "float",
            JsonType::Str => "string",
            JsonType::Array => "array",
            JsonType::Object => "object",
        }
    }
}

/// What a field must look like
#[derive(Clone, Copy, Debug)]
pub enum FieldRule {
    /// Any of the listed kinds
    Types(&'static [JsonType]),
    /// Nested object following its own schema
    Object(Schema),
    /// Array whose rows are objects following the schema
    ListOf(Schema),
}

pub type Schema = &'static [(&'static str, FieldRule)];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, got {}",
            self.path, self.expected, self.actual
        )
    }
}

/// An artifact broke its contract
#[derive(Debug, Error)]
#[error("Schema validation failed for {artifact}: {}", summarize(.violations))]
pub struct SchemaError {
    pub artifact: String,
    pub violations: Vec<Violation>,
}

impl SchemaError {
    /// Whether any violation sits at exactly `path`
    pub fn mentions(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe(types: &[JsonType]) -> String {
    types
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join(" or ")
}

fn violation(path: &str, expected: impl Into<String>, actual: impl Into<String>) -> Violation {
    Violation {
        path: path.to_string(),
        expected: expected.into(),
        actual: actual.into(),
    }
}

fn check_object(value: &Value, schema: Schema, path: &str, out: &mut Vec<Violation>) {
    let Value::Object(map) = value else {
        out.push(violation(path, "object", JsonType::of(value).name()));
        return;
    };
    for (name, rule) in schema {
        let field_path = format!("{path}.{name}");
        match map.get(*name) {
            Some(field) => check_field(field, rule, &field_path, out),
            None => out.push(violation(&field_path, "required field", "missing")),
        }
    }
}

fn check_field(value: &Value, rule: &FieldRule, path: &str, out: &mut Vec<Violation>) {
    match rule {
        FieldRule::Types(types) => {
            let actual = JsonType::of(value);
            if !types.contains(&actual) {
                out.push(violation(path, describe(types), actual.name()));
            }
        }
        FieldRule::Object(schema) => check_object(value, schema, path, out),
        FieldRule::ListOf(schema) => match value {
            Value::Array(rows) => {
                for (i, row) in rows.iter().enumerate() {
                    check_object(row, schema, &format!("{path}[{i}]"), out);
                }
            }
            other => out.push(violation(path, "array", JsonType::of(other).name())),
        },
    }
}

/// Every violation of `schema` in `value`, paths rooted at `root`
pub fn validate(value: &Value, schema: Schema, root: &str) -> Vec<Violation> {
    let mut violations = Vec::new();
    check_object(value, schema, root, &mut violations);
    violations
}

/// Validate and turn any violation into a [`SchemaError`] naming `artifact`.
pub fn assert_valid(
    value: &Value,
    schema: Schema,
    root: &str,
    artifact: &str,
) -> Result<(), SchemaError> {
    let violations = validate(value, schema, root);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaError {
            artifact: artifact.to_string(),
            violations,
        })
    }
}
