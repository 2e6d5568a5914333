//! Typed argument values bound by argument cutters.
//!
//! Every cutter produces a concrete Rust value (`bool`, `f64`, `Vec<i64>`,
//! ...). Once bound to a name inside a command, the value is stored as an
//! [`ArgValue`] so that heterogeneous arguments fit one ordered
//! [`Arguments`] map. [`FromArgValue`] converts them back for reactions.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{ArgumentError, ArgumentResult};

/// A dynamically typed argument value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<ArgValue>),
}

impl ArgValue {
    /// Returns the kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::List(_) => "list",
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl<T: Into<ArgValue>> From<Vec<T>> for ArgValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// Conversion back to Rust types
// ============================================================================

/// Types that can be read back out of an [`ArgValue`].
pub trait FromArgValue: Sized {
    /// Human-readable name of the target type.
    const EXPECTED: &'static str;

    /// Converts the value, or returns `None` on a kind mismatch.
    fn from_arg_value(value: &ArgValue) -> Option<Self>;
}

impl FromArgValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_arg_value(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromArgValue for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_arg_value(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Integer(v) => Some(*v),
            _ => None,
        }
    }
}

/// Integers widen to floats; the reverse never happens implicitly.
impl FromArgValue for f64 {
    const EXPECTED: &'static str = "float";

    fn from_arg_value(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Float(v) => Some(*v),
            ArgValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl FromArgValue for String {
    const EXPECTED: &'static str = "text";

    fn from_arg_value(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl<T: FromArgValue> FromArgValue for Vec<T> {
    const EXPECTED: &'static str = "list";

    fn from_arg_value(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::List(items) => items.iter().map(T::from_arg_value).collect(),
            _ => None,
        }
    }
}

impl FromArgValue for ArgValue {
    const EXPECTED: &'static str = "any";

    fn from_arg_value(value: &ArgValue) -> Option<Self> {
        Some(value.clone())
    }
}

// ============================================================================
// Arguments
// ============================================================================

/// Named argument bindings in declaration order.
///
/// Insertion order is the order in which argument cutters ran, which is the
/// order they were declared on the command.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Arguments {
    entries: IndexMap<String, ArgValue>,
}

impl Arguments {
    /// Creates an empty binding set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `value`, replacing an earlier binding of the same name
    /// in place.
    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.entries.insert(name.into(), value);
    }

    /// Returns the raw value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.entries.get(name)
    }

    /// Returns the value bound to `name` converted to `T`.
    pub fn get_as<T: FromArgValue>(&self, name: &str) -> ArgumentResult<T> {
        let value = self
            .get(name)
            .ok_or_else(|| ArgumentError::Missing(name.to_string()))?;
        T::from_arg_value(value).ok_or_else(|| ArgumentError::TypeMismatch {
            name: name.to_string(),
            expected: T::EXPECTED,
            found: value.kind(),
        })
    }

    /// Returns `true` if `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterates over bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Returns the bound names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, ArgValue)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (N, ArgValue)>>(iter: I) -> Self {
        let mut arguments = Self::new();
        for (name, value) in iter {
            arguments.insert(name, value);
        }
        arguments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments_keep_declaration_order() {
        let mut args = Arguments::new();
        args.insert("b", ArgValue::Bool(true));
        args.insert("a", ArgValue::Integer(1));
        args.insert("b", ArgValue::Bool(false));

        let names: Vec<_> = args.names().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(!args.get_as::<bool>("b").unwrap());
    }

    #[test]
    fn test_get_as_reports_mismatch() {
        let args: Arguments = [("n", ArgValue::Text("x".into()))].into_iter().collect();

        let err = args.get_as::<i64>("n").unwrap_err();
        assert!(matches!(
            err,
            ArgumentError::TypeMismatch {
                expected: "integer",
                found: "text",
                ..
            }
        ));
        assert!(matches!(
            args.get_as::<i64>("missing"),
            Err(ArgumentError::Missing(_))
        ));
    }

    #[test]
    fn test_list_conversion_and_display() {
        let value = ArgValue::from(vec![1_i64, 2, 3]);

        assert_eq!(Vec::<i64>::from_arg_value(&value), Some(vec![1, 2, 3]));
        assert_eq!(Vec::<f64>::from_arg_value(&value), Some(vec![1.0, 2.0, 3.0]));
        assert_eq!(value.to_string(), "[1, 2, 3]");
    }

    #[test]
    fn test_arguments_serialize_as_ordered_map() {
        let args: Arguments = [
            ("z", ArgValue::Integer(1)),
            ("a", ArgValue::Text("hi".into())),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&args).unwrap();
        assert_eq!(json, r#"{"z":1,"a":"hi"}"#);
    }
}
