//! The record boundary.
//!
//! Scopes and queries never see typed domain objects. Whatever adapter
//! owns those objects presents them as string-keyed mappings of JSON
//! values through the [`Record`] trait.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

/// A string-keyed record that scopes can be evaluated against.
///
/// Implemented for the common map types holding [`serde_json::Value`]s,
/// and for `serde_json::Value` itself (objects only; any other JSON value
/// has no attributes).
///
/// # Manual Implementation
///
/// ```
/// use serde_json::Value;
/// use standout_scope::Record;
///
/// struct Book {
///     title: Value,
///     year: Value,
/// }
///
/// impl Record for Book {
///     fn attribute(&self, name: &str) -> Option<&Value> {
///         match name {
///             "title" => Some(&self.title),
///             "year" => Some(&self.year),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Record {
    /// Returns the value stored under `name`, if present.
    fn attribute(&self, name: &str) -> Option<&Value>;

    /// Returns the value stored under `name`, reading a missing attribute
    /// as JSON `null`.
    fn attribute_or_null(&self, name: &str) -> &Value {
        self.attribute(name).unwrap_or(&Value::Null)
    }
}

impl Record for Map<String, Value> {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl Record for Value {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(name))
    }
}

impl Record for HashMap<String, Value> {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl Record for BTreeMap<String, Value> {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn attribute(&self, name: &str) -> Option<&Value> {
        (**self).attribute(name)
    }
}
