//! Front-matter values.
//!
//! Front matter is flat: every key maps to a [`Value`], and lists only hold
//! [`Scalar`]s. Anything else is rejected when it enters the system.

use crate::error::{DocError, Result};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;
use std::fmt;

/// A single list element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    Text(String),
}

/// A front-matter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    List(Vec<Scalar>),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::List(_) => "list",
        }
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Number(n) => Value::Number(n),
            Scalar::Text(s) => Value::Text(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n.into())
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Scalar::Number(n.into())
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

/// Check that a key can be written to and read back from a front-matter block.
pub fn validate_key(key: &str) -> Result<()> {
    let invalid = key.is_empty()
        || key.contains(':')
        || key.chars().any(char::is_control)
        || key.starts_with(|c: char| c.is_whitespace() || c == '-' || c == '#')
        || key.ends_with(char::is_whitespace);

    if invalid {
        return Err(DocError::InvalidFrontMatter(format!(
            "invalid key {:?}",
            key
        )));
    }
    Ok(())
}

/// Insertion-ordered front-matter map.
///
/// Values are persistent: [`FrontMatter::set`] and [`FrontMatter::merged`]
/// return new maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    entries: Vec<(String, Value)>,
}

impl FrontMatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return a copy with `key` set to `value`.
    ///
    /// Existing keys keep their position; new keys are appended.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        let key = key.into();
        validate_key(&key)?;
        self.insert(key, value.into());
        Ok(self)
    }

    /// Shallow-merge a patch over this map.
    pub fn merged(&self, patch: &FrontMatterPatch) -> Self {
        let mut out = self.clone();
        for (key, value) in patch.iter() {
            match value {
                Some(value) => out.insert(key.to_string(), value.clone()),
                None => out.entries.retain(|(k, _)| k != key),
            }
        }
        out
    }

    /// Insert without key validation; callers guarantee the key is valid.
    pub(crate) fn insert(&mut self, key: String, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }
}

impl Serialize for FrontMatter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FrontMatter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct FrontMatterVisitor;

        impl<'de> Visitor<'de> for FrontMatterVisitor {
            type Value = FrontMatter;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a flat map of front-matter values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<FrontMatter, A::Error> {
                let mut fm = FrontMatter::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    validate_key(&key).map_err(serde::de::Error::custom)?;
                    fm.insert(key, value);
                }
                Ok(fm)
            }
        }

        deserializer.deserialize_map(FrontMatterVisitor)
    }
}

/// A shallow front-matter patch.
///
/// `None` is the explicit absence value: the key is removed instead of being
/// written as null. In JSON a patch is an object whose `null` members remove.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatterPatch {
    entries: Vec<(String, Option<Value>)>,
}

impl FrontMatterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        let key = key.into();
        validate_key(&key)?;
        self.push(key, Some(value.into()));
        Ok(self)
    }

    /// Remove `key`.
    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.push(key.into(), None);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Option<Value>> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, key: String, value: Option<Value>) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }
}

impl<'de> Deserialize<'de> for FrontMatterPatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PatchVisitor;

        impl<'de> Visitor<'de> for PatchVisitor {
            type Value = FrontMatterPatch;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of front-matter values, null to remove")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<FrontMatterPatch, A::Error> {
                let mut patch = FrontMatterPatch::new();
                while let Some((key, value)) = access.next_entry::<String, Option<Value>>()? {
                    if value.is_some() {
                        validate_key(&key).map_err(serde::de::Error::custom)?;
                    }
                    patch.push(key, value);
                }
                Ok(patch)
            }
        }

        deserializer.deserialize_map(PatchVisitor)
    }
}
