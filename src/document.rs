use indexmap::IndexMap;
use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};
use std::{borrow::Cow, convert::TryFrom, fmt};

use crate::{
    error::{Result, UnitError},
    kind::UnitKind,
};

/// A scalar directive value.
///
/// Unit files are text, so two values are equal when they render to the same
/// text: `Value::Bool(true) == Value::from("true")`.
#[derive(Debug, Clone, Eq)]
pub enum Value {
    Str(String),
    Bool(bool),
}

impl Value {
    /// Rendering used on disk. Booleans are always the lowercase literals.
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            Value::Str(s) => Cow::Borrowed(s),
            Value::Bool(true) => Cow::Borrowed("true"),
            Value::Bool(false) => Cow::Borrowed("false"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Str(s) => serializer.serialize_str(s),
            Value::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string, boolean or number")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Str(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Str(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Str(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::Str(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::Str(v))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Value),
    Many(Vec<Value>),
}

/// The values bound to one key, in file order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "OneOrMany")]
pub struct ValueList(Vec<Value>);

impl ValueList {
    pub fn single(value: impl Into<Value>) -> Self {
        ValueList(vec![value.into()])
    }

    pub fn try_from_vec(values: Vec<Value>) -> Option<Self> {
        if values.is_empty() {
            None
        } else {
            Some(ValueList(values))
        }
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.0.push(value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first(&self) -> &Value {
        &self.0[0]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    /// All values joined by newlines.
    pub fn joined(&self) -> String {
        self.0
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl TryFrom<OneOrMany> for ValueList {
    type Error = &'static str;

    fn try_from(raw: OneOrMany) -> Result<Self, Self::Error> {
        match raw {
            OneOrMany::One(v) => Ok(ValueList(vec![v])),
            OneOrMany::Many(vs) => ValueList::try_from_vec(vs).ok_or("value list cannot be empty"),
        }
    }
}

impl Serialize for ValueList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.0)
    }
}

impl<'a> IntoIterator for &'a ValueList {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Value> for ValueList {
    fn from(value: Value) -> Self {
        ValueList(vec![value])
    }
}

impl From<&str> for ValueList {
    fn from(value: &str) -> Self {
        ValueList::single(value)
    }
}

impl From<String> for ValueList {
    fn from(value: String) -> Self {
        ValueList::single(value)
    }
}

impl From<bool> for ValueList {
    fn from(value: bool) -> Self {
        ValueList::single(value)
    }
}

/// Keys of one `[Section]`, case-sensitive, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Section(IndexMap<String, ValueList>);

impl Section {
    pub fn new() -> Self {
        Section(IndexMap::new())
    }

    /// Adds `value` after any values the key already holds.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        match self.0.entry(key.into()) {
            indexmap::map::Entry::Occupied(mut e) => e.get_mut().push(value),
            indexmap::map::Entry::Vacant(e) => {
                e.insert(ValueList::single(value));
            }
        }
    }

    /// Replaces the whole value list of `key`. An existing key keeps its position.
    pub fn set(&mut self, key: impl Into<String>, values: impl Into<ValueList>) -> Option<ValueList> {
        self.0.insert(key.into(), values.into())
    }

    pub fn get(&self, key: &str) -> Option<&ValueList> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ValueList> {
        self.0.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueList)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An ordered, multi-valued unit file document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(IndexMap<String, Section>);

impl Document {
    pub fn new() -> Self {
        Document(IndexMap::new())
    }

    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.0.get(name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.0.get_mut(name)
    }

    pub fn contains_section(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Returns the named section, creating it after the last one if needed.
    pub fn ensure_section(&mut self, name: impl Into<String>) -> &mut Section {
        self.0.entry(name.into()).or_insert_with(Section::new)
    }

    pub fn insert_section(&mut self, name: impl Into<String>, section: Section) -> Option<Section> {
        self.0.insert(name.into(), section)
    }

    pub fn remove_section(&mut self, name: &str) -> Option<Section> {
        self.0.shift_remove(name)
    }

    pub fn append(&mut self, section: &str, key: impl Into<String>, value: impl Into<Value>) {
        self.ensure_section(section).append(key, value);
    }

    pub fn set(&mut self, section: &str, key: impl Into<String>, values: impl Into<ValueList>) {
        self.ensure_section(section).set(key, values);
    }

    pub fn get(&self, section: &str, key: &str) -> Result<&ValueList> {
        self.section(section)
            .ok_or_else(|| UnitError::SectionNotFound {
                section: section.to_string(),
            })?
            .get(key)
            .ok_or_else(|| UnitError::KeyNotFound {
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    pub fn get_or<'a>(&'a self, section: &str, key: &str, fallback: &'a ValueList) -> &'a ValueList {
        self.get(section, key).unwrap_or(fallback)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Desired documents of a unit bundle, one per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitFiles(pub IndexMap<UnitKind, Document>);

impl UnitFiles {
    pub fn new() -> Self {
        UnitFiles(IndexMap::new())
    }

    pub fn insert(&mut self, kind: UnitKind, doc: Document) -> Option<Document> {
        self.0.insert(kind, doc)
    }

    pub fn get(&self, kind: UnitKind) -> Option<&Document> {
        self.0.get(&kind)
    }
}
