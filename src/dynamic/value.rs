use super::{CollectionRef, DynamicValue};
use crate::core::RowHandle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lazy reference to a list property of a stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListRef {
    pub owner: RowHandle,
    pub property: usize,
}

/// Lazy reference to every row of one object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectsRef {
    pub table: usize,
}

/// The crate's host object model.
///
/// Values read back from storage come out as `Dynamic`; links are wrapped
/// lazily as [`Dynamic::Object`], [`Dynamic::List`] and
/// [`Dynamic::Objects`] and only touch storage when enumerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Dynamic {
    Null,
    Bool(bool),
    Int(i64),
    Float(f32),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Array(Vec<Dynamic>),
    Dictionary(BTreeMap<String, Dynamic>),
    Object(RowHandle),
    List(ListRef),
    Objects(ObjectsRef),
}

impl Dynamic {
    /// Builds a dictionary-like value from `(name, value)` pairs.
    pub fn dictionary<K, V, I>(fields: I) -> Self
    where
        K: Into<String>,
        V: Into<Dynamic>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Dictionary(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn array<V: Into<Dynamic>, I: IntoIterator<Item = V>>(items: I) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    pub fn as_object(&self) -> Option<RowHandle> {
        match self {
            Self::Object(handle) => Some(*handle),
            _ => None,
        }
    }
}

impl DynamicValue for Dynamic {
    fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    fn is_array_like(&self) -> bool {
        matches!(self, Self::Array(_) | Self::List(_) | Self::Objects(_))
    }

    fn is_dictionary_like(&self) -> bool {
        matches!(self, Self::Dictionary(_))
    }

    fn field(&self, name: &str) -> Option<&dyn DynamicValue> {
        match self {
            Self::Dictionary(fields) => fields.get(name).map(|v| v as &dyn DynamicValue),
            _ => None,
        }
    }

    fn size(&self) -> Option<usize> {
        match self {
            Self::Array(items) => Some(items.len()),
            _ => None,
        }
    }

    fn element(&self, index: usize) -> Option<&dyn DynamicValue> {
        match self {
            Self::Array(items) => items.get(index).map(|v| v as &dyn DynamicValue),
            _ => None,
        }
    }

    fn as_row(&self) -> Option<RowHandle> {
        self.as_object()
    }

    fn as_collection_ref(&self) -> Option<CollectionRef> {
        match self {
            Self::List(list) => Some(CollectionRef::List(*list)),
            Self::Objects(objects) => Some(CollectionRef::Objects(*objects)),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(f64::from(*f)),
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(b) => Some(b),
            _ => None,
        }
    }

    fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl From<bool> for Dynamic {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Dynamic {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Dynamic {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f32> for Dynamic {
    fn from(f: f32) -> Self {
        Self::Float(f)
    }
}

impl From<f64> for Dynamic {
    fn from(d: f64) -> Self {
        Self::Double(d)
    }
}

impl From<&str> for Dynamic {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Dynamic {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<u8>> for Dynamic {
    fn from(b: Vec<u8>) -> Self {
        Self::Binary(b)
    }
}

impl From<DateTime<Utc>> for Dynamic {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Timestamp(t)
    }
}

impl From<RowHandle> for Dynamic {
    fn from(handle: RowHandle) -> Self {
        Self::Object(handle)
    }
}

impl From<Vec<Dynamic>> for Dynamic {
    fn from(items: Vec<Dynamic>) -> Self {
        Self::Array(items)
    }
}

impl<T: Into<Dynamic>> From<Option<T>> for Dynamic {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Dynamic {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as JsonValue;
        match json {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Null, Self::Double),
            },
            JsonValue::String(s) => Self::String(s),
            JsonValue::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            JsonValue::Object(fields) => Self::Dictionary(
                fields.into_iter().map(|(k, v)| (k, Self::from(v))).collect(),
            ),
        }
    }
}
