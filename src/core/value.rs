use super::RowHandle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Raw typed value as held by a storage row.
///
/// This is the storage side of the accessor: one variant per storage
/// primitive plus the two link shapes. Host code never sees it directly,
/// it only gets `Dynamic` values produced by the coercion table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Binary(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Link(RowHandle),
    LinkList(Vec<RowHandle>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Boolean(_) => "BOOLEAN",
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Double(_) => "DOUBLE",
            Self::Text(_) => "TEXT",
            Self::Binary(_) => "BINARY",
            Self::Timestamp(_) => "TIMESTAMP",
            Self::Link(_) => "LINK",
            Self::LinkList(_) => "LINKLIST",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<RowHandle> {
        match self {
            Self::Link(handle) => Some(*handle),
            _ => None,
        }
    }

    pub fn as_link_list(&self) -> Option<&[RowHandle]> {
        match self {
            Self::LinkList(handles) => Some(handles),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            // NaN compares equal to itself so stored rows stay comparable
            (Self::Float(a), Self::Float(b)) => (a.is_nan() && b.is_nan()) || a == b,
            (Self::Double(a), Self::Double(b)) => (a.is_nan() && b.is_nan()) || a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Binary(a), Self::Binary(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Link(a), Self::Link(b)) => a == b,
            (Self::LinkList(a), Self::LinkList(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Null => 0u8.hash(state),
            Self::Boolean(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            Self::Integer(i) => {
                2u8.hash(state);
                i.hash(state);
            }
            Self::Float(f) => {
                3u8.hash(state);
                canonical_f32_bits(*f).hash(state);
            }
            Self::Double(d) => {
                4u8.hash(state);
                canonical_f64_bits(*d).hash(state);
            }
            Self::Text(s) => {
                5u8.hash(state);
                s.hash(state);
            }
            Self::Binary(b) => {
                6u8.hash(state);
                b.hash(state);
            }
            Self::Timestamp(t) => {
                7u8.hash(state);
                t.hash(state);
            }
            Self::Link(h) => {
                8u8.hash(state);
                h.hash(state);
            }
            Self::LinkList(hs) => {
                9u8.hash(state);
                hs.hash(state);
            }
        }
    }
}

// Every NaN and both zeroes compare equal, so they must hash alike
fn canonical_f32_bits(f: f32) -> u32 {
    if f.is_nan() {
        f32::NAN.to_bits()
    } else if f == 0.0 {
        0
    } else {
        f.to_bits()
    }
}

fn canonical_f64_bits(d: f64) -> u64 {
    if d.is_nan() {
        f64::NAN.to_bits()
    } else if d == 0.0 {
        0
    } else {
        d.to_bits()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::Double(d) => write!(f, "{}", d),
            Self::Text(s) => write!(f, "'{}'", s),
            Self::Binary(b) => write!(f, "<{} bytes>", b.len()),
            Self::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Self::Link(h) => write!(f, "{}", h),
            Self::LinkList(hs) => write!(f, "[{} links]", hs.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Self::Double(d)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}
