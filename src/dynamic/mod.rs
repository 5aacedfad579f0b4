//! Host value capability interface.
//!
//! The accessor never assumes a concrete container type for its input.
//! Anything that can answer the handful of queries in [`DynamicValue`]
//! can be realized into storage: the crate's own [`Dynamic`] object model
//! and `serde_json::Value` both do.

mod json;
mod value;

pub use value::{Dynamic, ListRef, ObjectsRef};

use crate::core::RowHandle;
use chrono::{DateTime, Utc};
use std::fmt;

/// Storage-backed collection a host value may stand for.
///
/// These are enumerated against the engine at the time of the call, never
/// through the host value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionRef {
    List(ListRef),
    Objects(ObjectsRef),
}

/// Capability queries the accessor runs against host input.
///
/// Primitive getters answer only for values of that exact shape:
/// `as_i64` is `None` for floating point numbers and `as_f64` is `None`
/// for integers. Widening and narrowing belong to the coercion table.
pub trait DynamicValue: fmt::Debug {
    fn is_null(&self) -> bool;

    fn is_array_like(&self) -> bool;

    fn is_dictionary_like(&self) -> bool;

    /// Named field of a dictionary-like value. `None` means the field is
    /// absent, which is different from a present null.
    fn field(&self, name: &str) -> Option<&dyn DynamicValue>;

    /// Element count of a host-native array-like value.
    fn size(&self) -> Option<usize>;

    fn element(&self, index: usize) -> Option<&dyn DynamicValue>;

    /// Stored row this value already denotes, if any.
    fn as_row(&self) -> Option<RowHandle> {
        None
    }

    fn as_collection_ref(&self) -> Option<CollectionRef> {
        None
    }

    fn as_bool(&self) -> Option<bool>;

    fn as_i64(&self) -> Option<i64>;

    fn as_f64(&self) -> Option<f64>;

    fn as_str(&self) -> Option<&str>;

    fn as_bytes(&self) -> Option<&[u8]> {
        None
    }

    fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Short human readable rendering used in error messages.
    fn describe(&self) -> String {
        let mut text = format!("{:?}", self);
        if text.len() > 64 {
            let mut cut = 61;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
            text.push_str("...");
        }
        text
    }
}
