// ============================================================================
// rowbridge Library
// ============================================================================

//! Marshalling layer between dynamically-typed host values and
//! schema-typed storage rows.
//!
//! Host input is anything implementing [`DynamicValue`]: the crate's own
//! [`Dynamic`] model or a `serde_json::Value`. The [`AccessorContext`]
//! coerces it property by property against a [`Schema`], resolves object
//! identity through primary keys, fills in defaults and writes through a
//! [`StorageEngine`], bracketing every write with change notifications.

pub mod accessor;
pub mod core;
pub mod dynamic;
pub mod facade;
pub mod prelude;
pub mod storage;
pub mod transaction;

// Re-export main types for convenience
pub use crate::accessor::{AccessorConfig, AccessorContext, AccessorError, AccessorResult, RealizeMode};
pub use crate::core::{
    DbError, ObjectTypeDescriptor, PrimitiveKind, PropertyDescriptor, PropertyKind, Result,
    RowHandle, Schema, Value,
};
pub use crate::dynamic::{Dynamic, DynamicValue};
pub use crate::facade::Session;
pub use crate::storage::{InMemoryStorage, StorageEngine, TransactionalEngine};
