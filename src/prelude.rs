//! Everything embedding code usually needs, in one import.

pub use crate::accessor::{
    AccessorConfig, AccessorContext, AccessorError, AccessorResult, ChangeEvent, ChangeLog,
    ChangeObserver, CollectionAdapter, DefaultValues, RealizeMode,
};
pub use crate::core::{
    ObjectTypeDescriptor, PrimitiveKind, PropertyDescriptor, PropertyKind, RowHandle, Schema,
};
pub use crate::dynamic::{CollectionRef, Dynamic, DynamicValue, ListRef, ObjectsRef};
pub use crate::facade::Session;
pub use crate::storage::{InMemoryStorage, StorageEngine, TransactionalEngine};
