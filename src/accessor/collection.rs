//! Collection adapter
//!
//! Uniform size / index / enumerate over anything array-like: host arrays
//! through the [`DynamicValue`] capabilities, stored lists and whole tables
//! through the engine, read at the moment of the call.

use super::error::{AccessorError, AccessorResult};
use crate::core::RowHandle;
use crate::dynamic::{CollectionRef, Dynamic, DynamicValue};
use crate::storage::StorageEngine;

/// One element handed out by the adapter.
#[derive(Debug)]
pub enum Element<'v> {
    Host(&'v dyn DynamicValue),
    Stored(Dynamic),
}

impl Element<'_> {
    pub fn value(&self) -> &dyn DynamicValue {
        match self {
            Element::Host(value) => *value,
            Element::Stored(value) => value,
        }
    }
}

pub struct CollectionAdapter<'e, E: StorageEngine + ?Sized> {
    engine: &'e E,
}

impl<'e, E: StorageEngine + ?Sized> CollectionAdapter<'e, E> {
    pub fn new(engine: &'e E) -> Self {
        Self { engine }
    }

    pub fn size(&self, value: &dyn DynamicValue) -> AccessorResult<usize> {
        match value.as_collection_ref() {
            Some(CollectionRef::List(list)) => {
                let stored = self.engine.read(list.owner, list.property)?;
                Ok(stored.as_link_list().map_or(0, <[RowHandle]>::len))
            }
            Some(CollectionRef::Objects(objects)) => Ok(self.engine.row_count(objects.table)?),
            None => host_size(value),
        }
    }

    pub fn element_at<'v>(
        &self,
        value: &'v dyn DynamicValue,
        index: usize,
    ) -> AccessorResult<Option<Element<'v>>> {
        match value.as_collection_ref() {
            Some(collection) => Ok(self
                .handles(collection)?
                .get(index)
                .map(|handle| Element::Stored(Dynamic::Object(*handle)))),
            None => {
                host_size(value)?;
                Ok(value.element(index).map(Element::Host))
            }
        }
    }

    /// Visits every element in order. The first error returned by `visit`
    /// stops the walk and is handed back to the caller.
    pub fn enumerate<F>(&self, value: &dyn DynamicValue, mut visit: F) -> AccessorResult<()>
    where
        F: FnMut(usize, &dyn DynamicValue) -> AccessorResult<()>,
    {
        match value.as_collection_ref() {
            Some(collection) => {
                for (index, handle) in self.handles(collection)?.into_iter().enumerate() {
                    visit(index, &Dynamic::Object(handle))?;
                }
                Ok(())
            }
            None => enumerate_host(value, visit),
        }
    }

    /// Rows a stored collection holds right now.
    pub fn handles(&self, collection: CollectionRef) -> AccessorResult<Vec<RowHandle>> {
        match collection {
            CollectionRef::List(list) => {
                let stored = self.engine.read(list.owner, list.property)?;
                Ok(stored.as_link_list().map(<[RowHandle]>::to_vec).unwrap_or_default())
            }
            CollectionRef::Objects(objects) => Ok(self.engine.rows(objects.table)?),
        }
    }

    /// Freezes a stored collection into a plain array of object references;
    /// later writes to the list do not show up in the snapshot.
    pub fn snapshot(&self, value: &dyn DynamicValue) -> AccessorResult<Dynamic> {
        let collection = value.as_collection_ref().ok_or_else(|| {
            AccessorError::UnsupportedConversion(format!(
                "only stored collections can be snapshotted, got {}",
                value.describe()
            ))
        })?;
        Ok(Dynamic::Array(
            self.handles(collection)?
                .into_iter()
                .map(Dynamic::Object)
                .collect(),
        ))
    }
}

/// Walks a host-native array without touching storage.
pub fn enumerate_host<F>(value: &dyn DynamicValue, mut visit: F) -> AccessorResult<()>
where
    F: FnMut(usize, &dyn DynamicValue) -> AccessorResult<()>,
{
    let size = host_size(value)?;
    for index in 0..size {
        let element = value.element(index).ok_or_else(|| {
            AccessorError::UnsupportedConversion(format!(
                "array-like value reported {} elements but has no element {}",
                size, index
            ))
        })?;
        visit(index, element)?;
    }
    Ok(())
}

fn host_size(value: &dyn DynamicValue) -> AccessorResult<usize> {
    match value.size() {
        Some(size) if value.is_array_like() => Ok(size),
        _ => Err(AccessorError::UnsupportedConversion(format!(
            "{} is not array-like",
            value.describe()
        ))),
    }
}
