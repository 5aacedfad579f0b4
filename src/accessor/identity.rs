//! Identity resolution: decides whether host input names an object that is
//! already stored, and creates the row when it does not.

use super::coercion::CoercionTable;
use super::context::{AccessorContext, value_for_property};
use super::error::{AccessorError, AccessorResult};
use crate::core::{ObjectTypeDescriptor, RowHandle, Value};
use crate::dynamic::DynamicValue;
use crate::storage::StorageEngine;
use log::debug;

impl<'a, E: StorageEngine + ?Sized> AccessorContext<'a, E> {
    /// Finds the stored object `value` refers to, without creating anything.
    ///
    /// A stored object of the right type resolves to itself. Other input
    /// resolves through its primary key when the type declares one and the
    /// input supplies it.
    pub fn resolve_existing(
        &self,
        object_type: &str,
        value: &dyn DynamicValue,
    ) -> AccessorResult<Option<RowHandle>> {
        let (table, _) = self.schema.object_type_named(object_type)?;
        self.resolve_existing_in(table, value)
    }

    /// Returns the row for `value`, allocating one if needed. A freshly
    /// allocated row already carries its primary key; no other property is
    /// written here.
    pub fn resolve_or_create(
        &mut self,
        object_type: &str,
        value: &dyn DynamicValue,
        update_allowed: bool,
    ) -> AccessorResult<RowHandle> {
        let (table, _) = self.schema.object_type_named(object_type)?;
        Ok(self.resolve_or_create_in(table, value, update_allowed)?.0)
    }

    pub(super) fn resolve_existing_in(
        &self,
        table: usize,
        value: &dyn DynamicValue,
    ) -> AccessorResult<Option<RowHandle>> {
        let object_type = self.schema.object_type(table);
        if let Some(row) = value.as_row() {
            self.check_promotable(object_type, table, row)?;
            return Ok(Some(row));
        }

        let Some(key_index) = object_type.primary_key_index() else {
            return Ok(None);
        };
        let key_property = object_type.property(key_index);
        let Some(raw) = value_for_property(value, key_property, key_index) else {
            return Ok(None);
        };
        let key = CoercionTable::new(self.config).to_storage(&object_type.name, key_property, raw)?;
        Ok(self.engine.find_by_primary_key(table, &key)?)
    }

    /// The boolean is `true` when the row was just allocated.
    pub(super) fn resolve_or_create_in(
        &mut self,
        table: usize,
        value: &dyn DynamicValue,
        update_allowed: bool,
    ) -> AccessorResult<(RowHandle, bool)> {
        let schema = self.schema;
        let object_type = schema.object_type(table);

        // The key is settled before allocating so a bad key leaves no row behind
        let key = match object_type.primary_key_index() {
            Some(index) if value.as_row().is_none() => {
                Some((index, self.primary_key_value(object_type, index, value)?))
            }
            _ => None,
        };
        let existing = match &key {
            Some((_, key)) => self.engine.find_by_primary_key(table, key)?,
            None => self.resolve_existing_in(table, value)?,
        };

        if let Some(row) = existing {
            if !update_allowed {
                let key = match &key {
                    Some((_, key)) => key.to_string(),
                    None => row.to_string(),
                };
                return Err(AccessorError::DuplicatePrimaryKey {
                    object_type: object_type.name.clone(),
                    key,
                });
            }
            debug!("'{}' input resolved to existing {}", object_type.name, row);
            return Ok((row, false));
        }

        let row = self.engine.allocate_row(table)?;
        if let Some((index, key)) = key {
            self.write_bracketed(row, index, object_type.property(index), key)?;
        }
        Ok((row, true))
    }

    /// Key for a new row: supplied, else the registered default, else null
    /// when the key property is optional.
    fn primary_key_value(
        &self,
        object_type: &ObjectTypeDescriptor,
        index: usize,
        value: &dyn DynamicValue,
    ) -> AccessorResult<Value> {
        let property = object_type.property(index);
        let coercion = CoercionTable::new(self.config);
        match value_for_property(value, property, index) {
            Some(raw) => coercion.to_storage(&object_type.name, property, raw),
            None => match self.defaults.default_for(&object_type.name, &property.name) {
                Some(default) => coercion.to_storage(&object_type.name, property, default),
                None if property.optional => Ok(Value::Null),
                None => Err(AccessorError::missing(&object_type.name, &property.name)),
            },
        }
    }
}
