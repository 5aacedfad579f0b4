//! Accessor context
//!
//! Single entry point for reading and writing schema-typed properties:
//! `get_value`, `set_value` and `realize`. The context borrows everything
//! it needs for one call sequence inside the caller's open transaction and
//! holds no state of its own.

use super::coercion::{self, CoercionTable};
use super::collection::{self, CollectionAdapter};
use super::config::AccessorConfig;
use super::defaults::DefaultValues;
use super::error::{AccessorError, AccessorResult};
use super::notify::ChangeNotifier;
use crate::core::{
    DbError, ObjectTypeDescriptor, PrimitiveKind, PropertyDescriptor, PropertyKind, RowHandle,
    Schema, Value,
};
use crate::dynamic::{Dynamic, DynamicValue, ListRef, ObjectsRef};
use crate::storage::StorageEngine;
use log::{debug, trace};
use std::collections::BTreeMap;

/// How `realize` treats input that may already be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RealizeMode {
    /// Always build new rows. A stored object given as the input itself is
    /// copied, and an existing primary key is an error.
    #[default]
    Create,
    /// Accept stored objects of the right type as they are; build new rows
    /// for everything else.
    Promote,
    /// Promote stored objects and update rows found by primary key in place.
    CreateOrUpdate,
}

impl RealizeMode {
    /// Maps the boolean create/update flag onto a mode.
    pub fn from_update_flag(update: bool) -> Self {
        if update {
            Self::CreateOrUpdate
        } else {
            Self::Promote
        }
    }

    pub fn allows_promotion(self) -> bool {
        matches!(self, Self::Promote | Self::CreateOrUpdate)
    }

    pub fn update_allowed(self) -> bool {
        matches!(self, Self::CreateOrUpdate)
    }
}

pub struct AccessorContext<'a, E: StorageEngine + ?Sized> {
    pub(super) schema: &'a Schema,
    pub(super) engine: &'a mut E,
    pub(super) defaults: &'a DefaultValues,
    pub(super) notifier: &'a ChangeNotifier,
    pub(super) config: &'a AccessorConfig,
}

impl<'a, E: StorageEngine + ?Sized> AccessorContext<'a, E> {
    pub fn new(
        schema: &'a Schema,
        engine: &'a mut E,
        defaults: &'a DefaultValues,
        notifier: &'a ChangeNotifier,
        config: &'a AccessorConfig,
    ) -> Self {
        Self {
            schema,
            engine,
            defaults,
            notifier,
            config,
        }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn engine(&self) -> &E {
        &*self.engine
    }

    pub fn collections(&self) -> CollectionAdapter<'_, E> {
        CollectionAdapter::new(&*self.engine)
    }

    pub fn property_index(&self, object_type: &str, property: &str) -> AccessorResult<usize> {
        self.schema.property_index(object_type, property)
    }

    /// Reads one property and wraps it for the host.
    ///
    /// Links come back as [`Dynamic::Object`] and lists as a lazy
    /// [`Dynamic::List`]; neither materializes the linked rows. Never
    /// writes to storage.
    ///
    /// # Panics
    ///
    /// Panics if `property` is past the row type's declared property count,
    /// or if `row` names a type outside this schema.
    pub fn get_value(&self, row: RowHandle, property: usize) -> AccessorResult<Dynamic> {
        let object_type = self.schema.object_type(row.table);
        let descriptor = object_type.property(property);
        match &descriptor.kind {
            PropertyKind::List(_) => {
                self.check_row(object_type, row)?;
                Ok(Dynamic::List(ListRef { owner: row, property }))
            }
            PropertyKind::Primitive(PrimitiveKind::Any) => {
                Err(AccessorError::UnsupportedConversion(format!(
                    "'Any' type is unsupported ('{}.{}')",
                    object_type.name, descriptor.name
                )))
            }
            _ => Ok(coercion::from_storage(self.engine.read(row, property)?)),
        }
    }

    pub fn get_value_by_name(&self, row: RowHandle, property: &str) -> AccessorResult<Dynamic> {
        let index = self.name_to_index(row, property)?;
        self.get_value(row, index)
    }

    /// Validates and writes one property of a stored row.
    ///
    /// Objects nested in `value` are realized first, each with its own
    /// notification pair; the pair for this property only brackets the
    /// final storage write. A rejected value leaves the stored one intact.
    ///
    /// # Panics
    ///
    /// Panics if `property` is past the row type's declared property count,
    /// or if `row` names a type outside this schema.
    pub fn set_value(
        &mut self,
        row: RowHandle,
        property: usize,
        value: &dyn DynamicValue,
    ) -> AccessorResult<()> {
        let schema = self.schema;
        let object_type = schema.object_type(row.table);
        let descriptor = object_type.property(property);
        if object_type.primary_key_index() == Some(property) {
            let current = self.engine.read(row, property)?;
            let replacement =
                CoercionTable::new(self.config).to_storage(&object_type.name, descriptor, value)?;
            if replacement != current {
                return Err(AccessorError::PrimaryKeyImmutable {
                    object_type: object_type.name.clone(),
                    property: descriptor.name.clone(),
                });
            }
            return self.write_bracketed(row, property, descriptor, replacement);
        }
        self.set_value_with_mode(row, property, value, RealizeMode::Promote)
    }

    pub fn set_value_by_name(
        &mut self,
        row: RowHandle,
        property: &str,
        value: &dyn DynamicValue,
    ) -> AccessorResult<()> {
        let index = self.name_to_index(row, property)?;
        self.set_value(row, index, value)
    }

    /// Turns host input into a stored object of `object_type`.
    pub fn realize(
        &mut self,
        value: &dyn DynamicValue,
        object_type: &str,
        mode: RealizeMode,
    ) -> AccessorResult<RowHandle> {
        let (table, _) = self.schema.object_type_named(object_type)?;
        self.realize_in(table, value, mode)
    }

    /// Lazily enumerable view over every stored object of a type.
    pub fn objects(&self, object_type: &str) -> AccessorResult<Dynamic> {
        let (table, _) = self.schema.object_type_named(object_type)?;
        Ok(Dynamic::Objects(ObjectsRef { table }))
    }

    /// Adds `delta` to an int property in place and returns the new value.
    pub fn increment(&mut self, row: RowHandle, property: usize, delta: i64) -> AccessorResult<i64> {
        let schema = self.schema;
        let object_type = schema.object_type(row.table);
        let descriptor = object_type.property(property);
        if descriptor.kind != PropertyKind::Primitive(PrimitiveKind::Int) {
            return Err(AccessorError::type_mismatch(
                &object_type.name,
                &descriptor.name,
                PrimitiveKind::Int,
                descriptor.kind.to_string(),
            ));
        }
        if object_type.primary_key_index() == Some(property) && delta != 0 {
            return Err(AccessorError::PrimaryKeyImmutable {
                object_type: object_type.name.clone(),
                property: descriptor.name.clone(),
            });
        }

        let current = self.engine.read(row, property)?.as_i64().ok_or_else(|| {
            AccessorError::type_mismatch(&object_type.name, &descriptor.name, PrimitiveKind::Int, "null")
        })?;
        let next = current.wrapping_add(delta);
        self.write_bracketed(row, property, descriptor, Value::Integer(next))?;
        Ok(next)
    }

    fn realize_in(
        &mut self,
        table: usize,
        value: &dyn DynamicValue,
        mode: RealizeMode,
    ) -> AccessorResult<RowHandle> {
        let schema = self.schema;
        let object_type = schema.object_type(table);

        if let Some(row) = value.as_row() {
            if mode.allows_promotion() {
                self.check_promotable(object_type, table, row)?;
                debug!("promoted {} as '{}'", row, object_type.name);
                return Ok(row);
            }
            let copy = self.row_as_dictionary(row)?;
            return self.build_object(table, &copy, RealizeMode::Create);
        }

        self.build_object(table, value, mode)
    }

    /// Realizes the value of a link property or list element. Stored
    /// objects nested in the input are linked, never copied.
    fn realize_link(
        &mut self,
        table: usize,
        value: &dyn DynamicValue,
        mode: RealizeMode,
    ) -> AccessorResult<RowHandle> {
        let mode = if value.as_row().is_some() {
            RealizeMode::Promote
        } else {
            mode
        };
        self.realize_in(table, value, mode)
    }

    fn build_object(
        &mut self,
        table: usize,
        value: &dyn DynamicValue,
        mode: RealizeMode,
    ) -> AccessorResult<RowHandle> {
        let schema = self.schema;
        let defaults = self.defaults;
        let object_type = schema.object_type(table);
        self.check_object_input(object_type, value)?;

        let (row, created) = self.resolve_or_create_in(table, value, mode.update_allowed())?;

        for (index, property) in object_type.properties().iter().enumerate() {
            if object_type.primary_key_index() == Some(index) {
                continue;
            }
            match value_for_property(value, property, index) {
                Some(supplied) => self.set_value_with_mode(row, index, supplied, mode)?,
                None if created => {
                    match defaults.default_for(&object_type.name, &property.name) {
                        Some(default) => self.set_value_with_mode(row, index, default, mode)?,
                        None if property.is_required() => {
                            return Err(AccessorError::missing(&object_type.name, &property.name));
                        }
                        None => {}
                    }
                }
                // Partial update: omitted properties keep their stored value
                None => {}
            }
        }

        debug!(
            "{} {} as '{}'",
            if created { "created" } else { "updated" },
            row,
            object_type.name
        );
        Ok(row)
    }

    fn set_value_with_mode(
        &mut self,
        row: RowHandle,
        property: usize,
        value: &dyn DynamicValue,
        mode: RealizeMode,
    ) -> AccessorResult<()> {
        let schema = self.schema;
        let object_type = schema.object_type(row.table);
        let descriptor = object_type.property(property);
        self.check_row(object_type, row)?;
        let stored = self.to_storage_value(object_type, descriptor, value, mode)?;
        self.write_bracketed(row, property, descriptor, stored)
    }

    /// The only place rows are written: one begin/end pair per write, the
    /// end firing even when the engine rejects the value.
    pub(super) fn write_bracketed(
        &mut self,
        row: RowHandle,
        property: usize,
        descriptor: &PropertyDescriptor,
        value: Value,
    ) -> AccessorResult<()> {
        trace!("write {}.{} = {}", row, descriptor.name, value);
        let notifier = self.notifier;
        let _scope = notifier.begin(row, descriptor);
        self.engine.write(row, property, value)?;
        Ok(())
    }

    fn to_storage_value(
        &mut self,
        object_type: &ObjectTypeDescriptor,
        descriptor: &PropertyDescriptor,
        value: &dyn DynamicValue,
        mode: RealizeMode,
    ) -> AccessorResult<Value> {
        match &descriptor.kind {
            PropertyKind::Primitive(_) => {
                CoercionTable::new(self.config).to_storage(&object_type.name, descriptor, value)
            }
            PropertyKind::Object(target) => {
                if value.is_null() {
                    return Ok(Value::Null);
                }
                let accepts = value.as_row().is_some()
                    || value.is_dictionary_like()
                    || (value.is_array_like() && value.as_collection_ref().is_none());
                if !accepts {
                    return Err(AccessorError::type_mismatch(
                        &object_type.name,
                        &descriptor.name,
                        &descriptor.kind,
                        value.describe(),
                    ));
                }
                let table = self.target_table(target)?;
                Ok(Value::Link(self.realize_link(table, value, mode)?))
            }
            PropertyKind::List(target) => {
                if value.is_null() {
                    return Ok(Value::LinkList(Vec::new()));
                }
                if !value.is_array_like() {
                    return Err(AccessorError::type_mismatch(
                        &object_type.name,
                        &descriptor.name,
                        &descriptor.kind,
                        value.describe(),
                    ));
                }
                let table = self.target_table(target)?;
                let mut handles = Vec::new();
                match value.as_collection_ref() {
                    Some(stored) => {
                        let rows = self.collections().handles(stored)?;
                        for element in rows {
                            handles.push(self.realize_link(table, &Dynamic::Object(element), mode)?);
                        }
                    }
                    None => collection::enumerate_host(value, |_, element| {
                        handles.push(self.realize_link(table, element, mode)?);
                        Ok(())
                    })?,
                }
                Ok(Value::LinkList(handles))
            }
        }
    }

    fn check_object_input(
        &self,
        object_type: &ObjectTypeDescriptor,
        value: &dyn DynamicValue,
    ) -> AccessorResult<()> {
        if value.is_dictionary_like() {
            return Ok(());
        }
        if value.is_array_like()
            && value.as_collection_ref().is_none()
            && let Some(size) = value.size()
        {
            let count = object_type.property_count();
            let fits = if self.config.strict_positional_input {
                size == count
            } else {
                size <= count
            };
            if fits {
                return Ok(());
            }
            return Err(AccessorError::object_mismatch(
                &object_type.name,
                format!("array of {} values", count),
                format!("array of {} values", size),
            ));
        }
        Err(AccessorError::object_mismatch(
            &object_type.name,
            "object",
            value.describe(),
        ))
    }

    pub(super) fn check_row(
        &self,
        object_type: &ObjectTypeDescriptor,
        row: RowHandle,
    ) -> AccessorResult<()> {
        if self.engine.contains_row(row) {
            Ok(())
        } else {
            Err(DbError::RowNotFound {
                table: object_type.name.clone(),
                row: row.row,
            }
            .into())
        }
    }

    /// A stored object is only accepted as-is for its own type.
    pub(super) fn check_promotable(
        &self,
        object_type: &ObjectTypeDescriptor,
        table: usize,
        row: RowHandle,
    ) -> AccessorResult<()> {
        if row.table != table {
            let found = self
                .schema
                .object_types()
                .get(row.table)
                .map_or_else(|| row.to_string(), |t| format!("object of type '{}'", t.name));
            return Err(AccessorError::object_mismatch(
                &object_type.name,
                format!("object of type '{}'", object_type.name),
                found,
            ));
        }
        self.check_row(object_type, row)
    }

    /// Reads every property of a stored row into a dictionary-like value.
    fn row_as_dictionary(&self, row: RowHandle) -> AccessorResult<Dynamic> {
        let source = self.schema.object_types().get(row.table).ok_or_else(|| {
            AccessorError::StorageEngineFailure(DbError::TableNotFound(format!("#{}", row.table)))
        })?;
        self.check_row(source, row)?;
        let mut fields = BTreeMap::new();
        for (index, property) in source.properties().iter().enumerate() {
            if property.kind == PropertyKind::Primitive(PrimitiveKind::Any) {
                continue;
            }
            fields.insert(property.name.clone(), self.get_value(row, index)?);
        }
        Ok(Dynamic::Dictionary(fields))
    }

    fn target_table(&self, target: &str) -> AccessorResult<usize> {
        self.schema
            .type_index(target)
            .ok_or_else(|| AccessorError::UnknownObjectType(target.to_string()))
    }

    fn name_to_index(&self, row: RowHandle, property: &str) -> AccessorResult<usize> {
        let object_type = self.schema.object_type(row.table);
        object_type
            .property_index(property)
            .ok_or_else(|| AccessorError::UnknownProperty {
                object_type: object_type.name.clone(),
                property: property.to_string(),
            })
    }
}

/// Value the input supplies for one property: by position for array-like
/// input, by name otherwise. `None` means the property was omitted.
pub(super) fn value_for_property<'v>(
    value: &'v dyn DynamicValue,
    property: &PropertyDescriptor,
    index: usize,
) -> Option<&'v dyn DynamicValue> {
    if value.is_array_like() {
        value.element(index)
    } else {
        value.field(&property.name)
    }
}
