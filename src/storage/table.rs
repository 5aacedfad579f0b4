use crate::core::{DbError, ObjectTypeDescriptor, PrimitiveKind, PropertyKind, Result, Value};
use std::collections::{BTreeMap, HashMap};

pub type Row = Vec<Value>;

/// Rows of a single object type plus its primary-key index.
#[derive(Debug, Clone)]
pub struct Table {
    descriptor: ObjectTypeDescriptor,
    /// Table index of each property's link target, parallel to the properties.
    link_targets: Vec<Option<usize>>,
    rows: BTreeMap<usize, Row>,
    next_row_id: usize,
    primary_index: HashMap<Value, usize>,
}

impl Table {
    pub fn new(descriptor: ObjectTypeDescriptor, link_targets: Vec<Option<usize>>) -> Self {
        Self {
            descriptor,
            link_targets,
            rows: BTreeMap::new(),
            next_row_id: 0,
            primary_index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn link_target(&self, property: usize) -> Option<usize> {
        self.link_targets.get(property).copied().flatten()
    }

    /// Appends a row holding every property's zero value.
    ///
    /// The row is not reachable through the primary-key index until its key
    /// property is written.
    pub fn allocate(&mut self) -> usize {
        let id = self.next_row_id;
        self.next_row_id += 1;
        let row = self
            .descriptor
            .properties()
            .iter()
            .map(|p| p.zero_value())
            .collect();
        self.rows.insert(id, row);
        id
    }

    pub fn contains(&self, id: usize) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn get(&self, id: usize, property: usize) -> Result<&Value> {
        let row = self.row(id)?;
        row.get(property).ok_or_else(|| DbError::PropertyOutOfRange {
            table: self.name().to_string(),
            index: property,
        })
    }

    /// Writes one value, enforcing the column type and key uniqueness.
    /// Returns the previous value.
    pub fn set(&mut self, id: usize, property: usize, value: Value) -> Result<Value> {
        self.validate(property, &value)?;
        if self.descriptor.primary_key_index() == Some(property) {
            self.check_uniqueness(&value, id)?;
        }
        let old = self.replace(id, property, value.clone())?;
        if self.descriptor.primary_key_index() == Some(property) {
            if self.primary_index.get(&old) == Some(&id) {
                self.primary_index.remove(&old);
            }
            self.primary_index.insert(value, id);
        }
        Ok(old)
    }

    /// Puts back a value recorded in the undo log.
    pub(crate) fn restore(&mut self, id: usize, property: usize, value: Value) -> Result<()> {
        let current = self.replace(id, property, value.clone())?;
        if self.descriptor.primary_key_index() == Some(property) {
            if self.primary_index.get(&current) == Some(&id) {
                self.primary_index.remove(&current);
            }
            // An allocation's zero key was never indexed and must not shadow a live row
            self.primary_index.entry(value).or_insert(id);
        }
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: usize) -> Option<Row> {
        let row = self.rows.remove(&id)?;
        if let Some(key_idx) = self.descriptor.primary_key_index()
            && self.primary_index.get(&row[key_idx]) == Some(&id)
        {
            self.primary_index.remove(&row[key_idx]);
        }
        Some(row)
    }

    pub fn find_by_key(&self, key: &Value) -> Option<usize> {
        self.primary_index.get(key).copied()
    }

    pub fn row_ids(&self) -> Vec<usize> {
        self.rows.keys().copied().collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn row(&self, id: usize) -> Result<&Row> {
        self.rows.get(&id).ok_or_else(|| DbError::RowNotFound {
            table: self.name().to_string(),
            row: id,
        })
    }

    fn replace(&mut self, id: usize, property: usize, value: Value) -> Result<Value> {
        let table = self.descriptor.name.clone();
        let row = self
            .rows
            .get_mut(&id)
            .ok_or_else(|| DbError::RowNotFound { table: table.clone(), row: id })?;
        let slot = row
            .get_mut(property)
            .ok_or(DbError::PropertyOutOfRange { table, index: property })?;
        Ok(std::mem::replace(slot, value))
    }

    fn check_uniqueness(&self, key: &Value, id: usize) -> Result<()> {
        match self.primary_index.get(key) {
            Some(owner) if *owner != id => Err(DbError::ConstraintViolation(format!(
                "Unique constraint violation: '{}' already contains primary key {}",
                self.name(),
                key
            ))),
            _ => Ok(()),
        }
    }

    fn validate(&self, property: usize, value: &Value) -> Result<()> {
        let descriptor = self.descriptor.properties().get(property).ok_or_else(|| {
            DbError::PropertyOutOfRange {
                table: self.name().to_string(),
                index: property,
            }
        })?;

        if value.is_null() {
            if !descriptor.optional {
                return Err(DbError::ConstraintViolation(format!(
                    "Property '{}.{}' cannot be NULL",
                    self.name(),
                    descriptor.name
                )));
            }
            return Ok(());
        }

        let compatible = match (&descriptor.kind, value) {
            (PropertyKind::Primitive(kind), value) => matches!(
                (kind, value),
                (PrimitiveKind::Bool, Value::Boolean(_))
                    | (PrimitiveKind::Int, Value::Integer(_))
                    | (PrimitiveKind::Float, Value::Float(_))
                    | (PrimitiveKind::Double, Value::Double(_))
                    | (PrimitiveKind::String, Value::Text(_))
                    | (PrimitiveKind::Binary, Value::Binary(_))
                    | (PrimitiveKind::Timestamp, Value::Timestamp(_))
            ),
            (PropertyKind::Object(_), Value::Link(handle)) => {
                self.link_target(property) == Some(handle.table)
            }
            (PropertyKind::List(_), Value::LinkList(handles)) => {
                let target = self.link_target(property);
                handles.iter().all(|h| Some(h.table) == target)
            }
            _ => false,
        };

        if !compatible {
            return Err(DbError::TypeMismatch(format!(
                "Property '{}.{}' expects {}, got {}",
                self.name(),
                descriptor.name,
                descriptor.kind,
                value.type_name()
            )));
        }
        Ok(())
    }
}
