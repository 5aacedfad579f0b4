use super::{StorageEngine, Table, TransactionalEngine};
use crate::core::{DbError, Result, RowHandle, Schema, Value};
use crate::transaction::Change;
use log::{trace, warn};

/// Reference storage engine: one [`Table`] per object type of the schema.
///
/// Writes outside a transaction apply immediately. Between [`begin`] and
/// [`commit`] every mutation is also recorded in an undo log so that
/// [`rollback`] can put the tables back.
///
/// [`begin`]: InMemoryStorage::begin
/// [`commit`]: InMemoryStorage::commit
/// [`rollback`]: InMemoryStorage::rollback
#[derive(Debug, Clone)]
pub struct InMemoryStorage {
    tables: Vec<Table>,
    undo_log: Option<Vec<Change>>,
}

impl InMemoryStorage {
    pub fn new(schema: &Schema) -> Self {
        let tables = schema
            .object_types()
            .iter()
            .map(|descriptor| {
                let link_targets = descriptor
                    .properties()
                    .iter()
                    .map(|p| p.kind.target().and_then(|t| schema.type_index(t)))
                    .collect();
                Table::new(descriptor.clone(), link_targets)
            })
            .collect();
        Self {
            tables,
            undo_log: None,
        }
    }

    pub fn table(&self, index: usize) -> Result<&Table> {
        self.tables
            .get(index)
            .ok_or_else(|| DbError::TableNotFound(format!("#{}", index)))
    }

    fn table_mut(&mut self, index: usize) -> Result<&mut Table> {
        self.tables
            .get_mut(index)
            .ok_or_else(|| DbError::TableNotFound(format!("#{}", index)))
    }

    fn record(&mut self, change: Change) {
        if let Some(log) = self.undo_log.as_mut() {
            log.push(change);
        }
    }

    fn check_links(&self, value: &Value) -> Result<()> {
        let dangling = match value {
            Value::Link(handle) => (!self.contains_row(*handle)).then_some(*handle),
            Value::LinkList(handles) => handles.iter().copied().find(|h| !self.contains_row(*h)),
            _ => None,
        };
        match dangling {
            Some(handle) => Err(DbError::ConstraintViolation(format!(
                "link to missing row {}",
                handle
            ))),
            None => Ok(()),
        }
    }
}

impl StorageEngine for InMemoryStorage {
    fn read(&self, row: RowHandle, property: usize) -> Result<Value> {
        Ok(self.table(row.table)?.get(row.row, property)?.clone())
    }

    fn write(&mut self, row: RowHandle, property: usize, value: Value) -> Result<()> {
        self.check_links(&value)?;
        let old = self.table_mut(row.table)?.set(row.row, property, value)?;
        self.record(Change::WriteValue { row, property, old });
        Ok(())
    }

    fn allocate_row(&mut self, table: usize) -> Result<RowHandle> {
        let id = self.table_mut(table)?.allocate();
        let row = RowHandle::new(table, id);
        self.record(Change::AllocateRow { row });
        Ok(row)
    }

    fn find_by_primary_key(&self, table: usize, key: &Value) -> Result<Option<RowHandle>> {
        let table_ref = self.table(table)?;
        Ok(table_ref.find_by_key(key).map(|id| RowHandle::new(table, id)))
    }

    fn contains_row(&self, row: RowHandle) -> bool {
        self.tables
            .get(row.table)
            .is_some_and(|table| table.contains(row.row))
    }

    fn rows(&self, table: usize) -> Result<Vec<RowHandle>> {
        Ok(self
            .table(table)?
            .row_ids()
            .into_iter()
            .map(|id| RowHandle::new(table, id))
            .collect())
    }

    fn row_count(&self, table: usize) -> Result<usize> {
        Ok(self.table(table)?.row_count())
    }
}

impl TransactionalEngine for InMemoryStorage {
    fn begin(&mut self) -> Result<()> {
        if self.undo_log.is_some() {
            return Err(DbError::TransactionError(
                "a write transaction is already active".into(),
            ));
        }
        self.undo_log = Some(Vec::new());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let log = self
            .undo_log
            .take()
            .ok_or_else(|| DbError::TransactionError("no active transaction to commit".into()))?;
        trace!("commit: {} changes", log.len());
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        let log = self
            .undo_log
            .take()
            .ok_or_else(|| DbError::TransactionError("no active transaction to roll back".into()))?;
        warn!("rolling back {} changes", log.len());
        for change in log.into_iter().rev() {
            match change {
                Change::AllocateRow { row } => {
                    self.table_mut(row.table)?.remove(row.row);
                }
                Change::WriteValue { row, property, old } => {
                    self.table_mut(row.table)?.restore(row.row, property, old)?;
                }
            }
        }
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.undo_log.is_some()
    }
}
