use crate::core::{Result, RowHandle, Value};

/// Storage engine the accessor writes through.
///
/// Property indices are positions in the schema's declared property order
/// and `table` is the object type's position in the schema. The engine owns
/// rows; the accessor only borrows handles for the duration of one call.
pub trait StorageEngine: Send + Sync {
    /// Read the raw typed value of one property
    fn read(&self, row: RowHandle, property: usize) -> Result<Value>;

    /// Overwrite one property, enforcing the column type and key uniqueness
    fn write(&mut self, row: RowHandle, property: usize, value: Value) -> Result<()>;

    /// Allocate a row holding zero values for every property
    fn allocate_row(&mut self, table: usize) -> Result<RowHandle>;

    /// Look up the row owning a primary-key value
    fn find_by_primary_key(&self, table: usize, key: &Value) -> Result<Option<RowHandle>>;

    /// Check that a handle still refers to a live row
    fn contains_row(&self, row: RowHandle) -> bool;

    /// All live rows of a table, in allocation order
    fn rows(&self, table: usize) -> Result<Vec<RowHandle>>;

    /// Get table row count
    fn row_count(&self, table: usize) -> Result<usize>;
}

/// Engine with a write-transaction boundary.
///
/// `rollback` must leave every row exactly as it was at `begin`, including
/// rows allocated in between, which disappear.
pub trait TransactionalEngine: StorageEngine {
    fn begin(&mut self) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    fn in_transaction(&self) -> bool;
}
