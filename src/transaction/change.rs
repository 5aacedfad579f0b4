// ============================================================================
// Transaction Change Tracking
// ============================================================================
//
// Each Change records enough to reverse one storage mutation. The log is
// discarded on COMMIT and replayed newest-first on ROLLBACK.
//
// ============================================================================

use crate::core::{RowHandle, Value};

/// A single reversible change in a write transaction
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// A fresh row was allocated
    AllocateRow { row: RowHandle },

    /// A property was overwritten; `old` is the value it held before
    WriteValue {
        row: RowHandle,
        property: usize,
        old: Value,
    },
}
