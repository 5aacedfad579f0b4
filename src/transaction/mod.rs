// ============================================================================
// Transaction Module
// ============================================================================
//
// Undo log backing the write-transaction boundary of the in-memory engine.
// The accessor itself makes no atomicity promise: callers that need one
// wrap their writes in begin/commit/rollback.
//
// ============================================================================

pub mod change;

pub use change::Change;
