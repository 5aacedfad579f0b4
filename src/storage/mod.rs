pub mod engine;
pub mod memory;
pub mod table;

pub use engine::{StorageEngine, TransactionalEngine};
pub use memory::InMemoryStorage;
pub use table::{Row, Table};
