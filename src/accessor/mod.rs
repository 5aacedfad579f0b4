//! Accessor layer: marshals host values into schema-typed rows and back.

pub mod coercion;
pub mod collection;
pub mod config;
pub mod context;
pub mod defaults;
pub mod error;
mod identity;
pub mod notify;

pub use coercion::CoercionTable;
pub use collection::{CollectionAdapter, Element};
pub use config::AccessorConfig;
pub use context::{AccessorContext, RealizeMode};
pub use defaults::DefaultValues;
pub use error::{AccessorError, AccessorResult};
pub use notify::{ChangeEvent, ChangeLog, ChangeNotifier, ChangeObserver, ChangeScope};
