pub mod error;
pub mod types;
pub mod value;

pub use error::{DbError, Result};
pub use types::{ObjectTypeDescriptor, PrimitiveKind, PropertyDescriptor, PropertyKind, RowHandle, Schema};
pub use value::Value;
