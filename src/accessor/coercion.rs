//! Type coercion table
//!
//! One `to_*` / `from_*` pair per storage primitive. `to_*` answers `None`
//! when the host value cannot be coerced; [`CoercionTable::to_storage`]
//! turns that into a `TypeMismatch` naming the property. `from_*` never
//! fails for a value of its own kind.

use super::config::AccessorConfig;
use super::error::{AccessorError, AccessorResult};
use crate::core::{PrimitiveKind, PropertyDescriptor, PropertyKind, RowHandle, Value};
use crate::dynamic::{Dynamic, DynamicValue};
use chrono::{DateTime, Utc};

// 2^63 as f64; every double in [-2^63, 2^63) fits an i64
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

pub struct CoercionTable<'a> {
    config: &'a AccessorConfig,
}

impl<'a> CoercionTable<'a> {
    pub fn new(config: &'a AccessorConfig) -> Self {
        Self { config }
    }

    pub fn to_bool(&self, value: &dyn DynamicValue) -> Option<bool> {
        value.as_bool()
    }

    pub fn to_long(&self, value: &dyn DynamicValue) -> Option<i64> {
        if let Some(i) = value.as_i64() {
            return Some(i);
        }
        let d = value.as_f64()?;
        if !d.is_finite() || d < -I64_BOUND || d >= I64_BOUND {
            return None;
        }
        if d.fract() == 0.0 || self.config.lossy_integer_coercion {
            Some(d.trunc() as i64)
        } else {
            None
        }
    }

    pub fn to_double(&self, value: &dyn DynamicValue) -> Option<f64> {
        value.as_f64().or_else(|| value.as_i64().map(|i| i as f64))
    }

    pub fn to_float(&self, value: &dyn DynamicValue) -> Option<f32> {
        let d = self.to_double(value)?;
        if d.is_finite() && d.abs() > f64::from(f32::MAX) {
            return None;
        }
        Some(d as f32)
    }

    pub fn to_binary(&self, value: &dyn DynamicValue) -> Option<Vec<u8>> {
        value.as_bytes().map(<[u8]>::to_vec)
    }

    pub fn to_string(&self, value: &dyn DynamicValue) -> Option<String> {
        value.as_str().map(str::to_string)
    }

    pub fn to_timestamp(&self, value: &dyn DynamicValue) -> Option<DateTime<Utc>> {
        if let Some(t) = value.as_timestamp() {
            return Some(t);
        }
        if !self.config.parse_timestamp_strings {
            return None;
        }
        let text = value.as_str()?;
        DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn to_mixed(&self, value: &dyn DynamicValue) -> AccessorResult<Value> {
        Err(AccessorError::UnsupportedConversion(format!(
            "'Any' type is unsupported (value {})",
            value.describe()
        )))
    }

    /// Coerces host input for a primitive property of `object_type`.
    ///
    /// Null is accepted only for optional properties. Link kinds are not
    /// handled here; they need the identity resolver.
    pub fn to_storage(
        &self,
        object_type: &str,
        property: &PropertyDescriptor,
        value: &dyn DynamicValue,
    ) -> AccessorResult<Value> {
        let kind = match &property.kind {
            PropertyKind::Primitive(kind) => *kind,
            other => {
                return Err(AccessorError::UnsupportedConversion(format!(
                    "'{}.{}' is a {} property, not a primitive",
                    object_type, property.name, other
                )));
            }
        };

        if kind == PrimitiveKind::Any {
            return self.to_mixed(value);
        }

        if value.is_null() {
            return if property.optional {
                Ok(Value::Null)
            } else {
                Err(AccessorError::type_mismatch(object_type, &property.name, kind, "null"))
            };
        }

        let coerced = match kind {
            PrimitiveKind::Bool => self.to_bool(value).map(Value::Boolean),
            PrimitiveKind::Int => self.to_long(value).map(Value::Integer),
            PrimitiveKind::Float => self.to_float(value).map(Value::Float),
            PrimitiveKind::Double => self.to_double(value).map(Value::Double),
            PrimitiveKind::String => self.to_string(value).map(Value::Text),
            PrimitiveKind::Binary => self.to_binary(value).map(Value::Binary),
            PrimitiveKind::Timestamp => self.to_timestamp(value).map(Value::Timestamp),
            PrimitiveKind::Any => return self.to_mixed(value),
        };

        coerced.ok_or_else(|| {
            AccessorError::type_mismatch(object_type, &property.name, kind, value.describe())
        })
    }
}

pub fn from_bool(v: bool) -> Dynamic {
    Dynamic::Bool(v)
}

pub fn from_long(v: i64) -> Dynamic {
    Dynamic::Int(v)
}

pub fn from_double(v: f64) -> Dynamic {
    Dynamic::Double(v)
}

pub fn from_float(v: f32) -> Dynamic {
    Dynamic::Float(v)
}

pub fn from_string(v: String) -> Dynamic {
    Dynamic::String(v)
}

pub fn from_binary(v: Vec<u8>) -> Dynamic {
    Dynamic::Binary(v)
}

pub fn from_timestamp(v: DateTime<Utc>) -> Dynamic {
    Dynamic::Timestamp(v)
}

pub fn from_object(v: RowHandle) -> Dynamic {
    Dynamic::Object(v)
}

/// Wraps a raw stored value. Link lists come out materialized; the
/// accessor hands out lazy [`Dynamic::List`] values instead when reading
/// list properties.
pub fn from_storage(value: Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::Null,
        Value::Boolean(b) => from_bool(b),
        Value::Integer(i) => from_long(i),
        Value::Float(f) => from_float(f),
        Value::Double(d) => from_double(d),
        Value::Text(s) => from_string(s),
        Value::Binary(b) => from_binary(b),
        Value::Timestamp(t) => from_timestamp(t),
        Value::Link(handle) => from_object(handle),
        Value::LinkList(handles) => Dynamic::Array(handles.into_iter().map(from_object).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prop(kind: PrimitiveKind) -> PropertyDescriptor {
        PropertyDescriptor::new("p", kind)
    }

    #[test]
    fn test_integer_coercion() {
        let config = AccessorConfig::default();
        let table = CoercionTable::new(&config);
        assert_eq!(table.to_long(&Dynamic::Int(5)), Some(5));
        assert_eq!(table.to_long(&Dynamic::Double(5.0)), Some(5));
        assert_eq!(table.to_long(&Dynamic::Double(5.5)), None);
        assert_eq!(table.to_long(&Dynamic::Double(f64::NAN)), None);
        assert_eq!(table.to_long(&Dynamic::Double(1e30)), None);
        assert_eq!(table.to_long(&Dynamic::from("5")), None);

        let lossy = AccessorConfig::default().lossy_integer_coercion(true);
        assert_eq!(CoercionTable::new(&lossy).to_long(&Dynamic::Double(5.9)), Some(5));
    }

    #[test]
    fn test_floating_coercion() {
        let config = AccessorConfig::default();
        let table = CoercionTable::new(&config);
        assert_eq!(table.to_double(&Dynamic::Int(2)), Some(2.0));
        assert_eq!(table.to_float(&Dynamic::Double(0.5)), Some(0.5));
        assert_eq!(table.to_float(&Dynamic::Double(1e300)), None);
        assert_eq!(table.to_double(&Dynamic::Bool(true)), None);
    }

    #[test]
    fn test_timestamp_from_text() {
        let config = AccessorConfig::default();
        let table = CoercionTable::new(&config);
        let parsed = table
            .to_timestamp(&Dynamic::from("2024-03-01T10:00:00+02:00"))
            .unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-01T08:00:00+00:00");
        assert_eq!(table.to_timestamp(&Dynamic::from("yesterday")), None);

        let strict = AccessorConfig::default().parse_timestamp_strings(false);
        assert_eq!(
            CoercionTable::new(&strict).to_timestamp(&Dynamic::from("2024-03-01T10:00:00Z")),
            None
        );
    }

    #[test]
    fn test_to_storage_rejects_shape_mismatch() {
        let config = AccessorConfig::default();
        let table = CoercionTable::new(&config);
        let err = table
            .to_storage("Person", &prop(PrimitiveKind::Int), &json!({"nested": 1}))
            .unwrap_err();
        match err {
            AccessorError::TypeMismatch { target, expected, .. } => {
                assert_eq!(target, "Person.p");
                assert_eq!(expected, "int");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_null_only_for_optional() {
        let config = AccessorConfig::default();
        let table = CoercionTable::new(&config);
        assert!(matches!(
            table.to_storage("T", &prop(PrimitiveKind::String), &Dynamic::Null),
            Err(AccessorError::TypeMismatch { .. })
        ));
        assert_eq!(
            table
                .to_storage("T", &prop(PrimitiveKind::String).optional(), &Dynamic::Null)
                .unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_any_is_unsupported() {
        let config = AccessorConfig::default();
        let table = CoercionTable::new(&config);
        let err = table
            .to_storage("T", &prop(PrimitiveKind::Any), &Dynamic::Int(1))
            .unwrap_err();
        assert!(matches!(err, AccessorError::UnsupportedConversion(_)));
    }

    #[test]
    fn test_from_storage_is_total() {
        assert_eq!(from_storage(Value::Integer(3)), Dynamic::Int(3));
        assert_eq!(from_storage(Value::Null), Dynamic::Null);
        let handle = RowHandle::new(0, 1);
        assert_eq!(from_storage(Value::Link(handle)), Dynamic::Object(handle));
        assert_eq!(
            from_storage(Value::LinkList(vec![handle])),
            Dynamic::Array(vec![Dynamic::Object(handle)])
        );
    }
}
