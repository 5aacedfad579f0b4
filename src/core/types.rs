use super::Value;
use crate::accessor::{AccessorError, AccessorResult};
use crate::dynamic::Dynamic;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Opaque reference to one stored row.
///
/// `table` is the object type's position in the [`Schema`], `row` the
/// engine-assigned row id. Handles are plain ids: they do not keep the row
/// alive and are only meaningful inside the transaction that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowHandle {
    pub table: usize,
    pub row: usize,
}

impl RowHandle {
    pub fn new(table: usize, row: usize) -> Self {
        Self { table, row }
    }
}

impl fmt::Display for RowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row#{}:{}", self.table, self.row)
    }
}

/// Storage primitives. One coercion pair exists per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    Bool,
    Int,
    Float,
    Double,
    String,
    Binary,
    Timestamp,
    Any,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Binary => "data",
            Self::Timestamp => "date",
            Self::Any => "any",
        };
        write!(f, "{}", name)
    }
}

/// Declared kind of a property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Primitive(PrimitiveKind),
    /// Link to a single object of the named type.
    Object(String),
    /// Ordered list of links to objects of the named type.
    List(String),
}

impl PropertyKind {
    pub fn object(target: impl Into<String>) -> Self {
        Self::Object(target.into())
    }

    pub fn list(target: impl Into<String>) -> Self {
        Self::List(target.into())
    }

    /// Name of the linked object type, if this is a link kind.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Primitive(_) => None,
            Self::Object(target) | Self::List(target) => Some(target),
        }
    }

    /// Value a freshly allocated row holds before anything is written.
    pub fn zero_value(&self, optional: bool) -> Value {
        match self {
            Self::List(_) => Value::LinkList(Vec::new()),
            Self::Object(_) => Value::Null,
            Self::Primitive(_) if optional => Value::Null,
            Self::Primitive(kind) => match kind {
                PrimitiveKind::Bool => Value::Boolean(false),
                PrimitiveKind::Int => Value::Integer(0),
                PrimitiveKind::Float => Value::Float(0.0),
                PrimitiveKind::Double => Value::Double(0.0),
                PrimitiveKind::String => Value::Text(String::new()),
                PrimitiveKind::Binary => Value::Binary(Vec::new()),
                PrimitiveKind::Timestamp => Value::Timestamp(DateTime::<Utc>::UNIX_EPOCH),
                PrimitiveKind::Any => Value::Null,
            },
        }
    }
}

impl From<PrimitiveKind> for PropertyKind {
    fn from(kind: PrimitiveKind) -> Self {
        Self::Primitive(kind)
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "{}", kind),
            Self::Object(target) => write!(f, "<{}>", target),
            Self::List(target) => write!(f, "list<{}>", target),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub kind: PropertyKind,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "plain_default")]
    pub default: Option<Dynamic>,
}

impl PropertyDescriptor {
    /// New required property. Single-object links are always optional.
    pub fn new(name: impl Into<String>, kind: impl Into<PropertyKind>) -> Self {
        let kind = kind.into();
        Self {
            name: name.into(),
            optional: matches!(kind, PropertyKind::Object(_)),
            kind,
            primary_key: false,
            default: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Dynamic>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// A fresh object must end up with a value for this property.
    pub fn is_required(&self) -> bool {
        !self.optional
            && matches!(self.kind, PropertyKind::Primitive(kind) if kind != PrimitiveKind::Any)
    }

    pub fn zero_value(&self) -> Value {
        self.kind.zero_value(self.optional)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectTypeDescriptor {
    pub name: String,
    pub properties: Vec<PropertyDescriptor>,
    #[serde(skip)]
    primary_key: Option<usize>,
}

impl ObjectTypeDescriptor {
    pub fn new(name: impl Into<String>, properties: Vec<PropertyDescriptor>) -> Self {
        let primary_key = properties.iter().position(|p| p.primary_key);
        Self {
            name: name.into(),
            properties,
            primary_key,
        }
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Descriptor at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is past the declared property count.
    pub fn property(&self, index: usize) -> &PropertyDescriptor {
        match self.properties.get(index) {
            Some(property) => property,
            None => panic!(
                "property index {} out of range for '{}' ({} properties)",
                index,
                self.name,
                self.properties.len()
            ),
        }
    }

    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }

    pub fn primary_key_index(&self) -> Option<usize> {
        self.primary_key
    }

    fn validate(&self, type_names: &HashSet<&str>) -> AccessorResult<()> {
        let mut seen = HashSet::new();
        for property in &self.properties {
            if !seen.insert(property.name.as_str()) {
                return Err(AccessorError::InvalidSchema(format!(
                    "'{}' declares property '{}' twice",
                    self.name, property.name
                )));
            }
            if let Some(target) = property.kind.target()
                && !type_names.contains(target)
            {
                return Err(AccessorError::InvalidSchema(format!(
                    "'{}.{}' links to unknown object type '{}'",
                    self.name, property.name, target
                )));
            }
            if matches!(property.kind, PropertyKind::List(_)) && property.optional {
                return Err(AccessorError::InvalidSchema(format!(
                    "list property '{}.{}' cannot be optional",
                    self.name, property.name
                )));
            }
        }

        let keys: Vec<&PropertyDescriptor> =
            self.properties.iter().filter(|p| p.primary_key).collect();
        if keys.len() > 1 {
            return Err(AccessorError::InvalidSchema(format!(
                "'{}' declares more than one primary key",
                self.name
            )));
        }
        if let Some(key) = keys.first()
            && !matches!(
                key.kind,
                PropertyKind::Primitive(PrimitiveKind::Int | PrimitiveKind::String)
            )
        {
            return Err(AccessorError::InvalidSchema(format!(
                "primary key '{}.{}' must be int or string, got {}",
                self.name, key.name, key.kind
            )));
        }
        Ok(())
    }
}

/// Defaults are written as plain JSON values in schema files.
mod plain_default {
    use crate::dynamic::Dynamic;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::{Map, Number, Value as JsonValue};

    pub fn serialize<S: Serializer>(value: &Option<Dynamic>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => to_json(value).map_err(S::Error::custom)?.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Dynamic>, D::Error> {
        Ok(Option::<JsonValue>::deserialize(deserializer)?.map(Dynamic::from))
    }

    fn to_json(value: &Dynamic) -> Result<JsonValue, String> {
        let number = |d: f64| {
            Number::from_f64(d)
                .map(JsonValue::Number)
                .ok_or_else(|| format!("non-finite default {}", d))
        };
        Ok(match value {
            Dynamic::Null => JsonValue::Null,
            Dynamic::Bool(b) => JsonValue::Bool(*b),
            Dynamic::Int(i) => JsonValue::from(*i),
            Dynamic::Float(f) => number(f64::from(*f))?,
            Dynamic::Double(d) => number(*d)?,
            Dynamic::String(s) => JsonValue::String(s.clone()),
            Dynamic::Binary(bytes) => JsonValue::from(bytes.clone()),
            Dynamic::Timestamp(t) => JsonValue::String(t.to_rfc3339()),
            Dynamic::Array(items) => JsonValue::Array(items.iter().map(to_json).collect::<Result<_, _>>()?),
            Dynamic::Dictionary(fields) => JsonValue::Object(
                fields
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), to_json(v)?)))
                    .collect::<Result<Map<_, _>, String>>()?,
            ),
            Dynamic::Object(_) | Dynamic::List(_) | Dynamic::Objects(_) => {
                return Err("stored rows can't be schema defaults".to_string());
            }
        })
    }
}

/// Immutable set of object types for one storage session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    types: Vec<ObjectTypeDescriptor>,
}

impl Schema {
    pub fn new(types: Vec<ObjectTypeDescriptor>) -> AccessorResult<Self> {
        let mut names = HashSet::new();
        for object_type in &types {
            if !names.insert(object_type.name.as_str()) {
                return Err(AccessorError::InvalidSchema(format!(
                    "object type '{}' declared twice",
                    object_type.name
                )));
            }
        }
        for object_type in &types {
            object_type.validate(&names)?;
        }

        // Deserialized descriptors skip the cached key position and may
        // leave single-object links marked required
        let types = types
            .into_iter()
            .map(|t| {
                let properties = t
                    .properties
                    .into_iter()
                    .map(|mut p| {
                        p.optional |= matches!(p.kind, PropertyKind::Object(_));
                        p
                    })
                    .collect();
                ObjectTypeDescriptor::new(t.name, properties)
            })
            .collect();
        Ok(Self { types })
    }

    /// Parses a JSON array of object type descriptors.
    pub fn from_json(json: &str) -> AccessorResult<Self> {
        let types: Vec<ObjectTypeDescriptor> = serde_json::from_str(json)
            .map_err(|e| AccessorError::InvalidSchema(e.to_string()))?;
        Self::new(types)
    }

    pub fn object_types(&self) -> &[ObjectTypeDescriptor] {
        &self.types
    }

    pub fn type_index(&self, name: &str) -> Option<usize> {
        self.types.iter().position(|t| t.name == name)
    }

    /// # Panics
    ///
    /// Panics if `index` does not name a type of this schema.
    pub fn object_type(&self, index: usize) -> &ObjectTypeDescriptor {
        match self.types.get(index) {
            Some(object_type) => object_type,
            None => panic!(
                "object type index {} out of range ({} types)",
                index,
                self.types.len()
            ),
        }
    }

    pub fn object_type_named(&self, name: &str) -> AccessorResult<(usize, &ObjectTypeDescriptor)> {
        self.type_index(name)
            .map(|idx| (idx, &self.types[idx]))
            .ok_or_else(|| AccessorError::UnknownObjectType(name.to_string()))
    }

    pub fn property_index(&self, object_type: &str, property: &str) -> AccessorResult<usize> {
        let (_, descriptor) = self.object_type_named(object_type)?;
        descriptor
            .property_index(property)
            .ok_or_else(|| AccessorError::UnknownProperty {
                object_type: object_type.to_string(),
                property: property.to_string(),
            })
    }
}
