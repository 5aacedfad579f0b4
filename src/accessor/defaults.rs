use crate::core::Schema;
use crate::dynamic::Dynamic;
use std::collections::HashMap;

/// Per-type default values consulted when a fresh object omits a property.
#[derive(Debug, Clone, Default)]
pub struct DefaultValues {
    values: HashMap<String, HashMap<String, Dynamic>>,
}

impl DefaultValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every default declared on the schema's property descriptors.
    pub fn from_schema(schema: &Schema) -> Self {
        let mut defaults = Self::new();
        for object_type in schema.object_types() {
            for property in object_type.properties() {
                if let Some(value) = &property.default {
                    defaults.register(&object_type.name, &property.name, value.clone());
                }
            }
        }
        defaults
    }

    /// Registers or replaces a default, builder style.
    pub fn with_default(
        mut self,
        object_type: &str,
        property: &str,
        value: impl Into<Dynamic>,
    ) -> Self {
        self.register(object_type, property, value.into());
        self
    }

    pub fn register(&mut self, object_type: &str, property: &str, value: Dynamic) {
        self.values
            .entry(object_type.to_string())
            .or_default()
            .insert(property.to_string(), value);
    }

    pub fn default_for(&self, object_type: &str, property: &str) -> Option<&Dynamic> {
        self.values.get(object_type)?.get(property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ObjectTypeDescriptor, PrimitiveKind, PropertyDescriptor};

    #[test]
    fn test_defaults_from_schema_and_overrides() {
        let schema = Schema::new(vec![ObjectTypeDescriptor::new(
            "Settings",
            vec![
                PropertyDescriptor::new("theme", PrimitiveKind::String).default_value("dark"),
                PropertyDescriptor::new("volume", PrimitiveKind::Int),
            ],
        )])
        .unwrap();

        let defaults = DefaultValues::from_schema(&schema).with_default("Settings", "volume", 7i64);
        assert_eq!(
            defaults.default_for("Settings", "theme"),
            Some(&Dynamic::from("dark"))
        );
        assert_eq!(defaults.default_for("Settings", "volume"), Some(&Dynamic::Int(7)));
        assert_eq!(defaults.default_for("Settings", "missing"), None);
        assert_eq!(defaults.default_for("Other", "theme"), None);
    }
}
