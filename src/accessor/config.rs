/// Accessor behaviour knobs
///
/// Defaults follow the strict reading of every coercion: no lossy numeric
/// narrowing, exact-length positional input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorConfig {
    /// Accept non-integral doubles for int properties by truncation
    pub lossy_integer_coercion: bool,

    /// Accept RFC 3339 text for timestamp properties
    pub parse_timestamp_strings: bool,

    /// Array-like object input must list exactly one value per property
    pub strict_positional_input: bool,
}

impl AccessorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow truncating doubles into int properties
    pub fn lossy_integer_coercion(mut self, enabled: bool) -> Self {
        self.lossy_integer_coercion = enabled;
        self
    }

    /// Allow RFC 3339 strings for timestamp properties
    pub fn parse_timestamp_strings(mut self, enabled: bool) -> Self {
        self.parse_timestamp_strings = enabled;
        self
    }

    /// Require positional input to cover every property
    pub fn strict_positional_input(mut self, enabled: bool) -> Self {
        self.strict_positional_input = enabled;
        self
    }
}

impl Default for AccessorConfig {
    fn default() -> Self {
        Self {
            lossy_integer_coercion: false,
            parse_timestamp_strings: true,
            strict_positional_input: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = AccessorConfig::new()
            .lossy_integer_coercion(true)
            .strict_positional_input(false);
        assert!(config.lossy_integer_coercion);
        assert!(config.parse_timestamp_strings);
        assert!(!config.strict_positional_input);
    }
}
