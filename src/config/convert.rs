use serde::Deserialize;

/// Converter overrides, one comma-separated list of measurement kinds per
/// target type. Applied on top of the built-in registry at startup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub bool: Option<String>,
    pub int32: Option<String>,
    pub float32: Option<String>,
    pub float64: Option<String>,
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_comma_lists() {
        let config: ConvertConfig = toml::from_str(
            r#"
            bool = "presence,button"
            float32 = "temperature, humidity"
            "#,
        )
        .expect("valid toml");
        assert_eq!(config.bool.as_deref(), Some("presence,button"));
        assert_eq!(config.float32.as_deref(), Some("temperature, humidity"));
        assert!(config.text.is_none());
    }
}
