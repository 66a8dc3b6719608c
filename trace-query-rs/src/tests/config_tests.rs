//! Tests for configuration loading

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::{
        ConfigProviderExt, GenerationConfig, MemoryConfigProvider, MetadataConfig, ServiceConfig,
        TranslatorConfig, DEFAULT_GENERATE_TIMEOUT_MS, DEFAULT_HEALTH_TIMEOUT_MS,
    };
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults_from_empty_provider() {
        let config = TranslatorConfig::from_provider(&MemoryConfigProvider::new()).unwrap();

        assert_eq!(config.metadata.base_url, "http://localhost:16686/api");
        assert_eq!(config.metadata.timeout(), Duration::from_secs(10));
        assert_eq!(config.generation.base_url, "http://localhost:11434");
        assert_eq!(config.generation.health_path, "/api/tags");
        assert_eq!(config.generation.generate_path, "/api/generate");
        assert_eq!(config.generation.model, "llama3.2");
        assert_eq!(config.generation.health_timeout(), Duration::from_millis(DEFAULT_HEALTH_TIMEOUT_MS));
        assert_eq!(
            config.generation.generate_timeout(),
            Duration::from_millis(DEFAULT_GENERATE_TIMEOUT_MS)
        );
        assert!(!config.route_validation);
    }

    #[test]
    fn test_overrides() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("metadata_base_url", "http://jaeger:16686/api");
        provider.set("metadata_timeout_seconds", 3);
        provider.set("generation_base_url", "http://gpu-box:11434");
        provider.set("generation_model", "mistral");
        provider.set("generation_health_timeout_ms", 1500);
        provider.set("route_validation", "yes");

        let config = TranslatorConfig::from_provider(&provider).unwrap();

        assert_eq!(config.metadata.base_url, "http://jaeger:16686/api");
        assert_eq!(config.metadata.timeout_seconds, 3);
        assert_eq!(config.generation.base_url, "http://gpu-box:11434");
        assert_eq!(config.generation.model, "mistral");
        assert_eq!(config.generation.health_timeout_ms, 1500);
        assert_eq!(config.generation.generate_timeout_ms, DEFAULT_GENERATE_TIMEOUT_MS);
        assert!(config.route_validation);
    }

    #[test]
    fn test_unparseable_values_are_reported() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("generation_health_timeout_ms", "abc");

        let err = TranslatorConfig::from_provider(&provider).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("generation_health_timeout_ms"));

        let mut provider = MemoryConfigProvider::new();
        provider.set("route_validation", "maybe");
        assert!(TranslatorConfig::from_provider(&provider).is_err());
    }

    #[test]
    fn test_unset_keys_use_defaults() {
        let provider = MemoryConfigProvider::new();
        assert_eq!(provider.get_int_or("generation_health_timeout_ms", 42).unwrap(), 42);
        assert!(provider.get_bool_or("route_validation", true).unwrap());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("generation_health_timeout_ms", 0);

        let err = TranslatorConfig::from_provider(&provider).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(!err.is_transient());

        let mut provider = MemoryConfigProvider::new();
        provider.set("metadata_timeout_seconds", -4);
        assert!(MetadataConfig::from_provider(&provider).is_err());
    }

    #[test]
    fn test_validation_rules() {
        assert!(MetadataConfig::default().validate().is_ok());
        assert!(GenerationConfig::default().validate().is_ok());

        let empty_url = MetadataConfig {
            base_url: String::new(),
            ..MetadataConfig::default()
        };
        assert!(empty_url.validate().is_err());

        let blank_model = GenerationConfig {
            model: "  ".to_string(),
            ..GenerationConfig::default()
        };
        assert!(blank_model.validate().is_err());
    }
}
