use super::*;

#[test]
fn defaults_enable_cache_filters_and_branches() {
    let config = EngineConfig::default();

    assert!(!config.pretty);
    assert!(config.default_value_branches);
    assert!(config.cache.enabled);
    assert_eq!(
        config.filters,
        FilterConfig {
            allow_list: true,
            empty_in: true,
            deleted_terms: true,
        }
    );
}

#[test]
fn empty_document_is_the_default() {
    let config: EngineConfig = serde_json::from_str("{}").expect("parse");

    assert_eq!(config, EngineConfig::default());
}

#[test]
fn partial_sections_keep_remaining_defaults() {
    let config: EngineConfig = serde_json::from_str(
        r#"{ "pretty": true, "cache": {}, "filters": { "deleted_terms": false } }"#,
    )
    .expect("parse");

    assert!(config.pretty);
    assert!(config.cache.enabled);
    assert!(config.filters.allow_list);
    assert!(config.filters.empty_in);
    assert!(!config.filters.deleted_terms);
}

#[test]
fn config_survives_serialization() {
    let config = EngineConfig {
        pretty: true,
        default_value_branches: false,
        cache: CacheConfig { enabled: false },
        filters: FilterConfig {
            allow_list: false,
            ..FilterConfig::default()
        },
    };

    let json = serde_json::to_string(&config).expect("serialize");
    let parsed: EngineConfig = serde_json::from_str(&json).expect("parse");

    assert_eq!(parsed, config);
}
