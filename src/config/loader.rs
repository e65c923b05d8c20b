//! Load the entity map from a JSON file, or fall back to the built-in map.

use crate::config::{validate, EntityMap, GatewayConfig};
use crate::error::ConfigError;
use std::path::Path;

/// Parse and validate gateway config from JSON text.
pub fn parse_config(text: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = serde_json::from_str(text).map_err(|e| ConfigError::Load(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

/// Read gateway config from `path`. Call once at startup.
pub async fn load_config_from_path(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse_config(&text)
}

/// Build the entity map: from `path` when given, else the built-in defaults.
pub async fn load_entity_map(path: Option<&Path>, strict: bool) -> Result<EntityMap, ConfigError> {
    let config = match path {
        Some(p) => {
            let config = load_config_from_path(p).await?;
            tracing::info!(path = %p.display(), entities = config.entities.len(), "entity map loaded");
            config
        }
        None => GatewayConfig::default(),
    };
    Ok(EntityMap::from_config(&config, strict))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_file_with_defaults() {
        let config = parse_config(
            r#"{ "entities": [ { "path_segment": "stories", "table": "impact_stories" } ] }"#,
        )
        .unwrap();
        assert_eq!(config.entities.len(), 1);
        assert_eq!(config.primary_key, "id");
        assert_eq!(config.created_column, "created_at");
        assert_eq!(config.updated_column, "updated_at");
        assert!(config.reference_tables.iter().any(|t| t == "geometry_columns"));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(parse_config("{ nope"), Err(ConfigError::Load(_))));
    }

    #[test]
    fn rejects_invalid_table_names() {
        let err = parse_config(
            r#"{ "entities": [ { "path_segment": "stories", "table": "public.stories" } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTable { .. }));
    }

    #[tokio::test]
    async fn missing_path_uses_builtin_map() {
        let map = load_entity_map(None, false).await.unwrap();
        assert_eq!(map.available().len(), 9);
        assert!(!map.strict);
    }
}
