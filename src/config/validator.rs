//! Config validation: identifiers and entity name uniqueness.

use crate::config::GatewayConfig;
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(IDENTIFIER_PATTERN).expect("identifier pattern compiles"))
}

/// True when `s` is a plain SQL identifier (letters, digits, underscore; no leading digit).
pub fn is_identifier(s: &str) -> bool {
    identifier_regex().is_match(s)
}

pub fn validate(config: &GatewayConfig) -> Result<(), ConfigError> {
    let mut path_segments = HashSet::new();
    for e in &config.entities {
        if e.path_segment.trim().is_empty() || e.path_segment.contains('/') {
            return Err(ConfigError::Validation(format!(
                "invalid entity name '{}'",
                e.path_segment
            )));
        }
        if !is_identifier(&e.table) {
            return Err(ConfigError::InvalidTable {
                entity: e.path_segment.clone(),
                table: e.table.clone(),
            });
        }
        if !path_segments.insert(e.path_segment.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate entity name '{}'",
                e.path_segment
            )));
        }
    }
    for (label, col) in [
        ("primary_key", &config.primary_key),
        ("created_column", &config.created_column),
        ("updated_column", &config.updated_column),
    ] {
        if !is_identifier(col) {
            return Err(ConfigError::Validation(format!("{} '{}' is not an identifier", label, col)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EntityConfig;

    #[test]
    fn identifiers() {
        assert!(is_identifier("wildlife_alerts"));
        assert!(is_identifier("_private2"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("alerts; drop table x"));
        assert!(!is_identifier("public.alerts"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn rejects_duplicate_entity_names() {
        let mut config = GatewayConfig::default();
        config.entities.push(EntityConfig {
            path_segment: "alerts".into(),
            table: "other_alerts".into(),
        });
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate entity name 'alerts'"));
    }

    #[test]
    fn rejects_non_identifier_table() {
        let mut config = GatewayConfig::default();
        config.entities[0].table = "bad-name".into();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidTable { .. })));
    }
}
