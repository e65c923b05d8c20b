//! Resolved entity map: config validated and flattened for request-time lookup.

use crate::config::{is_identifier, GatewayConfig};
use crate::error::GatewayError;
use std::collections::{HashMap, HashSet};

/// Table an incoming entity name resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTable {
    pub entity: String,
    pub table: String,
    /// Reference tables carry no timestamp columns.
    pub reference: bool,
}

#[derive(Clone, Debug)]
pub struct EntityMap {
    /// Entity names in declaration order, as surfaced on routing errors.
    pub entity_names: Vec<String>,
    pub table_by_path: HashMap<String, String>,
    pub reference_tables: HashSet<String>,
    pub primary_key: String,
    pub created_column: String,
    pub updated_column: String,
    /// When set, entities missing from the map are rejected instead of used as table names.
    pub strict: bool,
}

impl EntityMap {
    pub fn from_config(config: &GatewayConfig, strict: bool) -> Self {
        EntityMap {
            entity_names: config.entities.iter().map(|e| e.path_segment.clone()).collect(),
            table_by_path: config
                .entities
                .iter()
                .map(|e| (e.path_segment.clone(), e.table.clone()))
                .collect(),
            reference_tables: config.reference_tables.iter().cloned().collect(),
            primary_key: config.primary_key.clone(),
            created_column: config.created_column.clone(),
            updated_column: config.updated_column.clone(),
            strict,
        }
    }

    pub fn available(&self) -> Vec<String> {
        self.entity_names.clone()
    }

    pub fn is_reference(&self, table: &str) -> bool {
        self.reference_tables.contains(table)
    }

    /// Map an entity name to its table. Unknown names pass through as the table name
    /// unless the map is strict; pass-through names must be plain identifiers.
    pub fn resolve(&self, entity: &str) -> Result<ResolvedTable, GatewayError> {
        let table = match self.table_by_path.get(entity) {
            Some(t) => t.clone(),
            None if self.strict => {
                return Err(GatewayError::Routing {
                    available: self.available(),
                })
            }
            None => {
                if !is_identifier(entity) {
                    return Err(GatewayError::Validation(format!(
                        "invalid entity name '{}'",
                        entity
                    )));
                }
                entity.to_string()
            }
        };
        Ok(ResolvedTable {
            entity: entity.to_string(),
            reference: self.is_reference(&table),
            table,
        })
    }
}

impl Default for EntityMap {
    fn default() -> Self {
        EntityMap::from_config(&GatewayConfig::default(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_entities_map_to_tables() {
        let map = EntityMap::default();
        let t = map.resolve("alerts").unwrap();
        assert_eq!(t.table, "wildlife_alerts");
        assert!(!t.reference);
        assert_eq!(map.resolve("metrics").unwrap().table, "esg_metrics");
        assert_eq!(map.resolve("suppliers").unwrap().table, "suppliers");
    }

    #[test]
    fn unknown_entity_falls_back_to_raw_name() {
        let map = EntityMap::default();
        let t = map.resolve("volunteers").unwrap();
        assert_eq!(t.table, "volunteers");
        assert_eq!(t.entity, "volunteers");
    }

    #[test]
    fn reference_tables_are_flagged() {
        let map = EntityMap::default();
        assert!(map.resolve("spatial_ref_sys").unwrap().reference);
    }

    #[test]
    fn fallback_rejects_non_identifiers() {
        let map = EntityMap::default();
        assert!(matches!(
            map.resolve("x\";drop"),
            Err(GatewayError::Validation(_))
        ));
    }

    #[test]
    fn strict_map_rejects_unknown_entities() {
        let map = EntityMap::from_config(&GatewayConfig::default(), true);
        match map.resolve("volunteers") {
            Err(GatewayError::Routing { available }) => {
                assert_eq!(available.len(), 9);
                assert_eq!(available[0], "suppliers");
            }
            other => panic!("expected routing error, got {:?}", other),
        }
        assert!(map.resolve("cases").is_ok());
    }
}
