//! Raw gateway config as read from the optional entity map file.

use serde::{Deserialize, Serialize};

/// Public entity name and the table it is served from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityConfig {
    pub path_segment: String,
    pub table: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub entities: Vec<EntityConfig>,
    /// Metadata tables without timestamp columns: never ordered or stamped.
    #[serde(default = "default_reference_tables")]
    pub reference_tables: Vec<String>,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default = "default_created_column")]
    pub created_column: String,
    #[serde(default = "default_updated_column")]
    pub updated_column: String,
}

const DEFAULT_ENTITIES: &[(&str, &str)] = &[
    ("suppliers", "suppliers"),
    ("assessments", "supplier_assessments"),
    ("initiatives", "ethical_sourcing_initiatives"),
    ("reports", "esg_reports"),
    ("risks", "risk_assessments"),
    ("alerts", "wildlife_alerts"),
    ("cases", "cases"),
    ("partners", "partners"),
    ("metrics", "esg_metrics"),
];

pub fn default_reference_tables() -> Vec<String> {
    ["spatial_ref_sys", "geometry_columns", "geography_columns"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn default_primary_key() -> String {
    "id".into()
}

pub fn default_created_column() -> String {
    "created_at".into()
}

pub fn default_updated_column() -> String {
    "updated_at".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            entities: DEFAULT_ENTITIES
                .iter()
                .map(|(path, table)| EntityConfig {
                    path_segment: path.to_string(),
                    table: table.to_string(),
                })
                .collect(),
            reference_tables: default_reference_tables(),
            primary_key: default_primary_key(),
            created_column: default_created_column(),
            updated_column: default_updated_column(),
        }
    }
}
