//! Process settings from environment variables (`.env` is loaded by the binary first).

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Which row store backs the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            _ => Err(ConfigError::Setting {
                name: "GATEWAY_STORE",
                message: format!("unknown store '{}' (expected postgres or memory)", s),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    /// Schema the entity tables live in.
    pub db_schema: String,
    pub max_connections: u32,
    pub entity_map_path: Option<PathBuf>,
    pub strict_entities: bool,
    pub max_page_size: u32,
    pub body_limit: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable lookup; unset variables take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let store = match get("GATEWAY_STORE") {
            Some(s) => s.parse()?,
            None => StoreKind::Postgres,
        };
        let database_url = get("DATABASE_URL");
        if store == StoreKind::Postgres && database_url.is_none() {
            return Err(ConfigError::Setting {
                name: "DATABASE_URL",
                message: "required when GATEWAY_STORE is postgres".into(),
            });
        }
        let db_schema = get("GATEWAY_DB_SCHEMA").unwrap_or_else(|| "public".into());
        if !crate::config::is_identifier(&db_schema) {
            return Err(ConfigError::Setting {
                name: "GATEWAY_DB_SCHEMA",
                message: format!("'{}' is not an identifier", db_schema),
            });
        }

        let max_page_size = parse_number("GATEWAY_MAX_PAGE_SIZE", get("GATEWAY_MAX_PAGE_SIZE"), 1000u32)?;
        if max_page_size == 0 {
            return Err(ConfigError::Setting {
                name: "GATEWAY_MAX_PAGE_SIZE",
                message: "must be at least 1".into(),
            });
        }

        Ok(Settings {
            store,
            database_url,
            host: get("GATEWAY_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_number("GATEWAY_PORT", get("GATEWAY_PORT"), 3000u16)?,
            db_schema,
            max_connections: parse_number("GATEWAY_MAX_CONNECTIONS", get("GATEWAY_MAX_CONNECTIONS"), 5u32)?,
            entity_map_path: get("GATEWAY_ENTITY_MAP").map(PathBuf::from),
            strict_entities: parse_bool("GATEWAY_STRICT_ENTITIES", get("GATEWAY_STRICT_ENTITIES"))?,
            max_page_size,
            body_limit: parse_number("GATEWAY_BODY_LIMIT", get("GATEWAY_BODY_LIMIT"), 1024 * 1024usize)?,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Setting {
                name: "GATEWAY_HOST",
                message: format!("invalid socket address: {}", e),
            })
    }
}

fn parse_number<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(s) => s.parse().map_err(|e: T::Err| ConfigError::Setting {
            name,
            message: format!("'{}': {}", s, e),
        }),
        None => Ok(default),
    }
}

fn parse_bool(name: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    match raw.as_deref().map(str::to_lowercase).as_deref() {
        None => Ok(false),
        Some("1") | Some("true") | Some("yes") | Some("on") => Ok(true),
        Some("0") | Some("false") | Some("no") | Some("off") => Ok(false),
        Some(other) => Err(ConfigError::Setting {
            name,
            message: format!("'{}' is not a boolean", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_with_database_url() {
        let s = settings(&[("DATABASE_URL", "postgres://localhost/gateway")]).unwrap();
        assert_eq!(s.store, StoreKind::Postgres);
        assert_eq!(s.port, 3000);
        assert_eq!(s.db_schema, "public");
        assert_eq!(s.max_page_size, 1000);
        assert!(!s.strict_entities);
        assert!(s.entity_map_path.is_none());
        assert_eq!(s.socket_addr().unwrap().port(), 3000);
    }

    #[test]
    fn postgres_requires_database_url() {
        let err = settings(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::Setting { name: "DATABASE_URL", .. }));
    }

    #[test]
    fn memory_store_needs_no_database() {
        let s = settings(&[
            ("GATEWAY_STORE", "memory"),
            ("GATEWAY_PORT", "8088"),
            ("GATEWAY_STRICT_ENTITIES", "true"),
        ])
        .unwrap();
        assert_eq!(s.store, StoreKind::Memory);
        assert_eq!(s.port, 8088);
        assert!(s.strict_entities);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(settings(&[("GATEWAY_STORE", "sqlite")]).is_err());
        assert!(settings(&[("GATEWAY_STORE", "memory"), ("GATEWAY_PORT", "eighty")]).is_err());
        assert!(settings(&[("GATEWAY_STORE", "memory"), ("GATEWAY_STRICT_ENTITIES", "maybe")]).is_err());
        assert!(settings(&[("GATEWAY_STORE", "memory"), ("GATEWAY_DB_SCHEMA", "a.b")]).is_err());
        assert!(settings(&[("GATEWAY_STORE", "memory"), ("GATEWAY_MAX_PAGE_SIZE", "0")]).is_err());
    }
}
