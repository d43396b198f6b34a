//! Runtime configuration read from the environment.

use anyhow::{Context, Result};

const DEFAULT_ADDR: &str = "0.0.0.0:10666";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// `DORA_API_ADDR`
    pub bind_addr: String,
    /// `DATABASE_URL`, the DevLake MySQL database.
    pub database_url: String,
    /// `DATABASE_MAX_CONNECTIONS`
    pub max_connections: u32,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = lookup("DORA_API_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid DATABASE_MAX_CONNECTIONS '{raw}'"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            bind_addr,
            database_url,
            max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let cfg = ApiConfig::from_lookup(lookup(&[("DATABASE_URL", "mysql://devlake")])).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:10666");
        assert_eq!(cfg.database_url, "mysql://devlake");
        assert_eq!(cfg.max_connections, 5);
    }

    #[test]
    fn overrides_are_read() {
        let cfg = ApiConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "mysql://devlake"),
            ("DORA_API_ADDR", "127.0.0.1:9000"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.max_connections, 12);
    }

    #[test]
    fn database_url_is_required() {
        let err = ApiConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err.to_string(), "DATABASE_URL must be set");
    }

    #[test]
    fn bad_pool_size_is_reported() {
        let err = ApiConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "mysql://devlake"),
            ("DATABASE_MAX_CONNECTIONS", "lots"),
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid DATABASE_MAX_CONNECTIONS 'lots'");
    }
}
