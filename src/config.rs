use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub cache_ttl: Duration,
    pub export_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                Error::Config("DATABASE_URL must be set to the placement MySQL database".to_string())
            })?;

        let cache_ttl = match lookup("PLACEMENT_CACHE_TTL_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!(
                    "PLACEMENT_CACHE_TTL_SECS must be a whole number of seconds, got {raw:?}"
                ))
            })?,
            None => DEFAULT_CACHE_TTL_SECS,
        };

        let export_dir = lookup("PLACEMENT_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            database_url,
            cache_ttl: Duration::from_secs(cache_ttl),
            export_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_values_missing() {
        let config = Config::from_lookup(lookup_from(&[(
            "DATABASE_URL",
            "mysql://reader@localhost/placement_app",
        )]))
        .unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(600));
        assert_eq!(config.export_dir, PathBuf::from("."));
    }

    #[test]
    fn missing_database_url_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(message) if message.contains("DATABASE_URL")));
    }

    #[test]
    fn invalid_ttl_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "mysql://reader@localhost/placement_app"),
            ("PLACEMENT_CACHE_TTL_SECS", "ten minutes"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(message) if message.contains("PLACEMENT_CACHE_TTL_SECS")));
    }

    #[test]
    fn overrides_are_read() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "mysql://reader@localhost/placement_app"),
            ("PLACEMENT_CACHE_TTL_SECS", "30"),
            ("PLACEMENT_EXPORT_DIR", "/tmp/exports"),
        ]))
        .unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(30));
        assert_eq!(config.export_dir, PathBuf::from("/tmp/exports"));
    }
}
