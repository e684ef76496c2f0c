// ⚙️ Configuration - environment with defaults, overridden by CLI flags
//
// TENDER_DB_PATH    SQLite file              (tenders.db)
// TENDER_BIND       HTTP listen address      (0.0.0.0:3000)
// TED_API_ENDPOINT  feed search endpoint     (TED v3.0)
// TENDER_PAGE_SIZE  rows per TED page        (10)

use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::paginate::DEFAULT_PAGE_SIZE;
use crate::ted::TED_V3_ENDPOINT;

pub const DEFAULT_DB_PATH: &str = "tenders.db";
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub bind: String,
    pub ted_endpoint: String,
    pub page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            bind: DEFAULT_BIND.to_string(),
            ted_endpoint: TED_V3_ENDPOINT.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from any key → value source; blank or unparsable values keep the default
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = AppConfig::default();

        let page_size = match get("TENDER_PAGE_SIZE").map(|v| v.trim().parse::<usize>()) {
            Some(Ok(size)) if size > 0 => size,
            Some(_) => {
                tracing::warn!("TENDER_PAGE_SIZE must be a positive integer, using {}", defaults.page_size);
                defaults.page_size
            }
            None => defaults.page_size,
        };

        AppConfig {
            db_path: get("TENDER_DB_PATH").map(PathBuf::from).unwrap_or(defaults.db_path),
            bind: get("TENDER_BIND").unwrap_or(defaults.bind),
            ted_endpoint: get("TED_API_ENDPOINT").unwrap_or(defaults.ted_endpoint),
            page_size,
        }
    }
}

/// Install the global subscriber; `RUST_LOG` wins over `default_level`
///
/// Safe to call more than once (later calls are ignored).
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]));

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.db_path, PathBuf::from("tenders.db"));
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("TENDER_DB_PATH", "/tmp/t.db"),
            ("TENDER_BIND", "127.0.0.1:8080"),
            ("TENDER_PAGE_SIZE", "25"),
        ]));

        assert_eq!(config.db_path, PathBuf::from("/tmp/t.db"));
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert_eq!(config.page_size, 25);
        assert_eq!(config.ted_endpoint, TED_V3_ENDPOINT);
    }

    #[test]
    fn test_bad_page_size_falls_back() {
        for bad in ["0", "ten", "-3", " "] {
            let config = AppConfig::from_lookup(lookup(&[("TENDER_PAGE_SIZE", bad)]));
            assert_eq!(config.page_size, DEFAULT_PAGE_SIZE, "value {:?}", bad);
        }
    }
}
