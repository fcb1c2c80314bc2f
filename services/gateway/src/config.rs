use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 4000);

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    /// Deadline for every call into the document store.
    pub store_timeout_ms: u64,
    /// JSON world table `[{id, name, datacenter}]`. Empty table when unset.
    pub worlds_path: Option<PathBuf>,
    /// Store snapshot file loaded at startup and written on shutdown.
    pub data_path: Option<PathBuf>,
    pub upload_limit_bytes: usize,
    /// `(source name, API key)` pairs registered at startup.
    pub trusted_sources: Vec<(String, String)>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(DEFAULT_BIND_ADDR),
            store_timeout_ms: 5000,
            worlds_path: None,
            data_path: None,
            upload_limit_bytes: 1024 * 1024,
            trusted_sources: Vec::new(),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: lookup("MARKET_BIND_ADDR")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.bind_addr),
            store_timeout_ms: lookup("MARKET_STORE_TIMEOUT_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.store_timeout_ms),
            worlds_path: lookup("MARKET_WORLDS_PATH")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            data_path: lookup("MARKET_DATA_PATH")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            upload_limit_bytes: lookup("MARKET_UPLOAD_LIMIT_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.upload_limit_bytes),
            trusted_sources: lookup("MARKET_TRUSTED_SOURCES")
                .map(|s| parse_sources(&s))
                .unwrap_or_default(),
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

/// `"Client A=key1,Client B=key2"`. Pairs without a name or key are skipped.
fn parse_sources(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| {
            let (name, key) = pair.split_once('=')?;
            let (name, key) = (name.trim(), key.trim());
            (!name.is_empty() && !key.is_empty()).then(|| (name.to_string(), key.to_string()))
        })
        .collect()
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
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = GatewayConfig::from_lookup(lookup(&[]));
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.bind_addr.port(), 4000);
        assert_eq!(config.store_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_overrides() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("MARKET_BIND_ADDR", "127.0.0.1:9000"),
            ("MARKET_STORE_TIMEOUT_MS", "250"),
            ("MARKET_WORLDS_PATH", "/etc/market/worlds.json"),
            ("MARKET_UPLOAD_LIMIT_BYTES", "2048"),
        ]));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.store_timeout_ms, 250);
        assert_eq!(config.worlds_path, Some(PathBuf::from("/etc/market/worlds.json")));
        assert_eq!(config.data_path, None);
        assert_eq!(config.upload_limit_bytes, 2048);
    }

    #[test]
    fn test_trusted_sources() {
        let config = GatewayConfig::from_lookup(lookup(&[(
            "MARKET_TRUSTED_SOURCES",
            "Client A=abc123, Client B = def456,broken,=nokey",
        )]));
        assert_eq!(
            config.trusted_sources,
            vec![
                ("Client A".to_string(), "abc123".to_string()),
                ("Client B".to_string(), "def456".to_string()),
            ]
        );
    }

    #[test]
    fn test_garbage_falls_back() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("MARKET_BIND_ADDR", "not an address"),
            ("MARKET_STORE_TIMEOUT_MS", "-1"),
        ]));
        assert_eq!(config.bind_addr, GatewayConfig::default().bind_addr);
        assert_eq!(config.store_timeout_ms, 5000);
    }
}
