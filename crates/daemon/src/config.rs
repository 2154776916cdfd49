// Daemon configuration (environment variables, read once at startup)

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use switchboard_api_rpc::server::{DEFAULT_RPC_HOST, DEFAULT_RPC_PORT};
use switchboard_core::application::load_balancer::DEFAULT_LOAD_TIMEOUT;

pub const DEFAULT_DB_PATH: &str = "~/.switchboard/ledger.db";

/// Where agent load figures come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSourceKind {
    /// IN_PROGRESS rows in the assignment ledger
    Sqlite,
    /// Pseudo-random figures for demos
    Simulated,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub db_path: PathBuf,
    pub rpc_host: String,
    pub rpc_port: u16,
    pub load_source: LoadSourceKind,
    pub simulated_seed: Option<u64>,
    pub load_timeout: Duration,
    pub dispatch_enabled: bool,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path =
            lookup("SWITCHBOARD_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let db_path = PathBuf::from(shellexpand::tilde(&db_path).into_owned());

        let rpc_host =
            lookup("SWITCHBOARD_RPC_HOST").unwrap_or_else(|| DEFAULT_RPC_HOST.to_string());

        let rpc_port = match lookup("SWITCHBOARD_RPC_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("SWITCHBOARD_RPC_PORT is not a port: {}", raw))?,
            None => DEFAULT_RPC_PORT,
        };

        let load_source = match lookup("SWITCHBOARD_LOAD_SOURCE")
            .map(|s| s.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("sqlite") => LoadSourceKind::Sqlite,
            Some("simulated") => LoadSourceKind::Simulated,
            Some(other) => bail!(
                "SWITCHBOARD_LOAD_SOURCE must be 'sqlite' or 'simulated', got '{}'",
                other
            ),
        };

        let simulated_seed = lookup("SWITCHBOARD_SIMULATED_SEED")
            .map(|raw| {
                raw.parse::<u64>()
                    .with_context(|| format!("SWITCHBOARD_SIMULATED_SEED is not a u64: {}", raw))
            })
            .transpose()?;

        let load_timeout = match lookup("SWITCHBOARD_LOAD_TIMEOUT_MS") {
            Some(raw) => {
                let ms: u64 = raw.parse().with_context(|| {
                    format!("SWITCHBOARD_LOAD_TIMEOUT_MS is not a number: {}", raw)
                })?;
                if ms == 0 {
                    bail!("SWITCHBOARD_LOAD_TIMEOUT_MS must be positive");
                }
                Duration::from_millis(ms)
            }
            None => DEFAULT_LOAD_TIMEOUT,
        };

        let dispatch_enabled = match lookup("SWITCHBOARD_DISPATCH")
            .map(|s| s.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("on") | Some("true") | Some("1") => true,
            Some("off") | Some("false") | Some("0") => false,
            Some(other) => bail!("SWITCHBOARD_DISPATCH must be 'on' or 'off', got '{}'", other),
        };

        Ok(Self {
            db_path,
            rpc_host,
            rpc_port,
            load_source,
            simulated_seed,
            load_timeout,
            dispatch_enabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<DaemonConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DaemonConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();

        assert!(cfg.db_path.ends_with(".switchboard/ledger.db"));
        assert_eq!(cfg.rpc_host, "127.0.0.1");
        assert_eq!(cfg.rpc_port, 9630);
        assert_eq!(cfg.load_source, LoadSourceKind::Sqlite);
        assert_eq!(cfg.simulated_seed, None);
        assert_eq!(cfg.load_timeout, Duration::from_millis(500));
        assert!(cfg.dispatch_enabled);
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("SWITCHBOARD_DB_PATH", "/tmp/sb.db"),
            ("SWITCHBOARD_RPC_PORT", "7001"),
            ("SWITCHBOARD_LOAD_SOURCE", "Simulated"),
            ("SWITCHBOARD_SIMULATED_SEED", "42"),
            ("SWITCHBOARD_LOAD_TIMEOUT_MS", "1200"),
            ("SWITCHBOARD_DISPATCH", "off"),
        ])
        .unwrap();

        assert_eq!(cfg.db_path, PathBuf::from("/tmp/sb.db"));
        assert_eq!(cfg.rpc_port, 7001);
        assert_eq!(cfg.load_source, LoadSourceKind::Simulated);
        assert_eq!(cfg.simulated_seed, Some(42));
        assert_eq!(cfg.load_timeout, Duration::from_millis(1200));
        assert!(!cfg.dispatch_enabled);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config(&[("SWITCHBOARD_RPC_PORT", "99999")]).is_err());
        assert!(config(&[("SWITCHBOARD_LOAD_SOURCE", "redis")]).is_err());
        assert!(config(&[("SWITCHBOARD_LOAD_TIMEOUT_MS", "0")]).is_err());
        assert!(config(&[("SWITCHBOARD_DISPATCH", "maybe")]).is_err());
    }
}
