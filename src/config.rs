//! Runtime configuration comes from the environment (after `.env` is loaded
//! by `dotenvy`), plus a little hard-coded config.

use anyhow::{bail, Context, Result};
use std::{env, net::SocketAddr};

/// How many of the newest transactions a chat summary carries along.
pub const SUMMARY_RECENT_LEN: usize = 5;

/// How many of the newest transactions the dashboard shows.
pub const DASHBOARD_RECENT_LEN: usize = 10;

/// Name of the catch-all property created when a transaction arrives before
/// any property exists.
pub const FALLBACK_PROPERTY_NAME: &str = "ทรัพย์สินทั่วไป";

const DEFAULT_DASHBOARD_URL: &str = "https://renovate-tracker.vercel.app";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// Process-local; everything is lost on restart
    Memory,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub line_channel_access_token: Option<String>,
    pub line_channel_secret: Option<String>,
    pub database_url: Option<String>,
    pub dashboard_password: Option<String>,
    pub store: StoreBackend,
    pub bind_addr: SocketAddr,
    pub dashboard_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store = match get("STORE").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => bail!("STORE must be postgres or memory, not {other}"),
        };
        let database_url = get("DATABASE_URL");
        if store == StoreBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set when STORE=postgres");
        }

        let port: u16 = match get("PORT") {
            Some(p) => p.parse().with_context(|| format!("bad PORT {p}"))?,
            None => 8000,
        };
        let host = get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".into());
        let bind_addr = format!("{host}:{port}")
            .parse()
            .with_context(|| format!("bad BIND_ADDR {host}"))?;

        Ok(Config {
            line_channel_access_token: get("LINE_CHANNEL_ACCESS_TOKEN"),
            line_channel_secret: get("LINE_CHANNEL_SECRET"),
            database_url,
            dashboard_password: get("DASHBOARD_PASSWORD"),
            store,
            bind_addr,
            dashboard_url: get("DASHBOARD_URL")
                .unwrap_or_else(|| DEFAULT_DASHBOARD_URL.into()),
        })
    }

    /// What `/api/debug` reports: whether each secret is set, with enough of
    /// a prefix to tell deployments apart.
    pub fn env_check(&self) -> Vec<(&'static str, String)> {
        fn describe(value: &Option<String>, prefix: Option<usize>) -> String {
            match (value, prefix) {
                (None, _) => "NOT SET".into(),
                (Some(_), None) => "SET".into(),
                (Some(v), Some(n)) => {
                    format!("SET ({}...)", v.chars().take(n).collect::<String>())
                }
            }
        }
        vec![
            (
                "LINE_CHANNEL_ACCESS_TOKEN",
                describe(&self.line_channel_access_token, Some(10)),
            ),
            (
                "LINE_CHANNEL_SECRET",
                describe(&self.line_channel_secret, Some(10)),
            ),
            ("DATABASE_URL", describe(&self.database_url, Some(15))),
            ("DASHBOARD_PASSWORD", describe(&self.dashboard_password, None)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = config(&[("STORE", "memory")]).expect("config");
        assert_eq!(c.store, StoreBackend::Memory);
        assert_eq!(c.bind_addr.port(), 8000);
        assert_eq!(c.dashboard_url, DEFAULT_DASHBOARD_URL);
        assert!(c.dashboard_password.is_none());
    }

    #[test]
    fn test_postgres_requires_url() {
        assert!(config(&[]).is_err());
        let c = config(&[("DATABASE_URL", "postgres://localhost/rt")])
            .expect("config");
        assert_eq!(c.store, StoreBackend::Postgres);
    }

    #[test]
    fn test_bad_values() {
        assert!(config(&[("STORE", "sqlite")]).is_err());
        assert!(config(&[("STORE", "memory"), ("PORT", "http")]).is_err());
    }

    #[test]
    fn test_empty_counts_as_unset() {
        let c = config(&[("STORE", "memory"), ("DASHBOARD_PASSWORD", " ")])
            .expect("config");
        assert!(c.dashboard_password.is_none());
    }

    #[test]
    fn test_env_check() {
        let c = config(&[
            ("STORE", "memory"),
            ("LINE_CHANNEL_SECRET", "abcdefghijklmnop"),
            ("DASHBOARD_PASSWORD", "hunter2"),
        ])
        .expect("config");
        let check: HashMap<_, _> = c.env_check().into_iter().collect();
        assert_eq!(check["LINE_CHANNEL_SECRET"], "SET (abcdefghij...)");
        assert_eq!(check["LINE_CHANNEL_ACCESS_TOKEN"], "NOT SET");
        assert_eq!(check["DASHBOARD_PASSWORD"], "SET");
    }
}
