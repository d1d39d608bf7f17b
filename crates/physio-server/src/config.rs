//! Server configuration for the clinic site.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Everything is read once at startup and injected into [`AppState`]; no
//! handler reads the environment.
//!
//! [`AppState`]: crate::state::AppState

use std::net::SocketAddr;

use physio_core::admin::AdminCredentials;
use physio_core::consultation::DEFAULT_FROM;

/// Default appointment API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:5001/api";

/// Default forms relay endpoint.
pub const DEFAULT_FORMS_URL: &str = "https://api.web3forms.com/submit";

/// Default transactional email endpoint.
pub const DEFAULT_RESEND_URL: &str = "https://api.resend.com/emails";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Where popup cooldown timestamps are kept.
    pub storage_backend: StorageBackendType,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Base URL of the appointment API; appointments are posted to
    /// `{api_url}/appointments`.
    pub api_url: String,
    /// Forms relay endpoint.
    pub forms_url: String,
    /// Access key sent with every forms relay request.
    pub forms_access_key: String,
    /// Transactional email endpoint.
    pub resend_api_url: String,
    /// API key for the email provider. Consultation email is refused
    /// without it.
    pub resend_api_key: Option<String>,
    /// Sender of consultation emails.
    pub mail_from: String,
    /// Recipients of consultation emails.
    pub mail_to: Vec<String>,
    /// Admin sign-in credentials. Every login fails when unset.
    pub admin: Option<AdminCredentials>,
    /// Site-wide maintenance switch.
    pub maintenance: bool,
    /// Popup sessions idle for longer than this are dropped.
    pub session_idle_secs: u64,
    /// Seconds between idle-session sweeps.
    pub sweep_interval_secs: u64,
    /// Timeout for each outbound request.
    pub gateway_timeout_secs: u64,
}

/// Supported storage backend types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackendType {
    /// In-memory (development only, cooldowns lost on restart).
    Memory,
    /// Redb persistent storage.
    Redb { path: String },
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT` — port to bind on, binds to `0.0.0.0`
    /// - `PHYSIO_BIND_ADDR` — full bind address (overrides `PORT`, default: `127.0.0.1:3000`)
    /// - `PHYSIO_STORAGE` — `memory` or `redb` (default: `memory`)
    /// - `PHYSIO_STORAGE_PATH` — path for the redb file (default: `./data/popup.redb`)
    /// - `PHYSIO_LOG_LEVEL` — log filter (default: `info`)
    /// - `PHYSIO_API_URL` — appointment API base (default: `http://localhost:5001/api`)
    /// - `PHYSIO_FORMS_URL` — forms relay endpoint (default: web3forms)
    /// - `WEB3FORMS_ACCESS_KEY` — forms relay access key
    /// - `RESEND_API_KEY` / `RESEND_API_URL` — email provider
    /// - `PHYSIO_MAIL_FROM` / `PHYSIO_MAIL_TO` — consultation email sender and
    ///   comma-separated recipients
    /// - `ADMIN_EMAIL` / `ADMIN_PASSWORD` — admin sign-in
    /// - `MAINTENANCE_MODE` — `true` or `1` to serve the maintenance notice
    /// - `PHYSIO_SESSION_IDLE_SECS` — idle popup session lifetime (default: `1800`)
    /// - `PHYSIO_SWEEP_INTERVAL` — seconds between idle sweeps (default: `60`)
    /// - `PHYSIO_GATEWAY_TIMEOUT_SECS` — outbound request timeout (default: `10`)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through
    /// `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let flag = |key: &str| var(key).is_some_and(|v| v == "true" || v == "1");
        let secs = |key: &str, default: u64| {
            var(key)
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };

        // Priority: PHYSIO_BIND_ADDR > PORT > default 127.0.0.1:3000
        let bind_addr = if let Some(addr) = var("PHYSIO_BIND_ADDR") {
            addr.parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 3000)))
        } else if let Some(port) = var("PORT") {
            SocketAddr::from(([0, 0, 0, 0], port.parse().unwrap_or(3000)))
        } else {
            SocketAddr::from(([127, 0, 0, 1], 3000))
        };

        let storage_path =
            var("PHYSIO_STORAGE_PATH").unwrap_or_else(|| "./data/popup.redb".to_owned());
        let storage_backend = match var("PHYSIO_STORAGE")
            .unwrap_or_else(|| "memory".to_owned())
            .to_lowercase()
            .as_str()
        {
            "redb" => StorageBackendType::Redb { path: storage_path },
            _ => StorageBackendType::Memory,
        };

        let admin = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminCredentials::new(email, password)),
            _ => None,
        };

        let mail_to = var("PHYSIO_MAIL_TO")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|addr| !addr.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            bind_addr,
            storage_backend,
            log_level: var("PHYSIO_LOG_LEVEL").unwrap_or_else(|| "info".to_owned()),
            api_url: var("PHYSIO_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            forms_url: var("PHYSIO_FORMS_URL").unwrap_or_else(|| DEFAULT_FORMS_URL.to_owned()),
            forms_access_key: var("WEB3FORMS_ACCESS_KEY").unwrap_or_default(),
            resend_api_url: var("RESEND_API_URL").unwrap_or_else(|| DEFAULT_RESEND_URL.to_owned()),
            resend_api_key: var("RESEND_API_KEY"),
            mail_from: var("PHYSIO_MAIL_FROM").unwrap_or_else(|| DEFAULT_FROM.to_owned()),
            mail_to,
            admin,
            maintenance: flag("MAINTENANCE_MODE"),
            session_idle_secs: secs("PHYSIO_SESSION_IDLE_SECS", 1800),
            sweep_interval_secs: secs("PHYSIO_SWEEP_INTERVAL", 60),
            gateway_timeout_secs: secs("PHYSIO_GATEWAY_TIMEOUT_SECS", 10),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg.bind_addr, SocketAddr::from(([127, 0, 0, 1], 3000)));
        assert_eq!(cfg.storage_backend, StorageBackendType::Memory);
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.forms_url, DEFAULT_FORMS_URL);
        assert_eq!(cfg.mail_from, DEFAULT_FROM);
        assert!(cfg.admin.is_none());
        assert!(cfg.resend_api_key.is_none());
        assert!(!cfg.maintenance);
        assert_eq!(cfg.session_idle_secs, 1800);
    }

    #[test]
    fn bind_addr_prefers_explicit_address_over_port() {
        let cfg = config(&[("PORT", "8080")]);
        assert_eq!(cfg.bind_addr, SocketAddr::from(([0, 0, 0, 0], 8080)));
        let cfg = config(&[("PORT", "8080"), ("PHYSIO_BIND_ADDR", "127.0.0.1:9000")]);
        assert_eq!(cfg.bind_addr, SocketAddr::from(([127, 0, 0, 1], 9000)));
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("PHYSIO_STORAGE", "REDB"),
            ("PHYSIO_STORAGE_PATH", "/var/lib/physio/popup.redb"),
            ("PHYSIO_API_URL", "https://api.clinic.test/api/"),
            ("PHYSIO_MAIL_TO", "front@clinic.test, doctor@clinic.test,"),
            ("ADMIN_EMAIL", "admin@clinic.test"),
            ("ADMIN_PASSWORD", "pw"),
            ("MAINTENANCE_MODE", "1"),
            ("PHYSIO_SWEEP_INTERVAL", "0"),
        ]);
        assert_eq!(
            cfg.storage_backend,
            StorageBackendType::Redb {
                path: "/var/lib/physio/popup.redb".to_owned()
            }
        );
        assert_eq!(cfg.api_url, "https://api.clinic.test/api");
        assert_eq!(cfg.mail_to, ["front@clinic.test", "doctor@clinic.test"]);
        assert!(cfg.admin.is_some_and(|a| a.verify("admin@clinic.test", "pw")));
        assert!(cfg.maintenance);
        assert_eq!(cfg.sweep_interval_secs, 60);
    }

    #[test]
    fn admin_needs_both_variables() {
        assert!(config(&[("ADMIN_EMAIL", "admin@clinic.test")]).admin.is_none());
    }
}
