use std::time::Duration;

use crate::backend::flash2db::ServiceMap;
use crate::gateway::queue::Backpressure;
use crate::gateway::registry::DEFAULT_MAX_SESSIONS;

#[derive(Debug, Clone, PartialEq)]
pub enum BackendMode {
    Http,
    Stub,
}

/// Knobs for the per-connection protocol engine.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewaySettings {
    pub max_sessions: usize,
    pub inbound_queue: usize,
    pub backpressure: Backpressure,
    pub cleanup_unauthenticated: bool,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            inbound_queue: 64,
            backpressure: Backpressure::Block,
            cleanup_unauthenticated: true,
        }
    }
}

pub struct Config {
    pub port: u16,
    pub backend: BackendMode,
    pub backend_url: Option<String>,
    pub backend_timeout: Option<Duration>,
    pub services: ServiceMap,
    pub gateway: GatewaySettings,
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let backend = match std::env::var("SLOTGATE_BACKEND")
            .unwrap_or_else(|_| "http".to_string())
            .to_lowercase()
            .as_str()
        {
            "stub" => BackendMode::Stub,
            _ => BackendMode::Http,
        };

        let backend_url = std::env::var("SLOTGATE_BACKEND_URL").ok();

        let backend_timeout = std::env::var("SLOTGATE_BACKEND_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis);

        let services = match std::env::var("SLOTGATE_SERVICES") {
            Ok(raw) => ServiceMap::parse(&raw)
                .unwrap_or_else(|e| panic!("SLOTGATE_SERVICES is invalid: {e}")),
            Err(_) => ServiceMap::default(),
        };

        let defaults = GatewaySettings::default();
        let backpressure = match std::env::var("SLOTGATE_BACKPRESSURE") {
            Ok(raw) => raw
                .parse()
                .unwrap_or_else(|e| panic!("SLOTGATE_BACKPRESSURE is invalid: {e}")),
            Err(_) => defaults.backpressure,
        };

        let gateway = GatewaySettings {
            max_sessions: std::env::var("SLOTGATE_MAX_SESSIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_sessions),
            inbound_queue: std::env::var("SLOTGATE_INBOUND_QUEUE")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .map(|n| n.max(1))
                .unwrap_or(defaults.inbound_queue),
            backpressure,
            cleanup_unauthenticated: env_flag(
                "SLOTGATE_CLEANUP_UNAUTHENTICATED",
                defaults.cleanup_unauthenticated,
            ),
        };

        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            backend,
            backend_url,
            backend_timeout,
            services,
            gateway,
        }
    }

    /// Fail fast on settings that only make sense together.
    pub fn validate(&self) {
        if self.backend == BackendMode::Http && self.backend_url.is_none() {
            panic!("SLOTGATE_BACKEND_URL is required when SLOTGATE_BACKEND=http");
        }
    }
}
