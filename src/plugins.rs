//! Optional server capabilities, enabled per server instance before startup.

use crate::config::AppEnv;
use http::Method;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// A capability the façade wires in when enabled.
#[derive(Debug, Clone)]
pub enum Plugin {
    /// Preflight handling plus access-control headers on every reply.
    Cors {
        origins: Vec<String>,
        headers: Vec<String>,
        methods: Vec<Method>,
    },
    /// Attach parsed cookies to requests.
    Cookie,
    /// Fixed-window rate limiting across all routes.
    RateLimit { limit: u32, window: Duration },
    /// Serve files under `root` for unmatched GET requests. Relative roots
    /// resolve against the process working directory.
    Static { root: PathBuf },
    /// Enforce the upload size limit on multipart payloads; decoding itself
    /// is left to the handler.
    Multipart { max_payload_bytes: usize },
    /// Parse `application/x-www-form-urlencoded` bodies into the JSON body.
    FormBody,
    /// Install the tracing subscriber and enable span instrumentation.
    Telemetry {
        service_name: String,
        service_version: String,
    },
}

impl Plugin {
    /// Permissive CORS defaults for development.
    #[must_use]
    pub fn cors_default() -> Self {
        Plugin::Cors {
            origins: vec!["*".into()],
            headers: vec!["Content-Type".into(), "Authorization".into()],
            methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::PATCH,
                Method::OPTIONS,
            ],
        }
    }

    #[must_use]
    pub fn telemetry(service_name: impl Into<String>, service_version: impl Into<String>) -> Self {
        Plugin::Telemetry {
            service_name: service_name.into(),
            service_version: service_version.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Plugin::Cors { .. } => "cors",
            Plugin::Cookie => "cookie",
            Plugin::RateLimit { .. } => "rate-limit",
            Plugin::Static { .. } => "static",
            Plugin::Multipart { .. } => "multipart",
            Plugin::FormBody => "formbody",
            Plugin::Telemetry { .. } => "telemetry",
        }
    }
}

/// Install the global tracing subscriber: JSON output in production,
/// human-readable otherwise. `RUST_LOG` overrides the default `info` filter.
/// Safe to call more than once; later calls keep the first subscriber.
pub fn init_tracing(env: AppEnv, service_name: &str, service_version: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = match env {
        AppEnv::Production => tracing_subscriber::fmt()
            .json()
            .flatten_event(true)
            .with_env_filter(filter)
            .try_init()
            .is_ok(),
        AppEnv::Development => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .is_ok(),
    };
    if installed {
        info!(
            service.name = %service_name,
            service.version = %service_version,
            "Telemetry initialized"
        );
    }
}
