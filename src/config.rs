//! Server configuration loaded once at startup and passed into the façade by
//! value. No component reads the environment after this point.
//!
//! ## Environment variables
//!
//! - `HOST` — listen host (default `localhost`)
//! - `PORT` — listen port (default `8080`)
//! - `APP_ENV` — `production` switches logs to JSON, anything else is
//!   human-readable
//! - `CONVENE_STACK_SIZE` — coroutine stack size in bytes, decimal (`524288`)
//!   or hex (`0x80000`); default `0x80000`

use std::env;
use std::path::PathBuf;

/// Default coroutine stack size: 512 KiB.
pub const DEFAULT_STACK_SIZE: usize = 0x80000;

/// Deployment environment, selects the log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

/// Startup configuration for the server façade.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen host (default `localhost`)
    pub host: String,
    /// Listen port (default `8080`)
    pub port: u16,
    /// Deployment environment (default development)
    pub env: AppEnv,
    /// Stack size for request and handler coroutines in bytes (default
    /// 512 KiB / 0x80000). Validation and JSON serialization run on these
    /// stacks; sizes much below the default overflow under nested payloads.
    pub stack_size: usize,
    /// Optional resource tree root; when set, the on-disk layout is
    /// cross-checked against registered resources at startup
    pub resource_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            env: AppEnv::Development,
            stack_size: DEFAULT_STACK_SIZE,
            resource_dir: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything absent or unparseable.
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        let app_env = match env::var("APP_ENV") {
            Ok(v) if v.eq_ignore_ascii_case("production") => AppEnv::Production,
            _ => AppEnv::Development,
        };
        let stack_size = match env::var("CONVENE_STACK_SIZE") {
            Ok(val) => {
                if let Some(hex) = val.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).unwrap_or(DEFAULT_STACK_SIZE)
                } else {
                    val.parse().unwrap_or(DEFAULT_STACK_SIZE)
                }
            }
            Err(_) => DEFAULT_STACK_SIZE,
        };
        ServerConfig {
            host,
            port,
            env: app_env,
            stack_size,
            resource_dir: None,
        }
    }

    /// Socket address string the server binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
