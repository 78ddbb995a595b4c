//! Server façade: the one place where configuration, plugins, resources,
//! and the engine lifecycle meet.

use super::http_server::{HttpServer, ServerHandle};
use super::service::AppService;
use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::middleware::{CorsMiddleware, Middleware, RateLimitMiddleware};
use crate::plugins::{init_tracing, Plugin};
use crate::registrar::register_resources;
use crate::resource::{cross_check, discover, ResourceModule};
use crate::router::Router;
use crate::static_files::StaticFiles;
use std::sync::Arc;
use tracing::{info, warn};

/// Builds and starts a server from a [`ServerConfig`], enabled plugins, and
/// registered resources. The config arrives by value; nothing here reads the
/// environment.
pub struct Server {
    config: ServerConfig,
    plugins: Vec<Plugin>,
    resources: Vec<ResourceModule>,
}

impl Server {
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            plugins: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Enable a plugin. Enabling the same plugin twice keeps the last one.
    #[must_use]
    pub fn plugin(mut self, plugin: Plugin) -> Self {
        if let Some(existing) = self
            .plugins
            .iter_mut()
            .find(|p| p.name() == plugin.name())
        {
            warn!(plugin = plugin.name(), "Plugin enabled twice, last wins");
            *existing = plugin;
        } else {
            self.plugins.push(plugin);
        }
        self
    }

    /// Register a resource. Registration order is preserved.
    #[must_use]
    pub fn resource(mut self, resource: ResourceModule) -> Self {
        self.resources.push(resource);
        self
    }

    #[must_use]
    pub fn resources(mut self, resources: impl IntoIterator<Item = ResourceModule>) -> Self {
        self.resources.extend(resources);
        self
    }

    /// Wire everything together and start listening.
    ///
    /// Startup order: telemetry, discovery cross-check, route registration,
    /// service assembly, bind. A resource with a failing router binding is
    /// skipped with a warning; the server still starts.
    pub fn start(self) -> anyhow::Result<ServerHandle> {
        let mut instrument = false;
        for plugin in &self.plugins {
            if let Plugin::Telemetry {
                service_name,
                service_version,
            } = plugin
            {
                init_tracing(self.config.env, service_name, service_version);
                instrument = true;
            }
        }

        may::config().set_stack_size(self.config.stack_size);

        if let Some(dir) = &self.config.resource_dir {
            let discovered = discover(dir)?;
            cross_check(&discovered, &self.resources);
        }

        let mut router = Router::new();
        let mut dispatcher = Dispatcher::new(self.config.stack_size);
        let report =
            register_resources(&mut router, &mut dispatcher, &self.resources, instrument);
        info!(
            resources = report.resources,
            routes = report.routes,
            skipped = report.skipped.len(),
            "Registration complete"
        );

        let mut service = AppService::new(Arc::new(router), Arc::new(dispatcher));
        service.instrument = instrument;

        for plugin in self.plugins {
            match plugin {
                Plugin::Cors {
                    origins,
                    headers,
                    methods,
                } => {
                    let cors = Arc::new(CorsMiddleware::new(origins, headers, methods));
                    service.cors = Some(Arc::clone(&cors));
                    service.global_middlewares.push(cors);
                }
                Plugin::Cookie => service.cookies_enabled = true,
                Plugin::RateLimit { limit, window } => {
                    let limiter: Arc<dyn Middleware> =
                        Arc::new(RateLimitMiddleware::new(limit, window));
                    service.global_middlewares.push(limiter);
                }
                Plugin::Static { root } => {
                    service.static_files = Some(Arc::new(StaticFiles::new(root)));
                }
                Plugin::Multipart { max_payload_bytes } => {
                    service.multipart_limit = Some(max_payload_bytes);
                }
                Plugin::FormBody => service.formbody_enabled = true,
                Plugin::Telemetry { .. } => {}
            }
        }

        let addr = self.config.listen_addr();
        info!(addr = %addr, "Server starting");
        let handle = HttpServer(service).start(&addr)?;
        info!(addr = %handle.addr(), "Server listening");
        Ok(handle)
    }
}
