//! Route registration: turns registered resources into route table entries
//! and handler coroutines.
//!
//! Resources register in the order given; within a resource, routes register
//! in declaration order. A failing router factory (or a route that cannot be
//! compiled) skips that resource only, with a warning; every other resource
//! registers normally and the server still starts.

use crate::dispatcher::Dispatcher;
use crate::instrument::traced_handler;
use crate::resource::ResourceModule;
use crate::router::Router;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a registration pass.
#[derive(Debug, Default)]
pub struct RegistrationReport {
    /// Resources whose routes were registered.
    pub resources: usize,
    /// Total routes registered.
    pub routes: usize,
    /// Names of resources skipped because their router binding failed.
    pub skipped: Vec<String>,
}

/// Compose the final URL from a router prefix and a declared path.
///
/// Trailing slashes are stripped; the root path `/` is preserved.
#[must_use]
pub fn compose_url(prefix: &str, path: &str) -> String {
    let mut url = format!("{prefix}{path}");
    if !url.starts_with('/') {
        url.insert(0, '/');
    }
    while url.len() > 1 && url.ends_with('/') {
        url.pop();
    }
    url
}

/// Register every resource's routes into the router and dispatcher.
///
/// With `instrument` set, handlers are wrapped in the tracing decorator
/// under the resource's namespace.
pub fn register_resources(
    router: &mut Router,
    dispatcher: &mut Dispatcher,
    resources: &[ResourceModule],
    instrument: bool,
) -> RegistrationReport {
    let mut report = RegistrationReport::default();

    for resource in resources {
        let Some(factory) = &resource.router else {
            debug!(resource = %resource.name, "Resource has no router binding, no routes");
            continue;
        };

        let module = match factory() {
            Ok(module) => module,
            Err(e) => {
                warn!(
                    resource = %resource.name,
                    error = %e,
                    "Router factory failed, skipping resource"
                );
                report.skipped.push(resource.name.clone());
                continue;
            }
        };

        let mut batch = Vec::new();
        let mut handlers = Vec::new();
        for route in module.routes {
            let url = compose_url(&module.prefix, &route.path);
            let handler = if instrument {
                traced_handler(&resource.name, &route.name, Arc::clone(&route.handler))
            } else {
                Arc::clone(&route.handler)
            };
            handlers.push((route.name.clone(), handler));
            batch.push((url, route));
        }

        // All-or-nothing: a route that fails to compile leaves no sibling
        // routes of this resource in the table.
        let route_count = batch.len();
        if let Err(e) = router.add_routes(batch) {
            warn!(
                resource = %resource.name,
                error = %e,
                "Route registration failed, skipping resource"
            );
            report.skipped.push(resource.name.clone());
            continue;
        }

        for (name, handler) in handlers {
            // SAFETY: registration runs during startup, before the server
            // accepts requests, with the may runtime initialized.
            unsafe {
                dispatcher.register_handler(&name, handler);
            }
            report.routes += 1;
        }
        report.resources += 1;

        info!(
            resource = %resource.name,
            prefix = %module.prefix,
            routes = route_count,
            "Resource registered"
        );
    }

    report
}
