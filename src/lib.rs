//! Convention-driven HTTP server scaffolding on the `may` coroutine runtime.
//!
//! Resources live under `resources/<name>/` as role files (`controller`,
//! `router`, `schema`, `service`); explicitly registered router modules bind
//! schema-validated routes to handlers behind a restricted reply contract,
//! with optional tracing instrumentation around every stage.
//!
//! ```rust,no_run
//! use convene::prelude::*;
//! use http::Method;
//! use serde_json::json;
//!
//! fn hello() -> anyhow::Result<RouterModule> {
//!     Ok(RouterModule::new("").route(
//!         RouteDef::new("get_hello", Method::GET, "/hello/:name", std::sync::Arc::new(
//!             |req: &HandlerRequest, reply: &Reply| {
//!                 Ok(reply.success(200, json!(format!("Hello, {}!", req.params["name"].as_str().unwrap_or("")))))
//!             },
//!         ))
//!         .schema(RouteSchema::for_status(200, json!({ "type": "string" }))),
//!     ))
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let handle = Server::new(ServerConfig::from_env())
//!         .resource(ResourceModule::with_router("hello", hello))
//!         .start()?;
//!     handle.join().ok();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod ids;
pub mod instrument;
pub mod middleware;
pub mod plugins;
pub mod registrar;
pub mod reply;
pub mod resource;
pub mod router;
pub mod server;
pub mod static_files;
pub mod validation;

pub use config::{AppEnv, ServerConfig};
pub use dispatcher::{Dispatcher, Handler, HandlerRequest};
pub use errors::RequestError;
pub use ids::RequestId;
pub use plugins::Plugin;
pub use reply::{Reply, ReplyKind, ReplyPayload};
pub use resource::{ResourceModule, RouteDef, RouterModule};
pub use server::{Server, ServerHandle};
pub use validation::{RouteSchema, ValidationIssue};

/// Common imports for building a server.
pub mod prelude {
    pub use crate::config::{AppEnv, ServerConfig};
    pub use crate::dispatcher::{Handler, HandlerRequest};
    pub use crate::errors::RequestError;
    pub use crate::middleware::Middleware;
    pub use crate::plugins::Plugin;
    pub use crate::reply::{Reply, ReplyPayload};
    pub use crate::resource::{ResourceModule, RouteDef, RouterModule};
    pub use crate::server::{Server, ServerHandle};
    pub use crate::validation::RouteSchema;
}
