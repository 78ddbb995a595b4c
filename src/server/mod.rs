//! HTTP server façade and engine integration.

mod facade;
mod http_server;
mod request;
mod response;
mod service;

pub use facade::Server;
pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_cookies, parse_query_params, parse_request, ParsedRequest};
pub use response::write_response;
pub use service::AppService;
