//! Tracing instrumentation: per-request stage spans and decorator adapters
//! for service functions and handlers.

mod spans;
mod wrap;

pub use spans::{RequestSpans, Stage};
pub use wrap::{traced_fn, traced_handler};
