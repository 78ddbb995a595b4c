//! Validation adapter: converts schema-validation outcomes into typed
//! success/failure results consumed by the registration pipeline.
//!
//! Validators compile once at registration ([`CompiledSchema`]); per-request
//! work is coercion plus evaluation of the precompiled form.

mod adapter;
mod compiled;
mod issues;
mod schema;

pub use adapter::{coerce, Facet};
pub use compiled::{CompiledFacet, CompiledSchema};
pub use issues::ValidationIssue;
pub use schema::RouteSchema;
