//! Request routing.

mod core;

pub use core::{ParamVec, RouteMatch, Router, MAX_INLINE_PARAMS};
