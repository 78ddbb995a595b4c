//! Resource model and convention-based discovery.

mod discover;
mod types;

pub use discover::{cross_check, discover};
pub use types::{
    ResourceDescriptor, ResourceModule, Role, RouteConfig, RouteDef, RouterFactory, RouterModule,
};
