use crate::dispatcher::Handler;
use crate::middleware::Middleware;
use crate::validation::{CompiledSchema, RouteSchema};
use http::Method;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Role a file plays inside a resource directory.
///
/// `router` and `route` are synonyms on disk; both parse to [`Role::Router`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Controller,
    Router,
    Schema,
    Service,
}

impl Role {
    /// Parse the role token of a `<anything>.<role>.<ext>` file name.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "controller" => Some(Role::Controller),
            "router" | "route" => Some(Role::Router),
            "schema" => Some(Role::Schema),
            "service" => Some(Role::Service),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Controller => "controller",
            Role::Router => "router",
            Role::Schema => "schema",
            Role::Service => "service",
        }
    }
}

/// On-disk description of one resource: its name and the role files found
/// under its directory. Every role is independently optional.
#[derive(Debug, Clone, Default)]
pub struct ResourceDescriptor {
    pub name: String,
    pub roles: BTreeMap<Role, PathBuf>,
}

impl ResourceDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn role_path(&self, role: Role) -> Option<&PathBuf> {
        self.roles.get(&role)
    }

    /// A resource without a router binding contributes no routes.
    #[must_use]
    pub fn has_router(&self) -> bool {
        self.roles.contains_key(&Role::Router)
    }
}

/// Per-route options beyond the schema.
#[derive(Debug, Clone, Default)]
pub struct RouteConfig {
    /// Keep the unconsumed payload bytes (and their transfer encoding) on the
    /// request instead of discarding them after JSON parsing.
    pub raw_body: bool,
}

/// One route declared by a router module.
pub struct RouteDef {
    /// Unique route name, used as the dispatch key.
    pub name: String,
    pub method: Method,
    /// Declared path with a leading `/`; `:name` segments capture params.
    pub path: String,
    /// Executed in declaration order before the handler.
    pub middlewares: Vec<Arc<dyn Middleware>>,
    pub schema: Option<RouteSchema>,
    /// Validators for `schema`, compiled once when the route enters the
    /// table. Requests reuse these instead of recompiling.
    pub compiled: Option<CompiledSchema>,
    pub handler: Handler,
    pub config: RouteConfig,
}

impl std::fmt::Debug for RouteDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteDef")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("middlewares", &self.middlewares.len())
            .field("has_schema", &self.schema.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl RouteDef {
    #[must_use]
    pub fn new(name: impl Into<String>, method: Method, path: impl Into<String>, handler: Handler) -> Self {
        Self {
            name: name.into(),
            method,
            path: path.into(),
            middlewares: Vec::new(),
            schema: None,
            compiled: None,
            handler,
            config: RouteConfig::default(),
        }
    }

    /// Compile the declared schema's validators. Runs once at registration;
    /// an invalid schema fails the route.
    pub fn compile_schema(&mut self) -> anyhow::Result<()> {
        if self.compiled.is_none() {
            if let Some(schema) = &self.schema {
                self.compiled = Some(CompiledSchema::compile(schema)?);
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn middleware(mut self, mw: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(mw);
        self
    }

    #[must_use]
    pub fn schema(mut self, schema: RouteSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub fn raw_body(mut self) -> Self {
        self.config.raw_body = true;
        self
    }
}

/// Output of a resource's router factory: an optional URL prefix plus the
/// routes to register under it.
#[derive(Debug, Default)]
pub struct RouterModule {
    /// Prepended to every route path (default empty).
    pub prefix: String,
    pub routes: Vec<RouteDef>,
}

impl RouterModule {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            routes: Vec::new(),
        }
    }

    #[must_use]
    pub fn route(mut self, route: RouteDef) -> Self {
        self.routes.push(route);
        self
    }
}

/// Fallible constructor for a resource's router module. An `Err` skips that
/// resource only; the rest of the server starts normally.
pub type RouterFactory = Box<dyn Fn() -> anyhow::Result<RouterModule> + Send>;

/// An explicitly registered resource: a name plus an optional router binding.
pub struct ResourceModule {
    pub name: String,
    pub router: Option<RouterFactory>,
}

impl ResourceModule {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            router: None,
        }
    }

    #[must_use]
    pub fn with_router<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<RouterModule> + Send + 'static,
    {
        Self {
            name: name.into(),
            router: Some(Box::new(factory)),
        }
    }
}

impl std::fmt::Debug for ResourceModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceModule")
            .field("name", &self.name)
            .field("has_router", &self.router.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("controller"), Some(Role::Controller));
        assert_eq!(Role::parse("router"), Some(Role::Router));
        assert_eq!(Role::parse("route"), Some(Role::Router));
        assert_eq!(Role::parse("schema"), Some(Role::Schema));
        assert_eq!(Role::parse("service"), Some(Role::Service));
        assert_eq!(Role::parse("model"), None);
    }

    #[test]
    fn test_descriptor_has_router() {
        let mut d = ResourceDescriptor::new("pets");
        assert!(!d.has_router());
        d.roles.insert(Role::Router, PathBuf::from("pets/pets.router.json"));
        assert!(d.has_router());
    }
}
