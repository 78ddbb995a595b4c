use serde_json::Value;
use std::collections::HashMap;

/// Per-route declaration of accepted and returned data shapes.
///
/// The request facets (`params`, `querystring`, `body`) are independently
/// optional; the `response` map is the one mandatory facet and is keyed by
/// status code (or `"default"` as a catch-all).
#[derive(Debug, Clone)]
pub struct RouteSchema {
    pub params: Option<Value>,
    pub querystring: Option<Value>,
    pub body: Option<Value>,
    pub response: HashMap<String, Value>,
}

impl RouteSchema {
    /// Build a schema from its mandatory response map.
    #[must_use]
    pub fn new(response: HashMap<String, Value>) -> Self {
        Self {
            params: None,
            querystring: None,
            body: None,
            response,
        }
    }

    /// Convenience constructor for the common single-status case.
    #[must_use]
    pub fn for_status(status: u16, validator: Value) -> Self {
        let mut response = HashMap::new();
        response.insert(status.to_string(), validator);
        Self::new(response)
    }

    #[must_use]
    pub fn params(mut self, schema: Value) -> Self {
        self.params = Some(schema);
        self
    }

    #[must_use]
    pub fn querystring(mut self, schema: Value) -> Self {
        self.querystring = Some(schema);
        self
    }

    #[must_use]
    pub fn body(mut self, schema: Value) -> Self {
        self.body = Some(schema);
        self
    }

    /// Validator declared for the given status, falling back to `"default"`.
    #[must_use]
    pub fn response_for(&self, status: u16) -> Option<&Value> {
        self.response
            .get(&status.to_string())
            .or_else(|| self.response.get("default"))
    }
}
