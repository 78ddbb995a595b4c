//! Precompiled schema validators, built once at route registration.
//!
//! JSON Schema validators are expensive to compile; doing it per request
//! burns CPU and blows small coroutine stacks. Every route's validators are
//! compiled when the route enters the table and shared across requests
//! through the route's `Arc`.

use super::adapter::{coerce, issue_from_error, Facet};
use super::issues::ValidationIssue;
use super::schema::RouteSchema;
use anyhow::Context;
use jsonschema::JSONSchema;
use serde_json::Value;
use std::collections::HashMap;

/// One facet's schema plus its compiled validator.
pub struct CompiledFacet {
    schema: Value,
    validator: JSONSchema,
}

impl CompiledFacet {
    pub fn compile(schema: &Value) -> anyhow::Result<Self> {
        let validator =
            JSONSchema::compile(schema).map_err(|e| anyhow::anyhow!("invalid schema: {e}"))?;
        Ok(Self {
            schema: schema.clone(),
            validator,
        })
    }

    /// Coerce `input` toward the schema's types and evaluate it.
    ///
    /// Returns the coerced value on success so callers can replace the raw
    /// request facet with the schema's output type. On failure, returns every
    /// issue the engine reported, with `field` paths rooted at the facet name.
    pub fn validate(&self, facet: Facet, input: &Value) -> Result<Value, Vec<ValidationIssue>> {
        let coerced = coerce(&self.schema, input);
        let issues: Vec<ValidationIssue> = match self.validator.validate(&coerced) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.map(|e| issue_from_error(facet, &e)).collect(),
        };

        if issues.is_empty() {
            Ok(coerced)
        } else {
            Err(issues)
        }
    }
}

impl std::fmt::Debug for CompiledFacet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledFacet")
            .field("schema", &self.schema)
            .finish()
    }
}

/// A route's [`RouteSchema`] with every declared validator compiled.
#[derive(Debug)]
pub struct CompiledSchema {
    pub params: Option<CompiledFacet>,
    pub querystring: Option<CompiledFacet>,
    pub body: Option<CompiledFacet>,
    response: HashMap<String, CompiledFacet>,
}

impl CompiledSchema {
    /// Compile every facet. Any invalid schema fails the whole route.
    pub fn compile(schema: &RouteSchema) -> anyhow::Result<Self> {
        let params = match &schema.params {
            Some(v) => Some(CompiledFacet::compile(v).context("params schema")?),
            None => None,
        };
        let querystring = match &schema.querystring {
            Some(v) => Some(CompiledFacet::compile(v).context("querystring schema")?),
            None => None,
        };
        let body = match &schema.body {
            Some(v) => Some(CompiledFacet::compile(v).context("body schema")?),
            None => None,
        };
        let mut response = HashMap::new();
        for (status, v) in &schema.response {
            let compiled = CompiledFacet::compile(v)
                .with_context(|| format!("response schema for status {status}"))?;
            response.insert(status.clone(), compiled);
        }
        Ok(Self {
            params,
            querystring,
            body,
            response,
        })
    }

    /// Validator declared for the given status, falling back to `"default"`.
    #[must_use]
    pub fn response_for(&self, status: u16) -> Option<&CompiledFacet> {
        self.response
            .get(&status.to_string())
            .or_else(|| self.response.get("default"))
    }
}
