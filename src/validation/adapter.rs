//! Coercion and schema evaluation for one request facet.
//!
//! Path and query parameters arrive as strings; the adapter first converts
//! them to the types their schema declares (`"42"` becomes `42` under
//! `{"type": "integer"}`), then evaluates the schema. Handlers therefore see
//! the schema's output type, never the raw input.

use super::issues::ValidationIssue;
use jsonschema::error::ValidationErrorKind;
use jsonschema::ValidationError;
use serde_json::Value;

/// Which part of the request a schema applies to. Determines the `field`
/// prefix in reported issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Params,
    Querystring,
    Body,
    Response,
}

impl Facet {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Facet::Params => "params",
            Facet::Querystring => "querystring",
            Facet::Body => "body",
            Facet::Response => "response",
        }
    }
}

fn convert_primitive(val: &str, schema: Option<&Value>) -> Value {
    if let Some(ty) = schema.and_then(|s| s.get("type").and_then(|v| v.as_str())) {
        match ty {
            "integer" => val
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(val.to_string())),
            "number" => val
                .parse::<f64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(val.to_string())),
            "boolean" => val
                .parse::<bool>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(val.to_string())),
            _ => Value::String(val.to_string()),
        }
    } else {
        Value::String(val.to_string())
    }
}

/// Convert `input` toward the types `schema` declares.
///
/// String leaves are parsed per the declared primitive type; comma-separated
/// strings become arrays when the schema asks for one; objects recurse by
/// property. Values that fail to parse are left as strings so the schema
/// engine reports them with a proper issue.
#[must_use]
pub fn coerce(schema: &Value, input: &Value) -> Value {
    let ty = schema.get("type").and_then(|v| v.as_str());
    match (ty, input) {
        (Some("object"), Value::Object(map)) => {
            let props = schema.get("properties");
            let converted = map
                .iter()
                .map(|(k, v)| {
                    let prop_schema = props.and_then(|p| p.get(k));
                    let cv = match prop_schema {
                        Some(ps) => coerce(ps, v),
                        None => v.clone(),
                    };
                    (k.clone(), cv)
                })
                .collect();
            Value::Object(converted)
        }
        (Some("array"), Value::String(s)) => {
            let items = schema.get("items");
            let parts = s
                .split(',')
                .filter(|p| !p.is_empty())
                .map(|p| convert_primitive(p.trim(), items))
                .collect();
            Value::Array(parts)
        }
        (Some("array"), Value::Array(arr)) => {
            let items = schema.get("items");
            match items {
                Some(item_schema) => {
                    Value::Array(arr.iter().map(|v| coerce(item_schema, v)).collect())
                }
                None => input.clone(),
            }
        }
        (Some("integer" | "number" | "boolean"), Value::String(s)) => {
            convert_primitive(s, Some(schema))
        }
        _ => input.clone(),
    }
}

fn issue_code(kind: &ValidationErrorKind) -> &'static str {
    match kind {
        ValidationErrorKind::Required { .. } => "required",
        ValidationErrorKind::Type { .. } => "invalid_type",
        ValidationErrorKind::Pattern { .. } => "pattern",
        ValidationErrorKind::Format { .. } => "format",
        ValidationErrorKind::Enum { .. } => "enum",
        ValidationErrorKind::Minimum { .. } | ValidationErrorKind::ExclusiveMinimum { .. } => {
            "minimum"
        }
        ValidationErrorKind::Maximum { .. } | ValidationErrorKind::ExclusiveMaximum { .. } => {
            "maximum"
        }
        ValidationErrorKind::MinLength { .. } => "min_length",
        ValidationErrorKind::MaxLength { .. } => "max_length",
        ValidationErrorKind::MinItems { .. } => "min_items",
        ValidationErrorKind::MaxItems { .. } => "max_items",
        ValidationErrorKind::AdditionalProperties { .. } => "additional_properties",
        ValidationErrorKind::MultipleOf { .. } => "multiple_of",
        _ => "invalid",
    }
}

fn issue_field(facet: Facet, pointer: &str) -> String {
    if pointer.is_empty() {
        facet.as_str().to_string()
    } else {
        format!("{}{}", facet.as_str(), pointer.replace('/', "."))
    }
}

/// Map one engine error to the wire-shape issue, with the `field` path
/// rooted at the facet name.
pub(crate) fn issue_from_error(facet: Facet, error: &ValidationError<'_>) -> ValidationIssue {
    ValidationIssue::new(
        issue_field(facet, &error.instance_path.to_string()),
        issue_code(&error.kind),
        error.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_integer_string() {
        let schema = json!({ "type": "integer" });
        assert_eq!(coerce(&schema, &json!("42")), json!(42));
    }

    #[test]
    fn test_coerce_object_properties() {
        let schema = json!({
            "type": "object",
            "properties": {
                "limit": { "type": "integer" },
                "active": { "type": "boolean" },
                "name": { "type": "string" }
            }
        });
        let input = json!({ "limit": "10", "active": "true", "name": "bob" });
        let out = coerce(&schema, &input);
        assert_eq!(out, json!({ "limit": 10, "active": true, "name": "bob" }));
    }

    #[test]
    fn test_coerce_array_from_csv() {
        let schema = json!({ "type": "array", "items": { "type": "integer" } });
        assert_eq!(coerce(&schema, &json!("1,2,3")), json!([1, 2, 3]));
    }

    #[test]
    fn test_coerce_unparseable_left_for_validator() {
        let schema = json!({ "type": "integer" });
        assert_eq!(coerce(&schema, &json!("abc")), json!("abc"));
    }

    #[test]
    fn test_issue_field_paths() {
        assert_eq!(issue_field(Facet::Params, ""), "params");
        assert_eq!(issue_field(Facet::Params, "/name"), "params.name");
        assert_eq!(
            issue_field(Facet::Body, "/items/0/price"),
            "body.items.0.price"
        );
    }
}
