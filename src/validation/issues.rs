use serde::Serialize;

/// One validation failure, in the wire shape clients receive under
/// `error.details`: `{"field", "type", "message"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Dotted path to the offending value, prefixed with the request facet
    /// (e.g. `params.name`, `body.items.0.price`).
    pub field: String,
    /// Issue code (`required`, `invalid_type`, `pattern`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable description from the schema engine.
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        field: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ValidationIssue {
            field: field.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }
}
