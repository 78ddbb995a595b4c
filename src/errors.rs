//! Request-lifecycle error taxonomy and its translation to the uniform
//! error envelope.
//!
//! Every per-request failure funnels through [`RequestError`] before
//! serialization; internal detail stays in the logs, never in the body.

use crate::reply::{HeaderVec, ReplyKind, ReplyPayload};
use crate::validation::ValidationIssue;
use http::Method;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    /// Incoming data failed the route's request schema. Always a 400.
    #[error("request schema mismatch for {method} {url}")]
    RequestSchemaMismatch {
        method: Method,
        url: String,
        issues: Vec<ValidationIssue>,
    },

    /// The handler's payload failed its declared response schema. Always a
    /// 500: it indicates a contract bug, and the client only ever sees a
    /// generic message.
    #[error("response schema mismatch for {method} {url}")]
    ResponseSchemaMismatch {
        method: Method,
        url: String,
        issues: Vec<ValidationIssue>,
    },

    /// Request payload exceeded the configured upload limit. Always a 413.
    #[error("payload exceeds configured limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Anything else: middleware failure, handler failure, panic, missing
    /// handler. Always a 500 with no internal detail leaked.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl RequestError {
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            RequestError::RequestSchemaMismatch { .. } => 400,
            RequestError::ResponseSchemaMismatch { .. } => 500,
            RequestError::PayloadTooLarge { .. } => 413,
            RequestError::Internal(_) => 500,
        }
    }

    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            RequestError::RequestSchemaMismatch { .. } => "bad_request",
            RequestError::ResponseSchemaMismatch { .. } => "bad_response",
            RequestError::PayloadTooLarge { .. } => "file_too_large",
            RequestError::Internal(_) => "unknown_error",
        }
    }

    /// The message sent to the client. Request mismatches echo the client's
    /// own method and URL; everything server-side stays generic.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            RequestError::RequestSchemaMismatch { method, url, .. } => {
                format!("request does not match the schema for {method} {url}")
            }
            RequestError::ResponseSchemaMismatch { .. } => {
                "response violated the declared contract".to_string()
            }
            RequestError::PayloadTooLarge { limit } => {
                format!("payload exceeds the limit of {limit} bytes")
            }
            RequestError::Internal(_) => "internal server error".to_string(),
        }
    }

    /// Validation issues for the `details` array; only request mismatches
    /// expose them to the client.
    #[must_use]
    pub fn details(&self) -> Option<&[ValidationIssue]> {
        match self {
            RequestError::RequestSchemaMismatch { issues, .. } => Some(issues),
            _ => None,
        }
    }

    /// Translate into the uniform error envelope.
    #[must_use]
    pub fn to_payload(&self) -> ReplyPayload {
        let mut error = json!({
            "type": self.error_type(),
            "message": self.public_message(),
        });
        if let Some(details) = self.details() {
            error["details"] = json!(details);
        }
        ReplyPayload {
            status: self.status(),
            kind: ReplyKind::Error,
            body: json!({ "success": false, "error": error }),
            headers: HeaderVec::new(),
        }
    }
}
