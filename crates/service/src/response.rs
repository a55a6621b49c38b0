//! Uniform response envelope
//!
//! A failed envelope never carries a payload, and `success` and
//! `failureOccurred` are never both true.

use std::error::Error as _;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{FailureKind, ServiceError};
use crate::storage::StoreError;

pub const SUCCESS_MESSAGE: &str = "Chatter service operation completed successfully!";
pub const NOT_FOUND_MESSAGE: &str = "Chatter service operation completed: no matching record";
pub const FAILURE_HEADER: &str = "***** Chatter service operation failed *****";

pub fn failure_message(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::MissingOperation => "Request did not specify an operation",
        FailureKind::UnsupportedOperation => "Operation is not supported by this service",
        FailureKind::ValidationFailure => "Request arguments failed validation",
        FailureKind::StoreFailure => "The backing store failed the request",
        FailureKind::PropertyRetrievalFailure => "A required service property could not be retrieved",
    }
}

/// Result of a successful handler run.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub payload: Option<Value>,
    pub message: &'static str,
}

impl Outcome {
    pub fn with_payload<T: Serialize>(payload: &T) -> Result<Self, ServiceError> {
        let value = serde_json::to_value(payload).map_err(|e| StoreError::Encoding(e.to_string()))?;
        Ok(Self { payload: Some(value), message: SUCCESS_MESSAGE })
    }

    pub fn empty() -> Self { Self { payload: None, message: SUCCESS_MESSAGE } }

    pub fn not_found() -> Self { Self { payload: None, message: NOT_FOUND_MESSAGE } }

    /// Payload when present, otherwise a not-found outcome that is still a success.
    pub fn found<T: Serialize>(payload: Option<T>) -> Result<Self, ServiceError> {
        match payload {
            Some(p) => Self::with_payload(&p),
            None => Ok(Self::not_found()),
        }
    }

    pub fn deleted(existed: bool) -> Self {
        let message = if existed { SUCCESS_MESSAGE } else { NOT_FOUND_MESSAGE };
        Self { payload: Some(Value::Bool(existed)), message }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    pub payload: Option<Value>,
    pub success: bool,
    pub message: String,
    pub failure_occurred: bool,
    pub failure_detail: Option<String>,
}

impl ServiceResponse {
    pub fn success(outcome: Outcome) -> Self {
        Self {
            payload: outcome.payload,
            success: true,
            message: outcome.message.to_string(),
            failure_occurred: false,
            failure_detail: None,
        }
    }

    pub fn failure(err: &ServiceError) -> Self {
        Self {
            payload: None,
            success: false,
            message: failure_message(err.kind()).to_string(),
            failure_occurred: true,
            failure_detail: Some(failure_trace(err)),
        }
    }
}

/// Deterministic multi-line trace: header, kind and code, the error, then its causes.
pub fn failure_trace(err: &ServiceError) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{FAILURE_HEADER}");
    let _ = writeln!(out, "kind: {} (code {})", err.kind(), err.code());
    let _ = write!(out, "error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(out, "\ncaused by: {cause}");
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;
    use serde_json::json;

    #[test]
    fn failure_envelope_has_no_payload() {
        let err = ServiceError::MissingOperation;
        let resp = ServiceResponse::failure(&err);
        assert!(resp.payload.is_none());
        assert!(!resp.success && resp.failure_occurred);
        assert_eq!(resp.message, failure_message(FailureKind::MissingOperation));
    }

    #[test]
    fn trace_is_deterministic_and_lists_causes() {
        let err = ServiceError::Validation(ValidationError::MissingField("title".into()));
        let trace = failure_trace(&err);
        assert_eq!(trace, failure_trace(&err));
        let lines: Vec<&str> = trace.lines().collect();
        assert_eq!(lines[0], FAILURE_HEADER);
        assert_eq!(lines[1], "kind: ValidationFailure (code 1003)");
        assert!(lines[2].starts_with("error: validation failed"));
        assert_eq!(lines[3], "caused by: required argument `title` is missing or empty");
    }

    #[test]
    fn success_envelope_serializes_with_wire_names() {
        let resp = ServiceResponse::success(Outcome::deleted(false));
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            v,
            json!({
                "payload": false,
                "success": true,
                "message": NOT_FOUND_MESSAGE,
                "failureOccurred": false,
                "failureDetail": null
            })
        );
    }

    #[test]
    fn absent_payload_is_success_not_failure() {
        let resp = ServiceResponse::success(Outcome::found::<u8>(None).unwrap());
        assert!(resp.success && !resp.failure_occurred);
        assert!(resp.payload.is_none());
    }
}
