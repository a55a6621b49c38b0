//! Request routing: tag -> operation -> validation -> handler -> envelope.

use async_trait::async_trait;
use tracing::{error, info, info_span, Instrument};

use crate::errors::ServiceError;
use crate::operation::Operation;
use crate::request::ServiceRequest;
use crate::response::{Outcome, ServiceResponse};
use crate::validation::{validate, ArgReader};

/// Business logic of one service, keyed by its closed operation enum.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    type Op: Operation;

    /// Service name used in logs and metrics.
    const SERVICE: &'static str;

    /// Run a routed, validated operation.
    async fn execute(&self, op: Self::Op, args: ArgReader<'_>) -> Result<Outcome, ServiceError>;
}

/// Resolve an operation tag. Absent or blank is distinct from unknown.
pub fn route<O: Operation>(tag: Option<&str>) -> Result<O, ServiceError> {
    let tag = tag.filter(|t| !t.trim().is_empty()).ok_or(ServiceError::MissingOperation)?;
    O::from_tag(tag).ok_or_else(|| ServiceError::UnsupportedOperation(tag.to_string()))
}

async fn run<H: OperationHandler>(handler: &H, request: &ServiceRequest) -> Result<Outcome, ServiceError> {
    let op = route::<H::Op>(request.operation.as_deref())?;
    validate(request.args.as_ref(), op.required_fields())?;
    handler.execute(op, ArgReader::new(request.args.as_ref())).await
}

/// Produce exactly one envelope for a request. Failures are logged once here.
pub async fn dispatch<H: OperationHandler>(handler: &H, request: &ServiceRequest) -> ServiceResponse {
    let operation = request.operation.as_deref().unwrap_or("-");
    let span = info_span!("dispatch", service = H::SERVICE, operation = %operation);
    async move {
        info!(request_timestamp = ?request.request_timestamp, "request_received");
        match run(handler, request).await {
            Ok(outcome) => {
                info!(has_payload = outcome.payload.is_some(), "request_completed");
                ServiceResponse::success(outcome)
            }
            Err(err) => {
                let response = ServiceResponse::failure(&err);
                error!(
                    kind = %err.kind(),
                    code = err.code(),
                    detail = response.failure_detail.as_deref().unwrap_or_default(),
                    "request_failed"
                );
                response
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use crate::operation::operations;
    use crate::test_support::request;
    use crate::validation::FieldSpec;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    operations! {
        enum EchoOperation {
            Echo => "ECHO" [FieldSpec::str("text")],
            Ping => "PING" [],
        }
    }

    #[derive(Default)]
    struct Echo {
        executed: AtomicUsize,
    }

    #[async_trait]
    impl OperationHandler for Echo {
        type Op = EchoOperation;
        const SERVICE: &'static str = "echo";

        async fn execute(&self, op: EchoOperation, args: ArgReader<'_>) -> Result<Outcome, ServiceError> {
            self.executed.fetch_add(1, Ordering::SeqCst);
            match op {
                EchoOperation::Echo => Outcome::with_payload(&args.str("text")?),
                EchoOperation::Ping => Ok(Outcome::empty()),
            }
        }
    }

    fn kind_of(resp: &ServiceResponse) -> Option<String> {
        resp.failure_detail.as_ref().and_then(|d| d.lines().nth(1)).map(str::to_string)
    }

    #[test]
    fn route_distinguishes_missing_from_unsupported() {
        assert!(matches!(route::<EchoOperation>(None), Err(ServiceError::MissingOperation)));
        assert!(matches!(route::<EchoOperation>(Some("  ")), Err(ServiceError::MissingOperation)));
        assert!(matches!(
            route::<EchoOperation>(Some("SHOUT")),
            Err(ServiceError::UnsupportedOperation(t)) if t == "SHOUT"
        ));
        assert_eq!(route::<EchoOperation>(Some("ECHO")).ok(), Some(EchoOperation::Echo));
    }

    #[tokio::test]
    async fn missing_operation_never_reaches_handler() {
        let echo = Echo::default();
        let resp = dispatch(&echo, &ServiceRequest::default()).await;
        assert!(resp.failure_occurred && resp.payload.is_none());
        assert_eq!(kind_of(&resp), Some(format!("kind: {} (code 1001)", FailureKind::MissingOperation)));
        assert_eq!(echo.executed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn validation_runs_before_handler() {
        let echo = Echo::default();
        let resp = dispatch(&echo, &request("ECHO", json!({"text": ""}))).await;
        assert!(resp.failure_occurred);
        assert_eq!(echo.executed.load(Ordering::SeqCst), 0);

        let resp = dispatch(&echo, &request("ECHO", json!({"text": "hi"}))).await;
        assert!(resp.success);
        assert_eq!(resp.payload, Some(json!("hi")));
    }

    #[tokio::test]
    async fn operations_without_required_fields_accept_absent_args() {
        let echo = Echo::default();
        let req = ServiceRequest { operation: Some("PING".into()), ..Default::default() };
        let resp = dispatch(&echo, &req).await;
        assert!(resp.success && !resp.failure_occurred);
    }
}
