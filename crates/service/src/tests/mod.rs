use std::sync::Arc;

use configs::ServiceIdentity;
use serde_json::Value;

use crate::errors::FailureKind;
use crate::registry::ServiceRegistry;
use crate::response::{failure_message, ServiceResponse};
use crate::storage::blob_store::MemoryBlobStore;
use crate::test_support::CountingStore;






pub(crate) struct Fixture {
    pub store: Arc<CountingStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub services: ServiceRegistry,
}

pub(crate) fn identity() -> ServiceIdentity {
    ServiceIdentity::new("chatter", "0.1.0", "test", "Chatter services under test")
}

pub(crate) fn fixture_with(page_limit: usize, identity: ServiceIdentity) -> Fixture {
    let store = CountingStore::fresh();
    let blobs = MemoryBlobStore::new();
    let services = ServiceRegistry::with_stores(store.clone(), blobs.clone(), page_limit, &identity);
    Fixture { store, blobs, services }
}

pub(crate) fn fixture() -> Fixture { fixture_with(20, identity()) }

/// Failure kind carried by an envelope, recovered from its message.
pub(crate) fn failure_kind(resp: &ServiceResponse) -> Option<FailureKind> {
    if !resp.failure_occurred {
        return None;
    }
    [
        FailureKind::MissingOperation,
        FailureKind::UnsupportedOperation,
        FailureKind::ValidationFailure,
        FailureKind::StoreFailure,
        FailureKind::PropertyRetrievalFailure,
    ]
    .into_iter()
    .find(|k| resp.message == failure_message(*k))
}

/// String attribute of the payload object.
pub(crate) fn payload_str(resp: &ServiceResponse, field: &str) -> String {
    resp.payload
        .as_ref()
        .and_then(|p| p.get(field))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub(crate) fn assert_success(resp: &ServiceResponse) {
    assert!(resp.success && !resp.failure_occurred, "expected success, got {resp:?}");
}
