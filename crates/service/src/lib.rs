//! Service layer for the Chatter forum, comment, flag and file services.
//! - Routes tagged requests to closed operation sets with up-front validation.
//! - Executes cursor-paginated index queries over a narrow entity store.
//! - Wraps every outcome in a uniform response envelope.

pub mod errors;
pub mod validation;
pub mod storage;
pub mod repository;
pub mod pagination;
pub mod operation;
pub mod request;
pub mod response;
pub mod dispatch;
pub mod info;
pub mod services;
pub mod registry;
pub mod runtime;
#[cfg(test)]
pub mod test_support;
#[cfg(test)]
mod tests;

pub use errors::{FailureKind, ServiceError};
pub use registry::ServiceRegistry;
pub use request::ServiceRequest;
pub use response::ServiceResponse;
