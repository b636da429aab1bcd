mod health;
mod object_created;
mod query;
mod response;
mod tenants;

pub use health::health_handler;
pub use object_created::{ObjectCreatedEvent, object_created_handler};
pub use query::{query_handler, query_stream_handler};
pub use response::{
    ErrorKind, ResponseEnvelope, build_error_response, build_response, error_response,
};
pub use tenants::{check_quota_handler, get_tenant_handler, spend_handler};
