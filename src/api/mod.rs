//! HTTP surface over the record service. Requester identity arrives in
//! headers, scoping happens in the service layer, and every error maps
//! to a structured JSON body with a stable code.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::records_api_router;
pub use server::{start_records_server, RecordsServer};
pub use types::ApiContext;
