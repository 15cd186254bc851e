pub mod access;
pub mod api;
pub mod config;
pub mod index;
pub mod models;
pub mod projection;
pub mod service;
pub mod sources;
pub mod timeline;

pub use access::{resolve_scope, AccessScope, RequesterContext, RequesterRole};
pub use index::{CompositeId, RecordIndexEntry};
pub use service::RecordService;
pub use sources::SqliteStore;
pub use timeline::{MedicalRecord, RecordError};
