//! # Pipeline Store
//!
//! The deduplicating job store (C2): a Postgres-backed [`store::JobStore`] keyed on
//! `content_hash`, race-safe against concurrent inserts of the same job.

pub mod pool;
pub mod record;
pub mod store;

pub use pool::{create_pool, DatabasePool};
pub use record::{AddOutcome, StatusCount, StoredJobRecord, StoreStats};
pub use store::{JobStore, PostgresJobStore};

pub mod prelude {
    pub use crate::pool::DatabasePool;
    pub use crate::record::{AddOutcome, StoredJobRecord, StoreStats};
    pub use crate::store::{JobStore, PostgresJobStore};
}
