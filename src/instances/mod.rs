//! Instance management subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/instances
//!     → InstanceStore (memory or sqlite.rs; insert row, assign id)
//!     → pool.rs (connect through VmsConnector, cache client)
//!     → store.rs (record server name reported by the device)
//!
//! GET /api/instance/{id}/...
//!     → pool.rs (cached client, or lazy connect)
//!     → vms client call
//! ```

pub mod model;
pub mod pool;
pub mod sqlite;
pub mod store;

use thiserror::Error;

use crate::vms::VmsError;

pub use model::{Instance, NewInstance};
pub use pool::{ConnectedInstance, InstancePool};
pub use sqlite::SqliteStore;
pub use store::{InstanceStore, MemoryStore, StoreError, StoreFuture};

/// Failures while resolving a connected instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("Instance not found")]
    NotFound(i64),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Vms(#[from] VmsError),
}
