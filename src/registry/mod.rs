//! Remote Bank Registry
//!
//! Cached view of the central bank directory, keyed by the 3-character bank
//! prefix of an account number. Refreshed on cache miss (single-flight) and
//! optionally on a timer.

pub mod directory;
pub mod refresher;
pub mod snapshot;
pub mod store;
pub mod types;
pub mod worker;

pub use directory::{CentralDirectory, DirectoryError, FixtureDirectory, HttpCentralDirectory};
pub use refresher::{RefreshFailure, RefreshOutcome, RegistryRefresher};
pub use snapshot::{RegistrySnapshot, RemoteBankRegistry, ReplaceSummary};
pub use store::{MemorySnapshotStore, PgSnapshotStore, SnapshotStore};
pub use types::{EntryRejection, RemoteBank};
pub use worker::RegistrySyncWorker;
