//! Pank transfer engine
//!
//! Executes money transfers for the account holders of one bank, locally
//! between its own accounts or out to remote banks listed by the central
//! bank directory.
//!
//! # Modules
//!
//! - [`account`] - Accounts and the atomic balance ledger
//! - [`transfer`] - Validation, routing and the transfer coordinator
//! - [`registry`] - Cached central directory with single-flight refresh
//! - [`gateway`] - axum HTTP surface
//! - [`user_auth`] - Bearer token verification
//! - [`db`] - PostgreSQL pool and schema
//! - [`config`] / [`logging`] - Startup plumbing

pub mod account;
pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod registry;
pub mod transfer;
pub mod user_auth;

// Convenient re-exports at crate root
pub use account::{Account, AccountLedger, LedgerError, MemoryLedger};
pub use registry::{RegistryRefresher, RemoteBank, RemoteBankRegistry};
pub use transfer::{TransferCoordinator, TransferError, TransferReceipt, TransferRequest};
