//! Transfer execution
//!
//! # Pipeline
//!
//! ```text
//! VALIDATING → RESOLVING → EXECUTING → RECORDING → DONE
//! ```
//!
//! - **Local** (both prefixes equal the local bank prefix): one atomic ledger
//!   transfer, then a `completed` record. If the record cannot be written the
//!   movement is reversed.
//! - **Remote**: registry lookup (refresh once on miss), a `submitted`
//!   record, then a fire-and-forget hand-off to the settlement client.
//!
//! # Invariants
//!
//! 1. Balances never go negative; debit check and write are one atomic step
//! 2. Money is conserved across every completed local transfer
//! 3. A source account outside the local bank is rejected before any side effect

pub mod coordinator;
pub mod error;
pub mod settlement;
pub mod state;
pub mod store;
pub mod types;
pub mod validation;

pub use coordinator::TransferCoordinator;
pub use error::TransferError;
pub use settlement::{LoggingSettlementClient, SettlementClient, SettlementError};
pub use state::TransferStage;
pub use store::{MemoryTransferStore, PgTransferStore, TransferStore};
pub use types::{Sender, TransferReceipt, TransferRecord, TransferRequest, TransferStatus};
pub use validation::{ValidationError, validate_request};
