//! Transfer pipeline stages
//!
//! ```text
//! VALIDATING → RESOLVING → EXECUTING → RECORDING → DONE
//!      ↓           ↓           ↓           ↓
//!                      REJECTED
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferStage {
    /// Request shape checks
    Validating,
    /// Source bank, caller account and route
    Resolving,
    /// Ledger movement (local) or registry resolution (remote)
    Executing,
    /// Appending the transfer record
    Recording,
    /// Terminal: response sent with 201
    Done,
    /// Terminal: request refused
    Rejected,
}

impl TransferStage {
    /// Enter `Rejected`, returning the stage the request failed in
    pub fn reject(&mut self) -> TransferStage {
        std::mem::replace(self, TransferStage::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStage::Validating => "VALIDATING",
            TransferStage::Resolving => "RESOLVING",
            TransferStage::Executing => "EXECUTING",
            TransferStage::Recording => "RECORDING",
            TransferStage::Done => "DONE",
            TransferStage::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
