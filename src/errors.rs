//! Errors shared by the ledger and the vault.
//!
//! Both contracts revert with the same enum so that a failure raised inside
//! the ledger reaches vault callers under an identical code.

use odra::prelude::*;

/// Reasons an entry point reverts.
#[odra::odra_error]
pub enum YieldError {
    /// Caller is not the administrator or lacks the mint/burn capability.
    Unauthorized = 1,
    /// New global rate is not strictly lower than the current one.
    RateCanOnlyDecrease = 2,
    InsufficientBalance = 3,
    InsufficientAllowance = 4,
    /// Zero or out-of-range amount where a positive amount is required.
    InvalidAmount = 5,
    /// Vault could not pay out the reserve asset; the burn is rolled back.
    RedemptionTransferFailed = 6,
    LedgerNotSet = 7,
}
