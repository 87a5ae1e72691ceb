//! Fixed-point accrual arithmetic.
//!
//! Rates are per-second values scaled by [`SCALE`]. Growth over one
//! uninterrupted period is linear:
//!
//! ```text
//! balance = principal * (SCALE + rate * elapsed) / SCALE
//!         = principal + principal * rate * elapsed / SCALE
//! ```
//!
//! Compounding only happens across reconciliations, when the pending
//! interest is folded into principal and a new linear period starts.

use odra::casper_types::U256;

/// 1e18, the fixed-point scale of every rate.
pub const SCALE: u128 = 1_000_000_000_000_000_000;

/// Odra block time is reported in milliseconds.
pub const MILLIS_PER_SECOND: u64 = 1_000;

/// Whole seconds elapsed for a block time given in milliseconds.
pub fn block_time_secs(block_time_ms: u64) -> u64 {
    block_time_ms / MILLIS_PER_SECOND
}

/// Interest earned by `principal` over `elapsed` seconds at `rate`.
///
/// An overflowing product yields no interest rather than a wrapped value,
/// so the observable balance never drops below principal.
pub fn pending_interest(principal: U256, rate: U256, elapsed: u64) -> U256 {
    principal
        .checked_mul(rate)
        .and_then(|x| x.checked_mul(U256::from(elapsed)))
        .map(|x| x / U256::from(SCALE))
        .unwrap_or_default()
}

/// Principal plus the linear interest of one period.
pub fn accrued_balance(principal: U256, rate: U256, elapsed: u64) -> U256 {
    principal.saturating_add(pending_interest(principal, rate, elapsed))
}
