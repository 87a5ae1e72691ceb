//! Reserve Ledger x Casper — Interest-Accruing Ledger and Reserve Vault (Odra)
//!
//! - InterestLedger: CEP-18 token whose balances grow linearly at a per-holder
//!   rate, with a global rate that can only be lowered
//! - ReserveVault: mints ledger units 1:1 against deposited CSPR and burns them
//!   on redemption
//! - CapabilityGate: administrator and mint/burn capability checks

#![cfg_attr(target_arch = "wasm32", no_std)]

extern crate alloc;

pub mod accrual;
pub mod capability;
pub mod errors;
pub mod ledger;
pub mod vault;
