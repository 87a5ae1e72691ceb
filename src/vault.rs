//! Reserve Vault
//!
//! Custodies native CSPR 1:1 against ledger units.
//! - `deposit` takes the attached CSPR and mints the same number of ledger
//!   units to the caller, pinning the caller's rate to the global rate
//! - `fund_reserve` adds CSPR to the reserve without minting anything
//! - `redeem` burns ledger units and pays the same number of motes back
//!
//! Accrued interest is minted by the ledger without reserve backing, so the
//! reserve may not cover a full-balance redemption. That payout failure
//! reverts the whole call, burn included.
//!
//! ## Units
//! - CSPR: motes (U512)
//! - ledger units: U256, 1 unit per mote

use odra::casper_types::{U256, U512};
use odra::prelude::*;
use odra::ContractRef;

use crate::errors::YieldError;
use crate::ledger::InterestLedgerContractRef;

pub mod events {
    use odra::casper_types::{U256, U512};
    use odra::prelude::*;

    #[odra::event]
    pub struct Deposited {
        pub account: Address,
        pub amount: U256,
    }

    #[odra::event]
    pub struct ReserveFunded {
        pub funder: Address,
        pub amount: U512,
    }

    #[odra::event]
    pub struct Redeemed {
        pub account: Address,
        pub amount: U256,
    }
}

#[odra::module(events = [events::Deposited, events::ReserveFunded, events::Redeemed], errors = YieldError)]
pub struct ReserveVault {
    ledger: Var<Address>,
    total_deposited: Var<U512>,
    total_funded: Var<U512>,
    total_redeemed: Var<U512>,
}

#[odra::module]
impl ReserveVault {
    /// Initialize the vault against a deployed ledger. The ledger's
    /// administrator must grant this vault the mint/burn capability.
    pub fn init(&mut self, ledger: Address) {
        self.ledger.set(ledger);
        self.total_deposited.set(U512::zero());
        self.total_funded.set(U512::zero());
        self.total_redeemed.set(U512::zero());
    }

    /// Deposit CSPR and receive the same amount of ledger units.
    #[odra(payable)]
    pub fn deposit(&mut self) {
        let caller = self.env().caller();
        let reserve_amount = self.env().attached_value();
        if reserve_amount.is_zero() {
            self.env().revert(YieldError::InvalidAmount);
        }
        let amount = self.motes_to_units(reserve_amount);

        self.ledger_ref().mint(caller, amount);

        let total = self.total_deposited.get_or_default();
        self.total_deposited.set(total + reserve_amount);

        self.env().emit_event(events::Deposited {
            account: caller,
            amount,
        });
    }

    /// Add CSPR to the reserve without minting ledger units, so accrued
    /// interest can be paid out on redemption.
    #[odra(payable)]
    pub fn fund_reserve(&mut self) {
        let amount = self.env().attached_value();
        if amount.is_zero() {
            self.env().revert(YieldError::InvalidAmount);
        }

        let total = self.total_funded.get_or_default();
        self.total_funded.set(total + amount);

        self.env().emit_event(events::ReserveFunded {
            funder: self.env().caller(),
            amount,
        });
    }

    /// Burn ledger units and receive the same amount of CSPR.
    /// `U256::MAX` redeems the caller's full observable balance.
    pub fn redeem(&mut self, amount: U256) {
        let caller = self.env().caller();
        let mut ledger = self.ledger_ref();

        let amount = if amount == U256::MAX {
            ledger.balance_of(caller)
        } else {
            amount
        };
        if amount.is_zero() {
            self.env().revert(YieldError::InvalidAmount);
        }
        // The ledger rejects amounts above the balance before any conversion.
        ledger.burn(caller, amount);
        let payout = self.units_to_motes(amount);

        // Reverting here also discards the burn above.
        if self.env().self_balance() < payout {
            self.env().revert(YieldError::RedemptionTransferFailed);
        }
        self.env().transfer_tokens(&caller, &payout);

        let total = self.total_redeemed.get_or_default();
        self.total_redeemed.set(total + payout);

        self.env().emit_event(events::Redeemed {
            account: caller,
            amount,
        });
    }

    // ==========================================
    // View Functions
    // ==========================================

    /// Address of the ledger this vault mints and burns on.
    pub fn ledger(&self) -> Option<Address> {
        self.ledger.get()
    }

    /// CSPR currently held in reserve
    pub fn reserve_balance(&self) -> U512 {
        self.env().self_balance()
    }

    pub fn total_deposited(&self) -> U512 {
        self.total_deposited.get_or_default()
    }

    /// CSPR added through `fund_reserve`
    pub fn total_funded(&self) -> U512 {
        self.total_funded.get_or_default()
    }

    pub fn total_redeemed(&self) -> U512 {
        self.total_redeemed.get_or_default()
    }

    // ==========================================
    // Internal Functions
    // ==========================================

    fn ledger_ref(&self) -> InterestLedgerContractRef {
        let ledger = self
            .ledger
            .get()
            .unwrap_or_else(|| self.env().revert(YieldError::LedgerNotSet));
        InterestLedgerContractRef::new(self.env().clone(), ledger)
    }

    fn motes_to_units(&self, motes: U512) -> U256 {
        if motes > U512::from(u128::MAX) {
            self.env().revert(YieldError::InvalidAmount);
        }
        U256::from(motes.as_u128())
    }

    fn units_to_motes(&self, units: U256) -> U512 {
        if units > U256::from(u128::MAX) {
            self.env().revert(YieldError::InvalidAmount);
        }
        U512::from(units.as_u128())
    }
}
