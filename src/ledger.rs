//! Interest-Accruing Ledger
//!
//! A CEP-18 token whose stored balances are *principal*. What `balance_of`
//! reports is principal grown linearly at the holder's personal rate since
//! the holder's last reconciliation.
//!
//! - Every mutating entry point reconciles each account it touches first:
//!   pending interest is folded into principal and the accrual clock restarts.
//! - `mint` pins the recipient's personal rate to the current global rate.
//! - A transfer into a zero balance copies the *sender's* personal rate,
//!   which may be older (higher) than the current global rate.
//! - The global rate can only go down, and only the administrator moves it.
//!
//! ## Units
//! - balances: U256, 18 decimals
//! - rates: per second, scaled by 1e18
//! - time: block seconds

use alloc::string::String;
use odra::casper_types::U256;
use odra::prelude::*;
use odra_modules::cep18::events::{
    Burn, DecreaseAllowance, IncreaseAllowance, Mint, SetAllowance, Transfer, TransferFrom,
};
use odra_modules::cep18::storage::{
    Cep18AllowancesStorage, Cep18BalancesStorage, Cep18DecimalsStorage, Cep18NameStorage,
    Cep18SymbolStorage, Cep18TotalSupplyStorage,
};

use crate::accrual;
use crate::capability::{events::CapabilityGranted, CapabilityGate};
use crate::errors::YieldError;

const DECIMALS: u8 = 18;

pub mod events {
    use odra::casper_types::U256;
    use odra::prelude::*;

    #[odra::event]
    pub struct RateChanged {
        pub previous_rate: U256,
        pub new_rate: U256,
    }

    #[odra::event]
    pub struct InterestAccrued {
        pub account: Address,
        pub interest: U256,
        pub new_principal: U256,
    }

    /// `adopted_from` is the sender when the rate was copied on transfer,
    /// `None` when it was pinned to the global rate by a mint.
    #[odra::event]
    pub struct PersonalRateSet {
        pub account: Address,
        pub rate: U256,
        pub adopted_from: Option<Address>,
    }
}

#[odra::module(
    events = [
        Mint,
        Burn,
        SetAllowance,
        IncreaseAllowance,
        DecreaseAllowance,
        Transfer,
        TransferFrom,
        events::RateChanged,
        events::InterestAccrued,
        events::PersonalRateSet,
        CapabilityGranted
    ],
    errors = YieldError
)]
pub struct InterestLedger {
    name: SubModule<Cep18NameStorage>,
    symbol: SubModule<Cep18SymbolStorage>,
    decimals: SubModule<Cep18DecimalsStorage>,
    total_supply: SubModule<Cep18TotalSupplyStorage>,
    // Principal only; accrued interest lives here after reconciliation.
    balances: SubModule<Cep18BalancesStorage>,
    allowances: SubModule<Cep18AllowancesStorage>,

    personal_rate: Mapping<Address, U256>,
    // Absent = never touched.
    last_accrual: Mapping<Address, u64>,
    global_rate: Var<U256>,

    gate: SubModule<CapabilityGate>,
}

#[odra::module]
impl InterestLedger {
    /// Initialize the ledger. The deployer becomes the administrator.
    pub fn init(&mut self, name: String, symbol: String, initial_rate: U256) {
        self.name.set(name);
        self.symbol.set(symbol);
        self.decimals.set(DECIMALS);
        self.total_supply.set(U256::zero());
        self.allowances.init();
        self.balances.init();
        self.global_rate.set(initial_rate);
        let deployer = self.env().caller();
        self.gate.init(deployer);
    }

    // ==========================================
    // Token metadata
    // ==========================================

    /// Token name
    pub fn name(&self) -> String {
        self.name.get()
    }

    /// Token symbol
    pub fn symbol(&self) -> String {
        self.symbol.get()
    }

    /// Token decimals
    pub fn decimals(&self) -> u8 {
        self.decimals.get()
    }

    /// Recorded principal across all holders (excludes uncrystallized interest).
    pub fn total_supply(&self) -> U256 {
        self.total_supply.get()
    }

    // ==========================================
    // Balance and rate queries
    // ==========================================

    /// Observable balance: principal plus interest pending since the last touch.
    pub fn balance_of(&self, owner: Address) -> U256 {
        self.observable_balance(&owner, self.now())
    }

    /// Recorded principal, without pending interest.
    pub fn principal_balance_of(&self, owner: Address) -> U256 {
        self.principal_of(&owner)
    }

    /// Rate new mints are pinned to
    pub fn global_rate(&self) -> U256 {
        self.global_rate.get_or_default()
    }

    /// Rate the holder's balance currently accrues at
    pub fn personal_rate(&self, owner: Address) -> U256 {
        self.personal_rate.get(&owner).unwrap_or_default()
    }

    /// Block second of the last reconciliation, `None` if never touched.
    pub fn last_accrual_time(&self, owner: Address) -> Option<u64> {
        self.last_accrual.get(&owner)
    }

    /// Allowance from owner to spender
    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get_or_default(&owner, &spender)
    }

    // ==========================================
    // Transfers and allowances
    // ==========================================

    /// Transfer `amount` to `recipient`; `U256::MAX` moves the full balance.
    pub fn transfer(&mut self, recipient: Address, amount: U256) {
        let sender = self.env().caller();
        let now = self.now();
        let amount = self.settle_pair(&sender, &recipient, amount, now);
        self.move_principal(&sender, &recipient, amount);
        self.env().emit_event(Transfer {
            sender,
            recipient,
            amount,
        });
    }

    /// Transfer on behalf of `owner`, consuming the caller's allowance.
    /// An allowance of `U256::MAX` is never decremented.
    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        let spender = self.env().caller();
        let now = self.now();
        let amount = self.settle_pair(&owner, &recipient, amount, now);
        self.spend_allowance(&owner, &spender, amount);
        self.move_principal(&owner, &recipient, amount);
        self.env().emit_event(TransferFrom {
            spender,
            owner,
            recipient,
            amount,
        });
    }

    /// Approve spender
    pub fn approve(&mut self, spender: Address, amount: U256) {
        let owner = self.env().caller();
        self.allowances.set(&owner, &spender, amount);
        self.env().emit_event(SetAllowance {
            owner,
            spender,
            allowance: amount,
        });
    }

    /// Increase allowance
    pub fn increase_allowance(&mut self, spender: Address, amount: U256) {
        let owner = self.env().caller();
        let allowance = self.allowances.get_or_default(&owner, &spender);
        let new_allowance = allowance.saturating_add(amount);
        self.allowances.set(&owner, &spender, new_allowance);
        self.env().emit_event(IncreaseAllowance {
            owner,
            spender,
            allowance: new_allowance,
            inc_by: amount,
        });
    }

    /// Decrease allowance
    pub fn decrease_allowance(&mut self, spender: Address, amount: U256) {
        let owner = self.env().caller();
        let allowance = self.allowances.get_or_default(&owner, &spender);
        let new_allowance = allowance.saturating_sub(amount);
        self.allowances.set(&owner, &spender, new_allowance);
        self.env().emit_event(DecreaseAllowance {
            owner,
            spender,
            allowance: new_allowance,
            decr_by: amount,
        });
    }

    // ==========================================
    // Mint / burn (capability holders only)
    // ==========================================

    /// Mint `amount` to `to` and pin its personal rate to the global rate.
    pub fn mint(&mut self, to: Address, amount: U256) {
        self.gate.require_mint_burn_capability();
        let now = self.now();
        self.reconcile(&to, now);

        let rate = self.global_rate.get_or_default();
        self.personal_rate.set(&to, rate);
        self.env().emit_event(events::PersonalRateSet {
            account: to,
            rate,
            adopted_from: None,
        });

        if !amount.is_zero() {
            self.balances.add(&to, amount);
            self.total_supply.add(amount);
        }
        self.env().emit_event(Mint {
            recipient: to,
            amount,
        });
    }

    /// Burn `amount` of `from`'s reconciled principal.
    pub fn burn(&mut self, from: Address, amount: U256) {
        self.gate.require_mint_burn_capability();
        let now = self.now();
        self.reconcile(&from, now);

        if amount > self.principal_of(&from) {
            self.env().revert(YieldError::InsufficientBalance);
        }
        if !amount.is_zero() {
            self.balances.subtract(&from, amount);
            self.total_supply.subtract(amount);
        }
        self.env().emit_event(Burn {
            owner: from,
            amount,
        });
    }

    // ==========================================
    // Admin Functions
    // ==========================================

    /// Lower the global rate. Existing holders keep their personal rates.
    pub fn set_global_rate(&mut self, new_rate: U256) {
        self.gate.require_administrator();
        let previous_rate = self.global_rate.get_or_default();
        if new_rate >= previous_rate {
            self.env().revert(YieldError::RateCanOnlyDecrease);
        }
        self.global_rate.set(new_rate);
        self.env().emit_event(events::RateChanged {
            previous_rate,
            new_rate,
        });
    }

    /// Grant the mint/burn capability (administrator only)
    pub fn grant_mint_burn_capability(&mut self, account: Address) {
        self.gate.grant_mint_burn_capability(account);
    }

    /// Get the administrator
    pub fn administrator(&self) -> Option<Address> {
        self.gate.administrator()
    }

    /// Check if account is the administrator
    pub fn is_administrator(&self, account: Address) -> bool {
        self.gate.is_administrator(&account)
    }

    /// Check if account may mint and burn
    pub fn has_mint_burn_capability(&self, account: Address) -> bool {
        self.gate.has_mint_burn_capability(&account)
    }

    // ==========================================
    // Internal Functions
    // ==========================================

    fn now(&self) -> u64 {
        accrual::block_time_secs(self.env().get_block_time())
    }

    fn principal_of(&self, owner: &Address) -> U256 {
        self.balances.get(owner).unwrap_or_default()
    }

    fn observable_balance(&self, owner: &Address, now: u64) -> U256 {
        let principal = self.principal_of(owner);
        match self.last_accrual.get(owner) {
            None => principal,
            Some(last) => {
                let rate = self.personal_rate.get(owner).unwrap_or_default();
                accrual::accrued_balance(principal, rate, now.saturating_sub(last))
            }
        }
    }

    /// Fold pending interest into principal and restart the accrual clock.
    fn reconcile(&mut self, owner: &Address, now: u64) {
        let principal = self.principal_of(owner);
        let interest = self.observable_balance(owner, now) - principal;
        self.last_accrual.set(owner, now);

        if interest.is_zero() {
            return;
        }
        self.balances.add(owner, interest);
        self.total_supply.add(interest);
        self.env().emit_event(events::InterestAccrued {
            account: *owner,
            interest,
            new_principal: principal + interest,
        });
    }

    /// Reconcile both sides of a transfer and resolve the `U256::MAX` sentinel.
    fn settle_pair(&mut self, sender: &Address, recipient: &Address, amount: U256, now: u64) -> U256 {
        self.reconcile(sender, now);
        self.reconcile(recipient, now);
        if amount == U256::MAX {
            self.principal_of(sender)
        } else {
            amount
        }
    }

    fn spend_allowance(&mut self, owner: &Address, spender: &Address, amount: U256) {
        let allowance = self.allowances.get_or_default(owner, spender);
        if allowance < amount {
            self.env().revert(YieldError::InsufficientAllowance);
        }
        if allowance != U256::MAX {
            self.allowances.set(owner, spender, allowance - amount);
        }
    }

    /// Move reconciled principal. A recipient holding nothing adopts the
    /// sender's personal rate, not the global one.
    fn move_principal(&mut self, sender: &Address, recipient: &Address, amount: U256) {
        if amount > self.principal_of(sender) {
            self.env().revert(YieldError::InsufficientBalance);
        }

        if self.principal_of(recipient).is_zero() {
            let rate = self.personal_rate.get(sender).unwrap_or_default();
            self.personal_rate.set(recipient, rate);
            self.env().emit_event(events::PersonalRateSet {
                account: *recipient,
                rate,
                adopted_from: Some(*sender),
            });
        }

        if !amount.is_zero() {
            self.balances.subtract(sender, amount);
            self.balances.add(recipient, amount);
        }
    }
}
