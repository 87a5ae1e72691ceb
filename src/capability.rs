//! Capability Gate
//!
//! Binary role checks used by the ledger:
//! - administrator: a single identity fixed at genesis, may lower the global
//!   rate and grant capabilities
//! - mint/burn capability holders: identities allowed to mint and burn
//!   ledger units (in practice the reserve vault)

use odra::prelude::*;

pub mod events {
    use odra::prelude::*;

    #[odra::event]
    pub struct CapabilityGranted {
        pub account: Address,
        pub granted_by: Address,
    }
}

#[odra::module(events = [events::CapabilityGranted])]
pub struct CapabilityGate {
    administrator: Var<Address>,
    mint_burn_holders: Mapping<Address, bool>,
}

impl CapabilityGate {
    /// Sets the administrator. Called once from the owning contract's `init`.
    pub fn init(&mut self, administrator: Address) {
        self.administrator.set(administrator);
    }

    /// Get the administrator
    pub fn administrator(&self) -> Option<Address> {
        self.administrator.get()
    }

    /// Check if identity is the administrator
    pub fn is_administrator(&self, identity: &Address) -> bool {
        self.administrator.get().as_ref() == Some(identity)
    }

    /// Check if identity may mint and burn
    pub fn has_mint_burn_capability(&self, identity: &Address) -> bool {
        self.mint_burn_holders.get(identity).unwrap_or_default()
    }

    /// Grants the mint/burn capability (administrator only).
    ///
    /// Granting to an existing holder is a no-op and emits nothing.
    pub fn grant_mint_burn_capability(&mut self, identity: Address) {
        self.require_administrator();
        if self.has_mint_burn_capability(&identity) {
            return;
        }
        self.mint_burn_holders.set(&identity, true);
        self.env().emit_event(events::CapabilityGranted {
            account: identity,
            granted_by: self.env().caller(),
        });
    }

    /// Revert with `Unauthorized` unless the caller is the administrator
    pub fn require_administrator(&self) {
        if !self.is_administrator(&self.env().caller()) {
            self.env().revert(crate::errors::YieldError::Unauthorized);
        }
    }

    /// Revert with `Unauthorized` unless the caller holds the capability
    pub fn require_mint_burn_capability(&self) {
        if !self.has_mint_burn_capability(&self.env().caller()) {
            self.env().revert(crate::errors::YieldError::Unauthorized);
        }
    }
}
