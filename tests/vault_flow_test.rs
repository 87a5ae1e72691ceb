//! Reserve Vault Tests
//!
//! Deposit / redeem flows against a live ledger.

use odra::casper_types::{U256, U512};
use odra::host::{Deployer, HostEnv, HostRef};
use odra::prelude::*;

use reserve_ledger_casper::errors::YieldError;
use reserve_ledger_casper::ledger::{InterestLedger, InterestLedgerHostRef, InterestLedgerInitArgs};
use reserve_ledger_casper::vault::events::{Deposited, Redeemed, ReserveFunded};
use reserve_ledger_casper::vault::{ReserveVault, ReserveVaultHostRef, ReserveVaultInitArgs};

const MOTES_PER_CSPR: u64 = 1_000_000_000;
const RATE: u64 = 50_000_000_000;
const LOWER_RATE: u64 = 20_000_000_000;
const HOUR_MS: u64 = 3_600_000;

fn cspr_to_motes(cspr: u64) -> U512 {
    U512::from(cspr) * U512::from(MOTES_PER_CSPR)
}

fn cspr_to_units(cspr: u64) -> U256 {
    U256::from(cspr) * U256::from(MOTES_PER_CSPR)
}

fn units_to_motes(units: U256) -> U512 {
    U512::from(units.as_u128())
}

// ==========================================
// Helper: Deploy contracts
// ==========================================

fn deploy_ledger(env: &HostEnv) -> InterestLedgerHostRef {
    env.set_caller(env.get_account(0));
    InterestLedger::deploy(
        env,
        InterestLedgerInitArgs {
            name: "Reserve Yield CSPR".to_string(),
            symbol: "ryCSPR".to_string(),
            initial_rate: U256::from(RATE),
        },
    )
}

fn deploy_contracts(env: &HostEnv) -> (InterestLedgerHostRef, ReserveVaultHostRef) {
    let mut ledger = deploy_ledger(env);
    let vault = ReserveVault::deploy(
        env,
        ReserveVaultInitArgs {
            ledger: ledger.address(),
        },
    );
    ledger.grant_mint_burn_capability(vault.address());
    (ledger, vault)
}

// ==========================================
// Deposit
// ==========================================

#[test]
fn test_deposit_mints_units_one_to_one() {
    let env = odra_test::env();
    let (ledger, mut vault) = deploy_contracts(&env);
    let user = env.get_account(1);

    env.set_caller(user);
    vault.with_tokens(cspr_to_motes(100)).deposit();

    assert_eq!(ledger.principal_balance_of(user), cspr_to_units(100));
    assert_eq!(ledger.balance_of(user), cspr_to_units(100));
    assert_eq!(ledger.personal_rate(user), U256::from(RATE));
    assert_eq!(vault.reserve_balance(), cspr_to_motes(100));
    assert_eq!(vault.total_deposited(), cspr_to_motes(100));
    assert!(env.emitted_event(
        &vault,
        Deposited {
            account: user,
            amount: cspr_to_units(100),
        }
    ));
}

#[test]
fn test_deposit_zero_reverts() {
    let env = odra_test::env();
    let (_, mut vault) = deploy_contracts(&env);

    env.set_caller(env.get_account(1));
    assert_eq!(
        vault.with_tokens(U512::zero()).try_deposit(),
        Err(YieldError::InvalidAmount.into())
    );
}

#[test]
#[should_panic(expected = "Unauthorized")]
fn test_deposit_without_vault_capability_reverts() {
    let env = odra_test::env();
    let ledger = deploy_ledger(&env);
    let mut vault = ReserveVault::deploy(
        &env,
        ReserveVaultInitArgs {
            ledger: ledger.address(),
        },
    );

    env.set_caller(env.get_account(1));
    vault.with_tokens(cspr_to_motes(10)).deposit();
}

#[test]
fn test_rate_lowered_between_deposits() {
    let env = odra_test::env();
    let (mut ledger, mut vault) = deploy_contracts(&env);
    let first = env.get_account(1);
    let second = env.get_account(2);

    env.set_caller(first);
    vault.with_tokens(cspr_to_motes(100)).deposit();

    env.set_caller(env.get_account(0));
    ledger.set_global_rate(U256::from(LOWER_RATE));

    env.set_caller(second);
    vault.with_tokens(cspr_to_motes(100)).deposit();

    assert_eq!(ledger.personal_rate(first), U256::from(RATE));
    assert_eq!(ledger.personal_rate(second), U256::from(LOWER_RATE));

    // Topping up re-pins the first depositor to the lower rate
    env.set_caller(first);
    vault.with_tokens(cspr_to_motes(1)).deposit();
    assert_eq!(ledger.personal_rate(first), U256::from(LOWER_RATE));
}

// ==========================================
// Redeem
// ==========================================

#[test]
fn test_deposit_then_redeem_max_round_trip() {
    let env = odra_test::env();
    let (ledger, mut vault) = deploy_contracts(&env);
    let user = env.get_account(1);

    env.set_caller(user);
    vault.with_tokens(cspr_to_motes(100)).deposit();
    vault.redeem(U256::MAX);

    assert_eq!(ledger.balance_of(user), U256::zero());
    assert_eq!(ledger.total_supply(), U256::zero());
    assert_eq!(vault.reserve_balance(), U512::zero());
    assert_eq!(vault.total_redeemed(), cspr_to_motes(100));
    assert!(env.emitted_event(
        &vault,
        Redeemed {
            account: user,
            amount: cspr_to_units(100),
        }
    ));
}

#[test]
fn test_partial_redeem() {
    let env = odra_test::env();
    let (ledger, mut vault) = deploy_contracts(&env);
    let user = env.get_account(1);

    env.set_caller(user);
    vault.with_tokens(cspr_to_motes(100)).deposit();
    vault.redeem(cspr_to_units(40));

    assert_eq!(ledger.principal_balance_of(user), cspr_to_units(60));
    assert_eq!(vault.reserve_balance(), cspr_to_motes(60));
}

#[test]
fn test_redeem_max_uses_observable_balance() {
    let env = odra_test::env();
    let (ledger, mut vault) = deploy_contracts(&env);
    let user = env.get_account(1);
    let backer = env.get_account(2);

    env.set_caller(user);
    vault.with_tokens(cspr_to_motes(100)).deposit();
    // Extra reserves so the accrued interest can be paid out
    env.set_caller(backer);
    vault.with_tokens(cspr_to_motes(100)).deposit();

    env.advance_block_time(HOUR_MS);
    let observable = ledger.balance_of(user);
    assert!(observable > ledger.principal_balance_of(user));

    env.set_caller(user);
    vault.redeem(U256::MAX);

    assert_eq!(ledger.balance_of(user), U256::zero());
    assert_eq!(
        vault.reserve_balance(),
        cspr_to_motes(200) - units_to_motes(observable)
    );
}

#[test]
fn test_redeem_beyond_reserves_rolls_back_burn() {
    let env = odra_test::env();
    let (ledger, mut vault) = deploy_contracts(&env);
    let user = env.get_account(1);

    env.set_caller(user);
    vault.with_tokens(cspr_to_motes(100)).deposit();
    env.advance_block_time(HOUR_MS);
    assert!(ledger.balance_of(user) > cspr_to_units(100));

    // Interest is not backed by reserves
    assert_eq!(
        vault.try_redeem(U256::MAX),
        Err(YieldError::RedemptionTransferFailed.into())
    );
    assert_eq!(ledger.principal_balance_of(user), cspr_to_units(100));
    assert_eq!(vault.reserve_balance(), cspr_to_motes(100));
    assert_eq!(vault.total_redeemed(), U512::zero());

    // The backed portion is still redeemable
    vault.redeem(cspr_to_units(100));
    assert_eq!(vault.reserve_balance(), U512::zero());
}

#[test]
fn test_redeem_zero_reverts() {
    let env = odra_test::env();
    let (_, mut vault) = deploy_contracts(&env);
    let user = env.get_account(1);

    env.set_caller(user);
    vault.with_tokens(cspr_to_motes(100)).deposit();
    assert_eq!(
        vault.try_redeem(U256::zero()),
        Err(YieldError::InvalidAmount.into())
    );
}

#[test]
#[should_panic(expected = "InvalidAmount")]
fn test_redeem_max_with_empty_balance_reverts() {
    let env = odra_test::env();
    let (_, mut vault) = deploy_contracts(&env);

    env.set_caller(env.get_account(1));
    vault.redeem(U256::MAX);
}

#[test]
fn test_redeem_more_than_balance_reverts() {
    let env = odra_test::env();
    let (ledger, mut vault) = deploy_contracts(&env);
    let user = env.get_account(1);
    let other = env.get_account(2);

    env.set_caller(other);
    vault.with_tokens(cspr_to_motes(500)).deposit();

    env.set_caller(user);
    vault.with_tokens(cspr_to_motes(100)).deposit();
    assert_eq!(
        vault.try_redeem(cspr_to_units(101)),
        Err(YieldError::InsufficientBalance.into())
    );
    assert_eq!(ledger.principal_balance_of(user), cspr_to_units(100));
    assert_eq!(vault.reserve_balance(), cspr_to_motes(600));
}

#[test]
fn test_redeem_amount_beyond_u128_reports_insufficient_balance() {
    let env = odra_test::env();
    let (ledger, mut vault) = deploy_contracts(&env);
    let user = env.get_account(1);

    env.set_caller(user);
    vault.with_tokens(cspr_to_motes(100)).deposit();
    assert_eq!(
        vault.try_redeem(U256::from(u128::MAX) + U256::one()),
        Err(YieldError::InsufficientBalance.into())
    );
    assert_eq!(ledger.principal_balance_of(user), cspr_to_units(100));
    assert_eq!(vault.reserve_balance(), cspr_to_motes(100));
}

#[test]
fn test_transferred_units_are_redeemable_by_recipient() {
    let env = odra_test::env();
    let (mut ledger, mut vault) = deploy_contracts(&env);
    let alice = env.get_account(1);
    let bob = env.get_account(2);

    env.set_caller(alice);
    vault.with_tokens(cspr_to_motes(100)).deposit();
    ledger.transfer(bob, cspr_to_units(30));

    env.set_caller(bob);
    vault.redeem(U256::MAX);

    assert_eq!(ledger.balance_of(bob), U256::zero());
    assert_eq!(ledger.principal_balance_of(alice), cspr_to_units(70));
    assert_eq!(vault.reserve_balance(), cspr_to_motes(70));
}

// ==========================================
// Reserve funding
// ==========================================

#[test]
fn test_fund_reserve_covers_accrued_interest() {
    let env = odra_test::env();
    let (ledger, mut vault) = deploy_contracts(&env);
    let user = env.get_account(1);
    let funder = env.get_account(3);

    env.set_caller(user);
    vault.with_tokens(cspr_to_motes(100)).deposit();
    env.advance_block_time(HOUR_MS);
    let observable = ledger.balance_of(user);
    assert!(observable > cspr_to_units(100));

    env.set_caller(funder);
    vault.with_tokens(cspr_to_motes(1)).fund_reserve();
    assert!(env.emitted_event(
        &vault,
        ReserveFunded {
            funder,
            amount: cspr_to_motes(1),
        }
    ));

    env.set_caller(user);
    vault.redeem(U256::MAX);

    assert_eq!(ledger.balance_of(user), U256::zero());
    assert_eq!(
        vault.reserve_balance(),
        cspr_to_motes(101) - units_to_motes(observable)
    );
    assert_eq!(vault.total_redeemed(), units_to_motes(observable));
}

#[test]
fn test_fund_reserve_mints_nothing() {
    let env = odra_test::env();
    let (ledger, mut vault) = deploy_contracts(&env);
    let funder = env.get_account(3);

    env.set_caller(funder);
    vault.with_tokens(cspr_to_motes(50)).fund_reserve();

    assert_eq!(ledger.balance_of(funder), U256::zero());
    assert_eq!(ledger.total_supply(), U256::zero());
    assert_eq!(vault.reserve_balance(), cspr_to_motes(50));
    assert_eq!(vault.total_funded(), cspr_to_motes(50));
    assert_eq!(vault.total_deposited(), U512::zero());
}

#[test]
fn test_fund_reserve_zero_reverts() {
    let env = odra_test::env();
    let (_, mut vault) = deploy_contracts(&env);

    env.set_caller(env.get_account(3));
    assert_eq!(vault.try_fund_reserve(), Err(YieldError::InvalidAmount.into()));
    assert_eq!(vault.total_funded(), U512::zero());
}

// ==========================================
// Views
// ==========================================

#[test]
fn test_vault_reports_ledger_address() {
    let env = odra_test::env();
    let (ledger, vault) = deploy_contracts(&env);

    assert_eq!(vault.ledger(), Some(ledger.address()));
    assert!(ledger.has_mint_burn_capability(vault.address()));
}
