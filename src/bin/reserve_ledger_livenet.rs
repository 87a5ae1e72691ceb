//! Livenet deploy and demo binary for the Reserve Ledger.
//!
//! Run with:
//! - Deploy only:       RESERVE_LEDGER_MODE=deploy cargo run --bin reserve_ledger_livenet --features=livenet
//! - Deploy + demo:     RESERVE_LEDGER_MODE=deploy_and_demo cargo run --bin reserve_ledger_livenet --features=livenet
//! - Demo on existing:  RESERVE_LEDGER_MODE=demo RESERVE_LEDGER_EXISTING_LEDGER=... RESERVE_LEDGER_EXISTING_VAULT=... cargo run ...
//! - Query position:    RESERVE_LEDGER_MODE=query RESERVE_LEDGER_EXISTING_LEDGER=... RESERVE_LEDGER_EXISTING_VAULT=... cargo run ...
//!
//! Required environment variables (Odra livenet):
//! - ODRA_CASPER_LIVENET_SECRET_KEY_PATH
//! - ODRA_CASPER_LIVENET_NODE_ADDRESS        (base URL; Odra appends "/rpc")
//! - ODRA_CASPER_LIVENET_EVENTS_URL          (required by Odra; placeholder URL is OK here)
//! - ODRA_CASPER_LIVENET_CHAIN_NAME
//!
//! Optional:
//! - RESERVE_LEDGER_NAME                     (default: "Reserve Yield CSPR")
//! - RESERVE_LEDGER_SYMBOL                   (default: "ryCSPR")
//! - RESERVE_LEDGER_INITIAL_RATE             (per second, 1e18 scale; default: 50000000000)
//! - ODRA_CASPER_LIVENET_DEPLOY_GAS_LEDGER   (motes)
//! - ODRA_CASPER_LIVENET_DEPLOY_GAS_VAULT    (motes)
//! - ODRA_CASPER_LIVENET_CALL_GAS            (motes)
//! - RESERVE_LEDGER_EXISTING_LEDGER          (64-hex or formatted "hash-..."/"contract-package-...")
//! - RESERVE_LEDGER_EXISTING_VAULT           (64-hex or formatted "hash-..."/"contract-package-...")
//! - RESERVE_LEDGER_DEMO_DEPOSIT_CSPR        (default: 100)

use odra::casper_types::{U256, U512};
use odra::host::{Deployer, HostRef, HostRefLoader};
use odra::prelude::*;

use reserve_ledger_casper::ledger::{InterestLedger, InterestLedgerHostRef, InterestLedgerInitArgs};
use reserve_ledger_casper::vault::{ReserveVault, ReserveVaultHostRef, ReserveVaultInitArgs};

const MOTES_PER_CSPR: u64 = 1_000_000_000;

const DEFAULT_NAME: &str = "Reserve Yield CSPR";
const DEFAULT_SYMBOL: &str = "ryCSPR";
/// 5e10 / 1e18 per second, about 0.018% per hour
const DEFAULT_INITIAL_RATE: u64 = 50_000_000_000;

const DEFAULT_DEPLOY_GAS_LEDGER_MOTES: u64 = 450_000_000_000; // 450 CSPR
const DEFAULT_DEPLOY_GAS_VAULT_MOTES: u64 = 300_000_000_000; // 300 CSPR
const DEFAULT_CALL_GAS_MOTES: u64 = 50_000_000_000; // 50 CSPR

fn main() {
    println!("============================================");
    println!("  Reserve Ledger — Livenet");
    println!("============================================\n");

    let env = odra_casper_livenet_env::env();

    let mode = std::env::var("RESERVE_LEDGER_MODE").unwrap_or_else(|_| "deploy".to_string());
    let should_deploy = mode == "deploy" || mode == "deploy_and_demo";
    let should_demo = mode == "demo" || mode == "deploy_and_demo";
    let should_query = mode == "query";

    let deploy_gas_ledger =
        read_u64_env("ODRA_CASPER_LIVENET_DEPLOY_GAS_LEDGER", DEFAULT_DEPLOY_GAS_LEDGER_MOTES);
    let deploy_gas_vault =
        read_u64_env("ODRA_CASPER_LIVENET_DEPLOY_GAS_VAULT", DEFAULT_DEPLOY_GAS_VAULT_MOTES);
    let call_gas = read_u64_env("ODRA_CASPER_LIVENET_CALL_GAS", DEFAULT_CALL_GAS_MOTES);

    let name = std::env::var("RESERVE_LEDGER_NAME").unwrap_or_else(|_| DEFAULT_NAME.to_string());
    let symbol =
        std::env::var("RESERVE_LEDGER_SYMBOL").unwrap_or_else(|_| DEFAULT_SYMBOL.to_string());
    let initial_rate = read_u256_env("RESERVE_LEDGER_INITIAL_RATE", U256::from(DEFAULT_INITIAL_RATE));
    let deposit_cspr = read_u64_env("RESERVE_LEDGER_DEMO_DEPOSIT_CSPR", 100);
    let deposit_motes = U512::from(deposit_cspr) * U512::from(MOTES_PER_CSPR);

    println!("[INFO] Mode: {}", mode);
    println!("[INFO] Caller: {:?}", env.caller());
    println!(
        "[INFO] Gas (motes): deploy_ledger={} ({} CSPR), deploy_vault={} ({} CSPR), calls={} ({} CSPR)",
        deploy_gas_ledger,
        deploy_gas_ledger / MOTES_PER_CSPR,
        deploy_gas_vault,
        deploy_gas_vault / MOTES_PER_CSPR,
        call_gas,
        call_gas / MOTES_PER_CSPR
    );
    println!("[INFO] Ledger params: name={}, symbol={}, initial_rate={}", name, symbol, initial_rate);
    println!("[INFO] Demo params: deposit={} CSPR", deposit_cspr);
    println!();

    // ==========================================
    // Step 1: Deploy (or reuse) the ledger
    // ==========================================
    let ledger = if should_deploy {
        println!("[STEP 1] Deploying InterestLedger...");
        env.set_gas(deploy_gas_ledger);
        let ledger = InterestLedger::deploy(
            &env,
            InterestLedgerInitArgs {
                name: name.clone(),
                symbol: symbol.clone(),
                initial_rate,
            },
        );
        println!("[OK] InterestLedger deployed at: {:?}", ledger.address());
        println!("     Symbol: {}", ledger.symbol());
        println!("     Global rate: {}", ledger.global_rate());
        println!("     Administrator: {:?}", ledger.administrator());
        println!();
        ledger
    } else {
        println!("[STEP 1] Reusing existing InterestLedger...");
        let addr = existing_address("RESERVE_LEDGER_EXISTING_LEDGER", &mode);
        println!("[OK] InterestLedger: {:?}", addr);
        println!();
        InterestLedger::load(&env, addr)
    };
    let ledger_addr = ledger.address();

    // ==========================================
    // Step 2: Deploy (or reuse) the vault
    // ==========================================
    let vault = if should_deploy {
        println!("[STEP 2] Deploying ReserveVault...");
        env.set_gas(deploy_gas_vault);
        let vault = ReserveVault::deploy(&env, ReserveVaultInitArgs { ledger: ledger_addr });
        println!("[OK] ReserveVault deployed at: {:?}", vault.address());
        println!("     Ledger: {:?}", vault.ledger());
        println!();
        vault
    } else {
        println!("[STEP 2] Reusing existing ReserveVault...");
        let addr = existing_address("RESERVE_LEDGER_EXISTING_VAULT", &mode);
        println!("[OK] ReserveVault: {:?}", addr);
        println!();
        ReserveVault::load(&env, addr)
    };
    let vault_addr = vault.address();

    // ==========================================
    // Step 3: Grant the vault mint/burn capability
    // ==========================================
    let ledger = if should_query {
        println!("[STEP 3] Skipping capability check (query mode)...");
        ledger
    } else {
        println!("[STEP 3] Granting mint/burn capability to the vault...");
        let mut ledger = ledger;
        if ledger.has_mint_burn_capability(vault_addr) {
            println!("[OK] Vault already holds the capability.");
        } else {
            env.set_gas(call_gas);
            ledger.grant_mint_burn_capability(vault_addr);
            if !ledger.has_mint_burn_capability(vault_addr) {
                panic!("[FATAL] grant_mint_burn_capability succeeded but vault is still not a holder!");
            }
            println!("[OK] Capability granted.");
        }
        ledger
    };
    println!();

    // ==========================================
    // Demo: deposit -> redeem half
    // ==========================================
    if should_demo {
        let mut vault = vault;
        let caller = env.caller();

        println!("[DEMO 1] Depositing {} CSPR...", deposit_cspr);
        env.set_gas(call_gas);
        vault.with_tokens(deposit_motes).deposit();
        println!("[OK] Deposit complete.");
        print_position_info(&ledger, &vault, caller);

        let redeem_amount = ledger.principal_balance_of(caller) / U256::from(2u64);
        if redeem_amount.is_zero() {
            println!("[SKIP] Nothing to redeem.");
        } else {
            println!("[DEMO 2] Redeeming {} units...", redeem_amount);
            env.set_gas(call_gas);
            vault.redeem(redeem_amount);
            println!("[OK] Redeem complete.");
            print_position_info(&ledger, &vault, caller);
        }
    }

    // ==========================================
    // Query mode: Output position as JSON
    // ==========================================
    if should_query {
        let ledger = InterestLedgerHostRef::new(ledger_addr, env.clone());
        let vault = ReserveVaultHostRef::new(vault_addr, env.clone());
        let query_user = env.caller();

        println!("RESERVE_LEDGER_POSITION_JSON={{\"balance\":\"{}\",\"principal\":\"{}\",\"personal_rate\":\"{}\",\"global_rate\":\"{}\",\"last_accrual_time\":{},\"reserve_balance\":\"{}\",\"user\":\"{:?}\",\"queried_at\":\"{}\"}}",
            ledger.balance_of(query_user),
            ledger.principal_balance_of(query_user),
            ledger.personal_rate(query_user),
            ledger.global_rate(),
            ledger
                .last_accrual_time(query_user)
                .map(|t| t.to_string())
                .unwrap_or_else(|| "null".to_string()),
            vault.reserve_balance(),
            query_user,
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
        );
        return;
    }

    output_deploy_json(ledger_addr, vault_addr, initial_rate);
}

fn print_position_info(ledger: &InterestLedgerHostRef, vault: &ReserveVaultHostRef, user: Address) {
    println!("     balance: {} units", ledger.balance_of(user));
    println!("     principal: {} units", ledger.principal_balance_of(user));
    println!("     personal_rate: {}", ledger.personal_rate(user));
    println!("     global_rate: {}", ledger.global_rate());
    println!("     total_supply: {}", ledger.total_supply());
    println!("     reserve_balance: {} motes", vault.reserve_balance());
    println!("     total_deposited: {} motes", vault.total_deposited());
    println!("     total_redeemed: {} motes", vault.total_redeemed());
    println!();
}

fn read_u64_env(name: &str, default_value: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => {
            let cleaned = raw.trim().replace('_', "");
            cleaned.parse::<u64>().unwrap_or(default_value)
        }
        Err(_) => default_value,
    }
}

fn read_u256_env(name: &str, default_value: U256) -> U256 {
    match std::env::var(name) {
        Ok(raw) => {
            let cleaned = raw.trim().replace('_', "");
            U256::from_dec_str(&cleaned)
                .unwrap_or_else(|_| panic!("{} must be a decimal integer, got: {}", name, raw))
        }
        Err(_) => default_value,
    }
}

fn existing_address(var: &str, mode: &str) -> Address {
    let raw = std::env::var(var)
        .unwrap_or_else(|_| panic!("{} must be set for mode={}", var, mode));
    parse_contract_address(&raw)
}

fn output_deploy_json(ledger_addr: Address, vault_addr: Address, initial_rate: U256) {
    let chain_name =
        std::env::var("ODRA_CASPER_LIVENET_CHAIN_NAME").unwrap_or_else(|_| "casper-test".to_string());
    let node_url = std::env::var("ODRA_CASPER_LIVENET_NODE_ADDRESS")
        .unwrap_or_else(|_| "https://node.testnet.casper.network".to_string());

    println!(
        r#"RESERVE_LEDGER_DEPLOY_JSON={{"chain_name":"{}","node_url":"{}","ledger_contract_hash":"{}","vault_contract_hash":"{}","initial_rate":"{}","deployed_at":"{}"}}"#,
        chain_name,
        node_url,
        format_address_hash(&ledger_addr),
        format_address_hash(&vault_addr),
        initial_rate,
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    );
}

/// Pulls the hex bytes out of the `Debug` form of an address.
fn format_address_hash(addr: &Address) -> String {
    let debug_str = format!("{:?}", addr);
    match (debug_str.find('['), debug_str.rfind(']')) {
        (Some(start), Some(end)) if start < end => debug_str[start + 1..end]
            .split(", ")
            .filter_map(|part| part.strip_prefix("0x").or_else(|| part.strip_prefix("0X")))
            .collect(),
        _ => debug_str,
    }
}

fn parse_contract_address(raw: &str) -> Address {
    use odra::casper_types::account::AccountHash;
    use odra::casper_types::contracts::ContractPackageHash;

    fn decode_hex_32(s: &str) -> [u8; 32] {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            panic!("Invalid address hash (expected 64 hex): {}", s);
        }
        let mut out = [0u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .unwrap_or_else(|_| panic!("Invalid hex in address: {}", s));
        }
        out
    }

    let trimmed = raw.trim();
    if let Some(hex) = trimmed.strip_prefix("account-hash-") {
        return Address::Account(AccountHash::new(decode_hex_32(hex)));
    }
    let package_hex = ["contract-package-", "package-", "hash-"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);
    Address::Contract(ContractPackageHash::new(decode_hex_32(package_hex)))
}
