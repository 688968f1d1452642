use std::path::PathBuf;

use alloy::primitives::{Address, U256};
use clap::{Parser, Subcommand};
use parity_sdk::config::load_config;
use parity_sdk::observability::logging::init_logging;
use parity_sdk::{BlockRange, DeviceId, PendingTransaction, SdkClient};
use serde_json::json;

#[derive(Parser)]
#[command(name = "parity-cli")]
#[command(about = "Command line client for the Parity token and stake wallet", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, default_value = "parity-sdk.toml")]
    config: PathBuf,

    /// Wait for submitted transactions to be mined
    #[arg(short, long)]
    wait: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Token metadata, supply and the configured account
    Info,
    /// Token balance of an address
    Balance {
        #[arg(value_parser = parse_address)]
        address: Address,
    },
    /// Allowance granted by owner to spender
    Allowance {
        #[arg(value_parser = parse_address)]
        owner: Address,
        #[arg(value_parser = parse_address)]
        spender: Address,
    },
    /// Stake record of a device
    StakeInfo { device: String },
    /// Approve and stake tokens for a device
    Stake {
        #[arg(value_parser = parse_amount)]
        amount: U256,
        device: String,
    },
    /// Transfer tokens
    Transfer {
        #[arg(value_parser = parse_address)]
        to: Address,
        #[arg(value_parser = parse_amount)]
        amount: U256,
    },
    /// Withdraw stake of a device
    Withdraw {
        device: String,
        #[arg(value_parser = parse_amount)]
        amount: U256,
    },
    /// Historical Transfer events
    Transfers {
        #[arg(long, default_value_t = 0)]
        from_block: u64,
        #[arg(long)]
        to_block: Option<u64>,
    },
    /// Print Transfer events as they happen until interrupted
    WatchTransfers,
}

fn parse_address(s: &str) -> Result<Address, String> {
    s.parse().map_err(|e| format!("invalid address {s}: {e}"))
}

fn parse_amount(s: &str) -> Result<U256, String> {
    U256::from_str_radix(s, 10).map_err(|e| format!("invalid amount {s}: {e}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_logging(&config.observability.log_level);

    let client = SdkClient::connect(&config).await?;

    match cli.command {
        Commands::Info => {
            let info = client.get_token_info().await?;
            let supply = client.get_total_supply().await?;
            print_json(json!({
                "token": client.token().address().to_string(),
                "name": info.name,
                "symbol": info.symbol,
                "decimals": info.decimals,
                "total_supply": supply.to_string(),
                "account": client.address().to_string(),
                "chain_id": client.connection().chain_id(),
            }))?;
        }
        Commands::Balance { address } => {
            let balance = client.get_balance(address).await?;
            print_json(json!({ "address": address.to_string(), "balance": balance.to_string() }))?;
        }
        Commands::Allowance { owner, spender } => {
            let allowance = client.get_allowance(owner, spender).await?;
            print_json(json!({
                "owner": owner.to_string(),
                "spender": spender.to_string(),
                "allowance": allowance.to_string(),
            }))?;
        }
        Commands::StakeInfo { device } => {
            let record = client.get_stake_info(&DeviceId::new(device)).await?;
            print_json(json!({
                "device_id": record.device_id.as_str(),
                "amount": record.amount.to_string(),
                "wallet_address": record.wallet_address.to_string(),
                "exists": record.exists,
            }))?;
        }
        Commands::Stake { amount, device } => {
            let tx = client.add_funds(amount, &DeviceId::new(device)).await?;
            report(&client, tx, cli.wait).await?;
        }
        Commands::Transfer { to, amount } => {
            let tx = client.transfer(to, amount).await?;
            report(&client, tx, cli.wait).await?;
        }
        Commands::Withdraw { device, amount } => {
            let tx = client.withdraw_funds(&DeviceId::new(device), amount).await?;
            report(&client, tx, cli.wait).await?;
        }
        Commands::Transfers {
            from_block,
            to_block,
        } => {
            let range = match to_block {
                Some(to) => BlockRange::between(from_block, to),
                None => BlockRange::since(from_block),
            };
            let query = client.token().transfer_logs(&[], &[], range)?;
            let mut events = query.iter();
            while let Some(event) = events.next().await {
                let event = event?;
                print_json(json!({
                    "block": event.meta.block_number,
                    "tx_hash": event.meta.transaction_hash.map(|h| h.to_string()),
                    "from": event.from.to_string(),
                    "to": event.to.to_string(),
                    "value": event.value.to_string(),
                }))?;
            }
        }
        Commands::WatchTransfers => {
            let mut subscription = client.token().subscribe_transfers(&[], &[]).await?;
            loop {
                tokio::select! {
                    event = subscription.next() => match event {
                        Some(event) => {
                            let event = event?;
                            print_json(json!({
                                "block": event.meta.block_number,
                                "from": event.from.to_string(),
                                "to": event.to.to_string(),
                                "value": event.value.to_string(),
                            }))?;
                        }
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => {
                        subscription.cancel();
                        break;
                    }
                }
            }
        }
    }

    client.close();
    Ok(())
}

async fn report(
    client: &SdkClient,
    tx: PendingTransaction,
    wait: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !wait {
        print_json(json!({
            "method": tx.method(),
            "tx_hash": tx.hash().to_string(),
            "from": tx.from().to_string(),
        }))?;
        return Ok(());
    }

    let receipt = tx
        .wait_mined(&client.connection().confirmation_policy())
        .await?;
    print_json(json!({
        "method": tx.method(),
        "tx_hash": receipt.tx_hash.to_string(),
        "from": tx.from().to_string(),
        "block": receipt.block_number,
        "success": receipt.success,
    }))?;
    Ok(())
}

fn print_json(value: serde_json::Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
