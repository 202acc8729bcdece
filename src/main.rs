//! Stablecoin token-sale client.
//!
//! # Flow
//!
//! ```text
//!   stablecoin-sale.toml ──▶ config ──▶ CurrencyTable
//!                                           │
//!   SALE_WALLET_PRIVATE_KEY ──▶ LocalWalletConnector ──┐
//!                                           │          │
//!                                           ▼          ▼
//!                             ┌──────────────────────────────┐
//!                             │      PurchaseOrchestrator      │
//!   buy/switch/resume/revoke ─▶│ switch ─ approve ─ wait ─ buy │──▶ purchases.json
//!                             └──────────────────────────────┘
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use uuid::Uuid;

use stablecoin_sale::blockchain::{LocalWalletConnector, WalletConnector};
use stablecoin_sale::config::{load_config, SaleConfig};
use stablecoin_sale::observability::init_logging;
use stablecoin_sale::purchase::{PurchaseJournal, PurchaseOrchestrator};
use stablecoin_sale::{Currency, CurrencyTable, InputChange};

#[derive(Parser)]
#[command(name = "stablecoin-sale")]
#[command(about = "Buy sale tokens with USDT, USDC or BUSD", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "stablecoin-sale.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the configured currency table
    Currencies,
    /// Switch the wallet to a currency's network
    Switch {
        #[arg(short, long)]
        currency: Currency,
    },
    /// Approve the sale contract and buy
    Buy {
        #[arg(short, long)]
        currency: Currency,
        #[arg(short, long)]
        amount: String,
    },
    /// Continue an interrupted purchase
    Resume { id: Uuid },
    /// Withdraw the allowance of an unfinished purchase
    Revoke { id: Uuid },
    /// List purchases that still need attention
    Pending,
}

type Orchestrator = PurchaseOrchestrator<LocalWalletConnector>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.observability);

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: SaleConfig) -> Result<(), String> {
    let table = CurrencyTable::from_config(&config.currencies);
    let journal = PurchaseJournal::load_from_file(&config.purchase.journal_path)
        .map_err(|e| format!("Could not open purchase journal: {}", e))?;

    match command {
        Commands::Currencies => {
            for entry in table.iter() {
                println!(
                    "{:<5} chain {:<9} decimals {:<2} stablecoin {} sale {}",
                    entry.currency.symbol(),
                    entry.chain_id,
                    entry.decimals,
                    entry.stablecoin_address,
                    entry.sale_address
                );
            }
            return Ok(());
        }
        Commands::Pending => {
            let pending = journal.pending();
            if pending.is_empty() {
                println!("No unfinished purchases.");
            }
            for record in pending {
                print_json(&record)?;
            }
            return Ok(());
        }
        _ => {}
    }

    let orchestrator = connect(&config, table, journal).await?;

    match command {
        Commands::Switch { currency } => {
            let session = orchestrator.new_session(currency);
            orchestrator
                .sync_network(&session)
                .await
                .map_err(|e| e.user_message())?;
            print_json(&session)?;
        }
        Commands::Buy { currency, amount } => {
            let session = orchestrator.new_session(currency);
            orchestrator
                .sync_network(&session)
                .await
                .map_err(|e| e.user_message())?;
            let session = orchestrator
                .handle_input_change(&session, InputChange::Amount(amount))
                .await
                .map_err(|e| e.user_message())?;

            let record = orchestrator
                .purchase_tokens(&session)
                .await
                .map_err(|e| e.user_message())?;
            print_json(&record)?;
        }
        Commands::Resume { id } => {
            switch_to_record(&orchestrator, id).await?;
            let record = orchestrator.resume(id).await.map_err(|e| e.user_message())?;
            print_json(&record)?;
        }
        Commands::Revoke { id } => {
            switch_to_record(&orchestrator, id).await?;
            let record = orchestrator.revoke(id).await.map_err(|e| e.user_message())?;
            print_json(&record)?;
        }
        Commands::Currencies | Commands::Pending => {}
    }

    Ok(())
}

async fn connect(
    config: &SaleConfig,
    table: CurrencyTable,
    journal: PurchaseJournal,
) -> Result<Orchestrator, String> {
    let connector = LocalWalletConnector::from_env(config).map_err(|e| e.to_string())?;
    connector.connect().await.map_err(|e| e.to_string())?;

    for record in journal.pending() {
        tracing::warn!(
            record_id = %record.id,
            phase = %record.phase,
            allowance_outstanding = record.allowance_outstanding(),
            unresolved = record.unresolved_stage().map(|stage| stage.as_str()),
            "Unfinished purchase found; use `resume` or `revoke`"
        );
    }

    Ok(PurchaseOrchestrator::new(
        Arc::new(connector),
        table,
        journal,
        config.purchase.gas_limit,
    ))
}

async fn switch_to_record(orchestrator: &Orchestrator, id: Uuid) -> Result<(), String> {
    let Some(record) = orchestrator.journal().get(&id) else {
        return Err(format!("No purchase with id {} was found.", id));
    };
    if orchestrator.connector().active_chain() == Some(record.chain_id) {
        return Ok(());
    }
    orchestrator
        .connector()
        .switch_chain(record.chain_id)
        .await
        .map_err(|e| format!("Could not switch to chain {}: {}", record.chain_id, e))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}
