use clap::{Parser, Subcommand};
use log::info;
use lsp_liquidity::config::Config;
use lsp_liquidity::lsp::client::{BlocktankClient, LspClient};
use lsp_liquidity::{LiquidityEngine, LiquiditySnapshot};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "lsp-liquidity",
    about = "Size LSP channel orders and spending/savings transfers"
)]
struct Cli {
    /// Path to lsp-liquidity.toml config file
    #[arg(short, long, default_value = "lsp-liquidity.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the LSP's advertised channel limits
    Info,
    /// Resolve LSP balance limits for a client balance
    Limits {
        #[arg(long)]
        client_balance: u64,
    },
    /// Split the configured wallet between spending and savings
    Split {
        /// Desired spending (Lightning) balance in sats
        #[arg(long)]
        amount: u64,
    },
    /// Ask the LSP for a channel fee quote
    Fee {
        #[arg(long)]
        lsp_balance: u64,
        #[arg(long)]
        client_balance: u64,
    },
    /// Build an order from resolved limits and quote it
    Propose {
        #[arg(long)]
        client_balance: u64,
        /// Override the default LSP balance
        #[arg(long)]
        lsp_balance: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;

    // Initialize logging
    let log_level = config.general.log_level.clone();
    env_logger::Builder::new()
        .filter_level(log_level.parse().unwrap_or(log::LevelFilter::Info))
        .format_timestamp_secs()
        .init();

    info!("lsp-liquidity v{} starting", env!("CARGO_PKG_VERSION"));

    let client = BlocktankClient::new(&config.lsp)?;
    let engine = LiquidityEngine::from_config(&config);

    match cli.command {
        Commands::Info => print_info(&client).await,
        Commands::Limits { client_balance } => {
            let snapshot = load_snapshot(&engine, &client, &config).await?;
            print_limits(&engine, &snapshot, client_balance);
            Ok(())
        }
        Commands::Split { amount } => {
            let snapshot = load_snapshot(&engine, &client, &config).await?;
            print_split(&engine, &snapshot, &config, amount)
        }
        Commands::Fee {
            lsp_balance,
            client_balance,
        } => {
            let fee = engine.estimate_fee(&client, lsp_balance, client_balance).await?;
            println!("Fee:          {} sat", fee.fee_sat);
            println!("  network:    {} sat", fee.network_fee_sat);
            println!("  service:    {} sat", fee.service_fee_sat);
            Ok(())
        }
        Commands::Propose {
            client_balance,
            lsp_balance,
        } => {
            let snapshot = load_snapshot(&engine, &client, &config).await?;
            let order = engine.propose_order(client_balance, lsp_balance, &snapshot.bounds)?;
            let fee = engine
                .estimate_fee(&client, order.lsp_balance_sat, order.client_balance_sat)
                .await?;
            println!("Order Proposal");
            println!("==============");
            println!("Client balance:   {} sat", order.client_balance_sat);
            println!("LSP balance:      {} sat", order.lsp_balance_sat);
            println!("Expiry:           {} weeks", order.channel_expiry_weeks);
            println!("Zero-conf:        {}", order.zero_conf_payment);
            println!("Fee:              {} sat", fee.fee_sat);
            Ok(())
        }
    }
}

async fn load_snapshot(
    engine: &LiquidityEngine,
    client: &BlocktankClient,
    config: &Config,
) -> anyhow::Result<LiquiditySnapshot> {
    engine
        .load_snapshot(client, client, &config.lsp.currency, &config.wallet)
        .await
}

async fn print_info(client: &BlocktankClient) -> anyhow::Result<()> {
    let info = client.get_info().await?;
    let options = &info.options;
    println!("LSP Info (v{})", info.version);
    println!("==============");
    for node in &info.nodes {
        println!("Node:                 {} {}", node.alias, node.pubkey);
    }
    println!(
        "Channel size:         {} - {} sat",
        options.min_channel_size_sat, options.max_channel_size_sat
    );
    println!("Max client balance:   {} sat", options.max_client_balance_sat);
    println!("Max 0-conf balance:   {} sat", options.max_0conf_client_balance_sat);
    println!(
        "Expiry:               {} - {} weeks",
        options.min_expiry_weeks, options.max_expiry_weeks
    );
    Ok(())
}

fn print_limits(engine: &LiquidityEngine, snapshot: &LiquiditySnapshot, client_balance: u64) {
    let limits = engine.resolve_limits(client_balance, &snapshot.bounds);
    println!("Limits for {} sat", client_balance);
    println!("==============");
    println!("Min LSP balance:      {} sat", limits.min_lsp_balance_sat);
    println!("Max LSP balance:      {} sat", limits.max_lsp_balance_sat);
    println!("Default LSP balance:  {} sat", limits.default_lsp_balance_sat);
    println!("Max client balance:   {} sat", limits.max_client_balance_sat);
    println!("Max channel size:     {} sat", limits.max_channel_size_sat);
    if limits.is_degenerate() {
        println!("No valid channel size for this client balance");
    }
}

fn print_split(
    engine: &LiquidityEngine,
    snapshot: &LiquiditySnapshot,
    config: &Config,
    amount: u64,
) -> anyhow::Result<()> {
    let balances = config.wallet.balances();
    let split = engine.split_allocation(&snapshot.options, &balances, amount)?;
    println!("Split");
    println!("==============");
    println!(
        "Spending / savings:   {}% / {}%",
        split.percentage.spendings, split.percentage.savings
    );
    println!("Spending limit:       {} sat", split.spending_limit_sat);
    println!(
        "  local / LSP:        {} / {} sat",
        split.limits.local_sat, split.limits.lsp_sat
    );
    println!(
        "Slider:               {} - {} (max {}, snap {}, initial {})",
        split.slider.start_value,
        split.slider.end_value,
        split.slider.max_value,
        split.slider.snap_point,
        split.slider.initial_value
    );
    println!(
        "Presets:              25% {} sat, max {} sat",
        split.presets.quarter_sat, split.presets.max_sat
    );
    println!("Can continue:         {}", split.can_continue);
    if split.is_transferring_to_savings {
        println!("Transfer direction:   to savings");
    }
    Ok(())
}
