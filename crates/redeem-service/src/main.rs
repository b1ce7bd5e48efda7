//! Command-line entry point for the redemption workflow.
//!
//! Loads configuration, builds the engine with the configured transport and
//! runs one command. The command's result is always printed as a uint256 in
//! decimal and as an ABI word; failures print zero and still exit cleanly.

use alloy_primitives::U256;
use clap::{Parser, Subcommand};
use redeem_config::Config;
use redeem_core::RedemptionEngine;
use std::path::PathBuf;

mod factory_registry;
mod output;

/// Command-line arguments for the redemption service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
	/// Sell the position, buy the stablecoin and transfer it out
	Run {
		/// Quantity of the position to sell
		sell_qty: String,
		/// Quantity of the stablecoin to buy and transfer
		stable_qty: String,
	},
	/// Print the account's portfolio value
	Balance,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	// Logs go to stderr so stdout carries only the result.
	fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_target(true)
		.init();

	let config = Config::from_file(&args.config).await?;
	tracing::info!(path = %args.config.display(), "Loaded configuration");

	let engine = factory_registry::build_engine(config)?;
	let value = execute(&engine, &args.command).await;

	println!("{}", output::render(value));
	Ok(())
}

/// Runs `command` and returns its encoded result.
async fn execute(engine: &RedemptionEngine, command: &Command) -> U256 {
	match command {
		Command::Run {
			sell_qty,
			stable_qty,
		} => engine.run(sell_qty, stable_qty).await.encode(),
		Command::Balance => output::encode_balance(engine.balance().await),
	}
}
