use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

mod detail;
mod export;
mod extract;
mod listing;
mod portal;
mod scrape;
mod session;
mod telemetry;
mod util;
mod validate;

#[derive(Parser)]
#[command(name = "egp-scraper", about = "Best-evaluated-bidder notices from the EGP portal to CSV")]
struct Cli {
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, list notices, fetch details (with fallback) and export
    Run(scrape::RunCmd),
    /// Inspect an exported CSV for blanks and encoding problems
    Validate(validate::ValidateCmd),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and EGP_LOG_FORMAT
    telemetry::config::init_tracing();

    match cli.command {
        Commands::Run(args) => scrape::run(args).await?,
        Commands::Validate(args) => validate::run(args).await?,
    }

    Ok(())
}
