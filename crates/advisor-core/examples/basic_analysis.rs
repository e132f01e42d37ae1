//! Basic analysis example
//!
//! Runs the full pipeline for one ticker and prints the prompt plus the
//! recommendation.
//!
//! To run this example:
//! ```bash
//! # Set your API keys
//! export TOGETHER_API_KEY=your_key_here
//! export NEWS_API_KEY=your_key_here
//! export ALPHA_VANTAGE_API_KEY=your_key_here
//!
//! # Run the example
//! cargo run --example basic_analysis AAPL
//! ```

use advisor_core::{AdvisorConfig, AdvisorEngine, Outcome, Secrets};
use advisor_utils::SecretStore;
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt().with_env_filter("info").init();

    // Get stock symbol from command line arguments
    let args: Vec<String> = env::args().collect();
    let symbol = if args.len() > 1 { &args[1] } else { "AAPL" };

    println!("=== AI Stock Advisor ===\n");
    println!("Analyzing: {symbol}\n");

    let store = SecretStore::from_env()?;
    let secrets = Secrets::resolve(&store)?;
    let config = AdvisorConfig::default();

    println!("Configuration:");
    println!("  - Model: {}", config.model);
    println!("  - Lookback: {} days", config.lookback_days);
    println!("  - Universe TTL: {:?}\n", config.universe_ttl);

    let engine = AdvisorEngine::new(config, &secrets)?;

    match engine.run(symbol).await? {
        Outcome::Report(report) => {
            println!("--- Prompt ---\n{}\n", report.prompt);
            println!("--- Recommendation for {} ---", report.symbol);
            println!("{}", report.recommendation);
        }
        Outcome::NotListed { symbol, suggestion } => match suggestion {
            Some(alt) => println!("{symbol} is not listed. Did you mean {alt}?"),
            None => println!("{symbol} is not listed and nothing similar was found."),
        },
    }

    Ok(())
}
