//! Interactive terminal surface for the stock advisor
//!
//! One text input (the ticker), one trigger (enter / the one-shot
//! argument), and four output regions: fetching status, invalid-ticker
//! warning with optional suggestion, the rendered prompt, and the final
//! recommendation.

use advisor_core::{AdvisorConfig, AdvisorEngine, Outcome, Secrets};
use advisor_utils::SecretStore;
use anyhow::Result;
use clap::Parser;
use std::io::{self, BufRead, Write};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "advisor")]
#[command(about = "AI stock advisor - fundamentals, technicals, and news sentiment in one recommendation", long_about = None)]
struct Args {
    /// Ticker symbol to analyze once; omit for an interactive session
    ticker: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    advisor_utils::init_tracing();

    let args = Args::parse();

    let store = SecretStore::from_env()?;
    let secrets = Secrets::resolve(&store)?;
    let config = AdvisorConfig::default();
    let engine = AdvisorEngine::new(config, &secrets)?;

    debug!("Engine wired, starting session");

    match args.ticker {
        Some(ticker) => analyze(&engine, &ticker).await,
        None => interactive(&engine).await?,
    }

    Ok(())
}

/// Read-analyze loop; a failed analysis prints and the loop continues
async fn interactive(engine: &AdvisorEngine) -> Result<()> {
    println!("📈 AI Stock Advisor");
    println!("Enter a ticker symbol (e.g. AAPL, TSLA, GOOGL); 'quit' to exit.");

    let stdin = io::stdin();
    loop {
        print!("Ticker> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let input = line.trim();

        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            break;
        }

        analyze(engine, input).await;
    }

    Ok(())
}

/// Run one analysis and render the output regions
async fn analyze(engine: &AdvisorEngine, input: &str) {
    let input = input.trim();
    if input.is_empty() {
        println!("⚠️  Please enter a valid stock ticker.");
        return;
    }

    println!("📥 Fetching data for {}...", input.to_uppercase());

    match engine.run(input).await {
        Ok(Outcome::Report(report)) => {
            println!();
            println!("--- Prompt ---");
            println!("{}", report.prompt);
            println!();
            println!("💡 Suggestion for {}", report.symbol);
            println!("{}", report.recommendation);
        }
        Ok(Outcome::NotListed { symbol, suggestion }) => match suggestion {
            Some(alt) => {
                println!("⚠️  {symbol} is not a listed symbol. Did you mean {alt}?");
            }
            None => {
                println!("❌ {symbol} is not a listed symbol and no close match was found.");
            }
        },
        Err(e) => println!("❌ Error: {e}"),
    }
}
