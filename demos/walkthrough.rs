//! Calls every RFQ endpoint in turn and prints the responses.
//!
//! Requests quotes for a few instruments and, if one comes back, lifts half of the first ask.
//! Failed calls are reported and skipped.
//!
//! Credentials come from flags, the environment, or a `.env` file:
//!
//! ```text
//! ARBELOS_PUBLIC_KEY=... ARBELOS_PRIVATE_KEY=... cargo run --example walkthrough
//! ```

use clap::Parser;
use serde::Serialize;

use crate::credentials::Connection;

mod credentials;

#[derive(Parser, Debug, derive_more::Deref)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[deref]
    #[command(flatten)]
    connection: Connection,
    /// Instruments to quote.
    #[arg(long, value_delimiter = ',', default_value = "s sol,s btc,s eth")]
    instruments: Vec<String>,
    /// Skip trade execution.
    #[arg(long)]
    dry_run: bool,
}

fn show<T: Serialize>(label: &str, value: &Option<T>) -> anyhow::Result<()> {
    println!("{label}: {}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let _ = simple_logger::init_with_level(log::Level::Info);

    let args = Cli::parse();
    let client = args.client()?;

    show("STATUS", &client.status().await?)?;
    show("INSTRUMENTS", &client.instruments().await?)?;

    let quotes = client.quotes(&args.instruments).await?;
    show("QUOTES", &quotes)?;

    let first = quotes.as_ref().and_then(|quotes| quotes.quotes.first());
    match first {
        Some(quote) if !args.dry_run => {
            if let (Some(quote_id), Some(max)) = (&quote.quote_id_ask, quote.max_quantity_ask) {
                let trade = client.execute_trade(quote_id.clone(), max / 2.0).await?;
                show("TRADE", &trade)?;
            }
        }
        Some(_) => println!("TRADE: skipped (dry run)"),
        None => println!("TRADE: no quote to execute"),
    }

    show("TRADES", &client.trades().await?)?;
    show("BALANCES", &client.balances().await?)?;
    show("VOLUMES", &client.volumes().await?)?;

    Ok(())
}
