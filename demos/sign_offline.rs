//! Signs a parameter set without sending it.
//!
//! Handy for checking that another implementation builds the same signing base string:
//!
//! ```text
//! cargo run --example sign_offline -- --private-key <hex> --time 1700000000000 quote_id=q-1 quantity=0.5
//! ```

use arbelos_rfq::rfq::{ParamValue, Params, PrivateKey, signing};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Hex private key.
    #[arg(long, env = "ARBELOS_PRIVATE_KEY", hide_env_values = true)]
    private_key: String,
    /// Timestamp in milliseconds. Defaults to now.
    #[arg(long)]
    time: Option<u64>,
    /// Extra `key=value` parameters.
    params: Vec<String>,
}

fn parse_value(raw: &str) -> ParamValue {
    if let Ok(v) = raw.parse::<i64>() {
        ParamValue::Int(v)
    } else if let Ok(v) = raw.parse::<f64>() {
        ParamValue::Float(v)
    } else {
        ParamValue::Str(raw.to_owned())
    }
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let key: PrivateKey = args.private_key.parse()?;
    let time = args
        .time
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis() as u64);

    let mut params = Params::new(time);
    for pair in &args.params {
        let (k, v) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("expected key=value, got {pair:?}"))?;
        params.insert(k, parse_value(v));
    }

    let base = params.signing_base()?;
    println!("public key: {}", key.public_key_hex());
    println!("base:       {base}");
    println!("digest:     {}", const_hex::encode(signing::digest(&base)));
    println!("signature:  {}", signing::sign(&params, &key)?);

    Ok(())
}
