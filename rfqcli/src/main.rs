use std::io::Write;
use std::io::stdout;
use std::time::Duration;

use arbelos_rfq::rfq::{self, Credentials, ParamValue, Params, PrivateKey, Quotes, signing};
use clap::Args;
use clap::{Parser, Subcommand};
use enum_dispatch::enum_dispatch;
use serde_json::Value;
use url::Url;

#[derive(Parser)]
#[command(author, version)]
struct Cli {
    #[command(flatten)]
    global: Global,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Global {
    /// API public key, sent as `x-api-key`.
    #[arg(long, env = "ARBELOS_PUBLIC_KEY", global = true)]
    public_key: Option<String>,
    /// Hex private key used to sign requests.
    #[arg(long, env = "ARBELOS_PRIVATE_KEY", hide_env_values = true, global = true)]
    private_key: Option<String>,
    /// API base URL. Defaults to the development API.
    #[arg(long, env = "ARBELOS_BASE_URL", global = true)]
    base_url: Option<Url>,
    /// Request timeout in seconds.
    #[arg(long, default_value_t = 10, global = true)]
    timeout: u64,
    /// Log requests.
    #[arg(short, long, global = true)]
    verbose: bool,
}

impl Global {
    fn private_key(&self) -> anyhow::Result<PrivateKey> {
        let key = self
            .private_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Missing private key. Use --private-key"))?;
        Ok(key.parse()?)
    }

    fn client(&self) -> anyhow::Result<rfq::HttpClient> {
        let public_key = self
            .public_key
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Missing public key. Use --public-key"))?;
        let credentials = Credentials::from_parts(public_key, self.private_key()?);

        let mut client = rfq::dev(credentials).with_timeout(Duration::from_secs(self.timeout));
        if let Some(url) = self.base_url.clone() {
            client = client.with_url(url);
        }
        Ok(client)
    }
}

#[enum_dispatch]
trait Run {
    async fn run(&self, global: &Global) -> anyhow::Result<()>;
}

#[derive(Subcommand)]
#[enum_dispatch(Run)]
enum Commands {
    /// Service status
    Status(StatusCmd),
    /// Traded volumes
    Volumes(VolumesCmd),
    /// Instruments available for quoting
    Instruments(InstrumentsCmd),
    /// Request quotes
    Quotes(QuotesCmd),
    /// Execute a trade against a quote
    Trade(TradeCmd),
    /// Trade history
    Trades(TradesCmd),
    /// Account balances
    Balances(BalancesCmd),
    /// Sign parameters offline and print the signature
    Sign(SignCmd),
    /// Check a signature against parameters
    Verify(VerifyCmd),
    /// Print the public key of the private key
    Pubkey(PubkeyCmd),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let level = if args.global.verbose {
        log::Level::Debug
    } else {
        log::Level::Warn
    };
    let _ = simple_logger::init_with_level(level);

    args.command.run(&args.global).await
}

fn print_json(endpoint: rfq::Endpoint, value: Option<Value>) -> anyhow::Result<()> {
    let value = value.ok_or_else(|| anyhow::anyhow!("request to {endpoint} failed"))?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Numbers are sent as numbers, everything else as strings.
fn parse_value(raw: &str) -> ParamValue {
    if let Ok(v) = raw.parse::<i64>() {
        ParamValue::Int(v)
    } else if let Ok(v) = raw.parse::<f64>() {
        ParamValue::Float(v)
    } else {
        ParamValue::Str(raw.to_owned())
    }
}

fn parse_params(time: Option<u64>, pairs: &[String]) -> anyhow::Result<Params> {
    let time = time.unwrap_or_else(|| rfq::TimeHandler::default().next());
    let mut params = Params::new(time);
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("expected key=value, got {pair:?}"))?;
        params.insert(key, parse_value(value));
    }
    Ok(params)
}

#[derive(Args)]
struct StatusCmd;

impl Run for StatusCmd {
    async fn run(&self, global: &Global) -> anyhow::Result<()> {
        print_json(rfq::Endpoint::Status, global.client()?.status().await?)
    }
}

#[derive(Args)]
struct VolumesCmd;

impl Run for VolumesCmd {
    async fn run(&self, global: &Global) -> anyhow::Result<()> {
        print_json(rfq::Endpoint::Volumes, global.client()?.volumes().await?)
    }
}

#[derive(Args)]
struct InstrumentsCmd;

impl Run for InstrumentsCmd {
    async fn run(&self, global: &Global) -> anyhow::Result<()> {
        print_json(
            rfq::Endpoint::Instruments,
            global.client()?.instruments().await?,
        )
    }
}

#[derive(Args)]
struct TradesCmd;

impl Run for TradesCmd {
    async fn run(&self, global: &Global) -> anyhow::Result<()> {
        print_json(rfq::Endpoint::Trades, global.client()?.trades().await?)
    }
}

#[derive(Args)]
struct BalancesCmd;

impl Run for BalancesCmd {
    async fn run(&self, global: &Global) -> anyhow::Result<()> {
        print_json(rfq::Endpoint::Balances, global.client()?.balances().await?)
    }
}

#[derive(Args)]
struct QuotesCmd {
    /// Instruments to quote, e.g. "s sol" "s btc".
    #[arg(required = true)]
    instruments: Vec<String>,
    /// Print the raw JSON response.
    #[arg(long)]
    json: bool,
}

impl Run for QuotesCmd {
    async fn run(&self, global: &Global) -> anyhow::Result<()> {
        let quotes: Quotes = global
            .client()?
            .quotes(&self.instruments)
            .await?
            .ok_or_else(|| anyhow::anyhow!("request to {} failed", rfq::Endpoint::Quotes))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&quotes)?);
            return Ok(());
        }

        let show = |value: &Option<ParamValue>| {
            value
                .as_ref()
                .and_then(|v| v.canonical().map(|s| s.into_owned()))
                .unwrap_or_else(|| "-".to_owned())
        };
        let show_qty = |value: Option<f64>| value.map_or_else(|| "-".to_owned(), |v| v.to_string());

        let mut writer = tabwriter::TabWriter::new(stdout());
        writeln!(&mut writer, "ask id\tmax ask\tbid id\tmax bid")?;
        for quote in &quotes.quotes {
            writeln!(
                &mut writer,
                "{}\t{}\t{}\t{}",
                show(&quote.quote_id_ask),
                show_qty(quote.max_quantity_ask),
                show(&quote.quote_id_bid),
                show_qty(quote.max_quantity_bid),
            )?;
        }
        writer.flush()?;

        Ok(())
    }
}

#[derive(Args)]
struct TradeCmd {
    /// Quote id from `quotes`.
    quote_id: String,
    /// Quantity to trade.
    quantity: f64,
    /// Send the quote id as a JSON integer instead of a string.
    #[arg(long)]
    numeric_id: bool,
}

impl TradeCmd {
    fn quote_id(&self) -> anyhow::Result<ParamValue> {
        if self.numeric_id {
            let id: i64 = self.quote_id.parse().map_err(|err| {
                anyhow::anyhow!("quote id {:?} is not an integer: {err}", self.quote_id)
            })?;
            Ok(ParamValue::Int(id))
        } else {
            Ok(ParamValue::Str(self.quote_id.clone()))
        }
    }
}

impl Run for TradeCmd {
    async fn run(&self, global: &Global) -> anyhow::Result<()> {
        let resp = global
            .client()?
            .execute_trade(self.quote_id()?, self.quantity)
            .await?;
        print_json(rfq::Endpoint::Trade, resp)
    }
}

#[derive(Args)]
struct SignCmd {
    /// Timestamp in milliseconds. Defaults to now.
    #[arg(long)]
    time: Option<u64>,
    /// Parameters as `key=value`.
    params: Vec<String>,
}

impl Run for SignCmd {
    async fn run(&self, global: &Global) -> anyhow::Result<()> {
        let key = global.private_key()?;
        let params = parse_params(self.time, &self.params)?;

        let base = params.signing_base()?;
        let signature = signing::sign(&params, &key)?;

        let mut writer = tabwriter::TabWriter::new(stdout());
        writeln!(&mut writer, "base\t{base}")?;
        writeln!(&mut writer, "body\t{}", serde_json::to_string(&params)?)?;
        writeln!(&mut writer, "signature\t{signature}")?;
        writer.flush()?;

        Ok(())
    }
}

#[derive(Args)]
struct VerifyCmd {
    /// SEC1 public key in hex.
    #[arg(long)]
    key: String,
    /// Hex DER signature.
    #[arg(long)]
    signature: String,
    /// Timestamp in milliseconds that was signed.
    #[arg(long)]
    time: u64,
    /// Other signed parameters as `key=value`.
    params: Vec<String>,
}

impl Run for VerifyCmd {
    async fn run(&self, _global: &Global) -> anyhow::Result<()> {
        let key = signing::verifying_key_from_hex(&self.key)?;
        let params = parse_params(Some(self.time), &self.params)?;

        if signing::verify(&params, &self.signature, &key) {
            println!("valid");
            Ok(())
        } else {
            anyhow::bail!("invalid signature for {:?}", params.signing_base()?)
        }
    }
}

#[derive(Args)]
struct PubkeyCmd;

impl Run for PubkeyCmd {
    async fn run(&self, global: &Global) -> anyhow::Result<()> {
        println!("{}", global.private_key()?.public_key_hex());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42"), ParamValue::Int(42));
        assert_eq!(parse_value("0.5"), ParamValue::Float(0.5));
        assert_eq!(parse_value("s sol"), ParamValue::Str("s sol".into()));
    }

    #[test]
    fn test_parse_params() {
        let params = parse_params(Some(1700000000000), &["quote_id=q-1".into(), "quantity=0.5".into()])
            .unwrap();
        assert_eq!(
            params.signing_base().unwrap(),
            "quantity=0.5&quote_id=q-1&time=1700000000000"
        );
        assert!(parse_params(Some(1), &["novalue".into()]).is_err());
    }

    #[test]
    fn test_trade_quote_id_stays_string() {
        let trade = |args: &[&str]| match Cli::try_parse_from(args).unwrap().command {
            Commands::Trade(cmd) => cmd,
            _ => panic!("expected trade"),
        };

        let cmd = trade(&["rfqcli", "trade", "123", "0.5"]);
        assert_eq!(cmd.quote_id().unwrap(), ParamValue::Str("123".into()));

        let cmd = trade(&["rfqcli", "trade", "--numeric-id", "123", "0.5"]);
        assert_eq!(cmd.quote_id().unwrap(), ParamValue::Int(123));

        let cmd = trade(&["rfqcli", "trade", "--numeric-id", "q-1", "0.5"]);
        assert!(cmd.quote_id().is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "rfqcli",
            "--public-key",
            "api",
            "quotes",
            "s sol",
            "s btc",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Quotes(ref q) if q.instruments.len() == 2));
        assert_eq!(cli.global.public_key.as_deref(), Some("api"));
    }
}
