use arbelos_rfq::rfq::{self, Credentials};
use clap::Args;
use url::Url;

#[derive(Debug, Args)]
pub struct Connection {
    /// API public key, sent as `x-api-key`.
    #[arg(long, env = "ARBELOS_PUBLIC_KEY")]
    public_key: Option<String>,
    /// Hex private key used to sign requests.
    #[arg(long, env = "ARBELOS_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,
    /// API base URL. Defaults to the development API.
    #[arg(long, env = "ARBELOS_BASE_URL")]
    base_url: Option<Url>,
}

impl Connection {
    pub fn credentials(&self) -> anyhow::Result<Credentials> {
        match (self.public_key.as_ref(), self.private_key.as_ref()) {
            (Some(public_key), Some(private_key)) => {
                Ok(Credentials::new(public_key.as_str(), private_key)?)
            }
            (None, _) => Err(anyhow::anyhow!(
                "Missing public key. Use --public-key or ARBELOS_PUBLIC_KEY"
            )),
            (_, None) => Err(anyhow::anyhow!(
                "Missing private key. Use --private-key or ARBELOS_PRIVATE_KEY"
            )),
        }
    }

    pub fn client(&self) -> anyhow::Result<rfq::HttpClient> {
        let client = rfq::dev(self.credentials()?);
        Ok(match self.base_url.clone() {
            Some(url) => client.with_url(url),
            None => client,
        })
    }
}
