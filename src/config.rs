//! Connection settings for the cluster.

use clap::Args;
use reqwest::Url;
use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::infra::elasticsearch::EsSecurityClient;
use crate::transport::{BasicAuth, BasicClient};

/// Where the cluster lives and how to log in to it.
///
/// Each field can come from a flag or from the environment (a `.env` file is
/// honoured by the binary).
#[derive(Args, Clone)]
pub struct ClusterConfig {
    /// Elasticsearch URL
    #[arg(long, env = "ES_URL")]
    pub url: String,

    /// Username to use to connect to elasticsearch using basic auth
    #[arg(long, env = "ES_USERNAME")]
    pub username: String,

    /// Password to use to connect to elasticsearch using basic auth
    #[arg(long, env = "ES_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Accept invalid or self-signed TLS certificates
    #[arg(long, env = "ES_INSECURE", default_value_t = false)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "ES_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

pub type Client = EsSecurityClient<BasicAuth<BasicClient>>;

impl ClusterConfig {
    /// Checks the settings and returns the parsed endpoint URL.
    pub fn validate(&self) -> Result<Url> {
        if self.username.is_empty() {
            return Err(Error::input("username must not be empty"));
        }
        if self.password.is_empty() {
            return Err(Error::input("password must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::input("timeout must be at least one second"));
        }

        let url = Url::parse(&self.url)
            .map_err(|e| Error::input(format!("invalid Elasticsearch URL '{}': {e}", self.url)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::input(format!(
                "unsupported URL scheme '{other}', expected http or https"
            ))),
        }
    }

    /// Builds the authenticated security API client.
    pub fn connect(&self) -> Result<Client> {
        let url = self.validate()?;
        let http = BasicClient::with_options(Duration::from_secs(self.timeout_secs), self.insecure)
            .map_err(|e| Error::input(format!("Failed to create Elasticsearch client: {e}")))?;
        Ok(EsSecurityClient::new(
            url,
            BasicAuth::new(http, &self.username, &self.password),
        ))
    }
}

impl fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("insecure", &self.insecure)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
