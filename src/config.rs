use bon::Builder;
use reqwest::header::HeaderValue;
use url::Url;

use crate::Result;
use crate::error::Error;
use crate::policy::{ReauthPolicy, ThrottlePolicy};

pub const PRODUCTION_ENDPOINT: &str = "https://api.appnexus.com/";
pub const SANDBOX_ENDPOINT: &str = "https://sand-api.appnexus.com/";

/// Value sent in the `User-Agent` header unless overridden.
pub const DEFAULT_USER_AGENT: &str = concat!("appnexus-client-sdk/", env!("CARGO_PKG_VERSION"));

/// Client configuration.
///
/// ```
/// use appnexus_client_sdk::{Config, ThrottlePolicy};
///
/// let config = Config::builder()
///     .endpoint("https://sand-api.appnexus.com/".parse()?)
///     .throttle(ThrottlePolicy::Disabled)
///     .build();
/// # Ok::<(), url::ParseError>(())
/// ```
#[derive(Clone, Debug, Builder)]
#[non_exhaustive]
pub struct Config {
    pub endpoint: Url,
    #[builder(into, default = DEFAULT_USER_AGENT.to_owned())]
    pub user_agent: String,
    #[builder(default)]
    pub throttle: ThrottlePolicy,
    #[builder(default)]
    pub reauthentication: ReauthPolicy,
}

impl Config {
    /// Parses `endpoint` and uses default policies.
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        Ok(Self::builder().endpoint(endpoint).build())
    }

    /// Checks the endpoint and normalizes it so relative paths join under it.
    pub(crate) fn validate(mut self) -> Result<Self> {
        if !matches!(self.endpoint.scheme(), "http" | "https") {
            return Err(Error::validation(format!(
                "endpoint must be http or https, got `{}`",
                self.endpoint
            )));
        }
        if self.endpoint.cannot_be_a_base() {
            return Err(Error::validation(format!(
                "endpoint `{}` cannot be used as a base URL",
                self.endpoint
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(Error::validation("user agent must not be empty"));
        }
        if HeaderValue::from_str(&self.user_agent).is_err() {
            return Err(Error::validation(format!(
                "user agent `{}` is not a valid header value",
                self.user_agent
            )));
        }

        if !self.endpoint.path().ends_with('/') {
            let path = format!("{}/", self.endpoint.path());
            self.endpoint.set_path(&path);
        }

        Ok(self)
    }
}
