//! Client SDK for the AppNexus console API.
//!
//! Every call goes through one pipeline on [`Client`]:
//! - build: resolve the path against the endpoint, encode the JSON body, attach
//!   the `User-Agent` and the session token (`Authorization`, sent verbatim)
//! - throttle: wait out the read or write window when the last reported usage
//!   is one below the limit
//! - dispatch: send, reject non-2xx statuses, decode the `{"response": ..}`
//!   envelope, record its rate snapshot and surface envelope-level errors
//! - reauthenticate: on `NOAUTH`, log in again with the stored credentials and
//!   replay the call once
//!
//! ```no_run
//! use appnexus_client_sdk::{Client, ListOptions, SANDBOX_ENDPOINT};
//!
//! # async fn run() -> appnexus_client_sdk::Result<()> {
//! let client = Client::new(SANDBOX_ENDPOINT)?;
//! client.login("api-user", "secret").await?;
//!
//! let page = client.deals().list(ListOptions::default()).await?;
//! for deal in &page.items {
//!     println!("{} {}", deal.code, deal.name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! A [`Client`] may be cloned and shared across tasks. Session updates are
//! serialized internally, but the throttle only sees the snapshot from the
//! most recent response, so concurrent callers can still exceed a limit.

pub mod error;
pub mod services;

mod auth;
mod client;
mod config;
mod policy;
mod rate_limit;
mod response;
mod serde_helpers;
mod types;

use std::result::Result as StdResult;

pub use auth::Credentials;
pub use client::Client;
pub use config::{Config, DEFAULT_USER_AGENT, PRODUCTION_ENDPOINT, SANDBOX_ENDPOINT};
pub use error::{Error, Kind};
pub use policy::{ReauthPolicy, ThrottlePolicy};
pub use rate_limit::{RateClass, RateSnapshot};
pub use response::{Envelope, ObjectId, Pagination, Response};
pub use types::{ListOptions, Page};

pub type Result<T> = StdResult<T, Error>;
