use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue, USER_AGENT};
use reqwest::{Client as ReqwestClient, Method, Request};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::Result;
use crate::auth::{self, AUTH_PATH, Credentials, LoginBody};
use crate::config::Config;
use crate::error::{Api, Error, Kind};
use crate::rate_limit::{self, RateSnapshot};
use crate::response::{Envelope, Response, Wire};
use crate::serde_helpers;
use crate::services::{
    DealService, MemberService, PlacementService, PublisherService, SegmentService, SiteService,
};

/// Mutable per-session state. Only `login`, reauthentication and the
/// dispatcher write to it.
#[derive(Debug, Default)]
struct Session {
    credentials: Option<Credentials>,
    token: Option<SecretString>,
    rate: RateSnapshot,
}

#[derive(Debug)]
struct ClientInner {
    config: Config,
    auth_url: Url,
    http: ReqwestClient,
    session: RwLock<Session>,
}

/// Outcome of a single successful HTTP exchange.
struct Exchange {
    envelope: Envelope,
    body: Vec<u8>,
    session_cookie: Option<SecretString>,
}

/// AppNexus API client.
///
/// Cheap to clone; clones share one session (token, credentials and rate
/// snapshot). Session state sits behind a lock that is never held across a
/// request, so concurrent callers may throttle on a slightly stale snapshot.
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Creates an unauthenticated client for `endpoint` with default policies.
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_config(Config::new(endpoint)?)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_config_and_client(config, ReqwestClient::new())
    }

    /// Creates a client on top of a caller-configured HTTP client (timeouts, proxies, TLS).
    pub fn with_config_and_client(config: Config, http: ReqwestClient) -> Result<Self> {
        let config = config.validate()?;
        let auth_url = config.endpoint.join(AUTH_PATH)?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                auth_url,
                http,
                session: RwLock::new(Session::default()),
            }),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.config.endpoint
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.inner.config.user_agent
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Rate usage reported by the most recent decoded response.
    #[must_use]
    pub fn rate(&self) -> RateSnapshot {
        self.session().rate
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session().token.is_some()
    }

    /// Drops the session token and the stored credentials.
    pub fn logout(&self) {
        let mut session = self.session_mut();
        session.token = None;
        session.credentials = None;
    }

    #[must_use]
    pub fn deals(&self) -> DealService<'_> {
        DealService::new(self)
    }

    #[must_use]
    pub fn placements(&self) -> PlacementService<'_> {
        PlacementService::new(self)
    }

    #[must_use]
    pub fn publishers(&self) -> PublisherService<'_> {
        PublisherService::new(self)
    }

    #[must_use]
    pub fn sites(&self) -> SiteService<'_> {
        SiteService::new(self)
    }

    #[must_use]
    pub fn members(&self) -> MemberService<'_> {
        MemberService::new(self)
    }

    #[must_use]
    pub fn segments(&self) -> SegmentService<'_> {
        SegmentService::new(self)
    }

    /// Logs in and stores `username`/`password` for silent reauthentication.
    ///
    /// The session token is read from the first cookie of the raw HTTP
    /// response, not from the JSON envelope.
    pub async fn login<U: Into<String>, P: Into<SecretString>>(
        &self,
        username: U,
        password: P,
    ) -> Result<()> {
        let credentials = Credentials::new(username, password);
        self.session_mut().credentials = Some(credentials.clone());

        self.authenticate(&credentials).await
    }

    /// Builds a request for `path`, resolved against the endpoint.
    pub fn build_request(&self, method: Method, path: &str) -> Result<Request> {
        self.build(method, path, None)
    }

    /// Builds a request for `path` carrying `body` as JSON.
    pub fn build_request_with_body<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Request> {
        let body =
            serde_json::to_vec(body).map_err(|e| Error::with_source(Kind::Serialization, e))?;
        self.build(method, path, Some(body))
    }

    /// Sends `request` and returns the decoded envelope.
    ///
    /// A `NOAUTH` failure on any path but `auth` triggers one login with the
    /// stored credentials followed by a single replay of the request.
    pub async fn dispatch(&self, request: Request) -> Result<Envelope> {
        self.execute(request).await.map(|exchange| exchange.envelope)
    }

    /// Like [`Client::dispatch`], then decodes the `response` member of the
    /// same body into `T`.
    pub async fn dispatch_into<T: DeserializeOwned + Default>(
        &self,
        request: Request,
    ) -> Result<Response<T>> {
        let exchange = self.execute(request).await?;
        let data = if exchange.body.is_empty() {
            T::default()
        } else {
            serde_helpers::decode::<Wire<T>>(&exchange.body)?.response
        };

        Ok(Response {
            envelope: exchange.envelope,
            data,
        })
    }

    /// Waits out the rate window for `method` if the last snapshot demands it.
    ///
    /// Returns the time waited, zero when no wait was needed.
    pub async fn wait_for_rate_limit(&self, method: &Method) -> Duration {
        if !self.inner.config.throttle.is_enabled() {
            return Duration::ZERO;
        }

        rate_limit::throttle(self.rate(), method).await
    }

    fn build(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> Result<Request> {
        let url = self.inner.config.endpoint.join(path)?;

        let mut builder = self
            .inner
            .http
            .request(method, url)
            .header(USER_AGENT, self.inner.config.user_agent.as_str());
        if let Some(body) = body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let mut request = builder
            .build()
            .map_err(|e| Error::with_source(Kind::Validation, e))?;
        self.authorize(&mut request)?;

        Ok(request)
    }

    /// Sets `Authorization` to the current token verbatim, or removes it when logged out.
    fn authorize(&self, request: &mut Request) -> Result<()> {
        let value = match &self.session().token {
            Some(token) => {
                let mut value = HeaderValue::from_str(token.expose_secret())
                    .map_err(|e| Error::with_source(Kind::Auth, e))?;
                value.set_sensitive(true);
                Some(value)
            }
            None => None,
        };

        match value {
            Some(value) => request.headers_mut().insert(AUTHORIZATION, value),
            None => request.headers_mut().remove(AUTHORIZATION),
        };

        Ok(())
    }

    fn is_auth_request(&self, request: &Request) -> bool {
        request.url().path() == self.inner.auth_url.path()
    }

    async fn execute(&self, mut request: Request) -> Result<Exchange> {
        let retryable = !self.is_auth_request(&request);
        let max_attempts = self.inner.config.reauthentication.max_attempts();
        let mut attempt = 1;

        loop {
            let replay = if retryable && attempt < max_attempts {
                request.try_clone()
            } else {
                None
            };

            let err = match self.send(request).await {
                Ok(exchange) => return Ok(exchange),
                Err(err) => err,
            };
            if !err.is_not_authenticated() {
                return Err(err);
            }
            let Some(mut next) = replay else {
                return Err(err);
            };

            #[cfg(feature = "tracing")]
            tracing::info!(
                path = next.url().path(),
                attempt,
                "session not authenticated, logging in again"
            );

            self.reauthenticate().await?;
            self.authorize(&mut next)?;
            request = next;
            attempt += 1;
        }
    }

    async fn reauthenticate(&self) -> Result<()> {
        let credentials = {
            let mut session = self.session_mut();
            session.token = None;
            session.credentials.clone()
        };

        let Some(credentials) = credentials else {
            return Err(Error::reauthentication(Error::auth(
                "no stored credentials to log in with",
            )));
        };

        self.authenticate(&credentials)
            .await
            .map_err(Error::reauthentication)
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<()> {
        let request =
            self.build_request_with_body(Method::POST, AUTH_PATH, &LoginBody::new(credentials))?;
        let exchange = self.send(request).await?;

        let token = exchange
            .session_cookie
            .ok_or_else(|| Error::auth("login response carried no session cookie"))?;
        self.session_mut().token = Some(token);

        #[cfg(feature = "tracing")]
        tracing::info!(username = credentials.username(), "logged in");

        Ok(())
    }

    /// One throttled HTTP exchange with envelope decoding and classification.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            level = "debug",
            skip_all,
            fields(method = %request.method(), path = request.url().path(), status_code)
        )
    )]
    async fn send(&self, request: Request) -> Result<Exchange> {
        let method = request.method().clone();
        let path = request.url().path().to_owned();

        self.wait_for_rate_limit(&method).await;

        let response = self
            .inner
            .http
            .execute(request)
            .await
            .map_err(|e| Error::with_source(Kind::Dispatch, e))?;
        let status_code = response.status();

        #[cfg(feature = "tracing")]
        tracing::Span::current().record("status_code", status_code.as_u16());

        let session_cookie = auth::session_cookie(&response);
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::with_source(Kind::Dispatch, e))?
            .to_vec();

        if !status_code.is_success() {
            let message = String::from_utf8_lossy(&body).into_owned();

            #[cfg(feature = "tracing")]
            tracing::warn!(
                status = %status_code,
                method = %method,
                path = %path,
                message = %message,
                "API request failed"
            );

            return Err(Error::http_status(
                status_code,
                method,
                path,
                headers,
                message,
            ));
        }

        if body.is_empty() {
            return Ok(Exchange {
                envelope: Envelope::default(),
                body,
                session_cookie,
            });
        }

        let envelope = serde_helpers::decode::<Wire<Envelope>>(&body)?.response;
        self.session_mut().rate = envelope.rate;

        if envelope.is_error() {
            let err = Api::from_envelope(envelope);

            #[cfg(feature = "tracing")]
            tracing::warn!(method = %method, path = %path, error = %err, "API call reported an error");

            return Err(err.into());
        }

        Ok(Exchange {
            envelope,
            body,
            session_cookie,
        })
    }

    fn session(&self) -> RwLockReadGuard<'_, Session> {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn session_mut(&self) -> RwLockWriteGuard<'_, Session> {
        self.inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
