use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};

use crate::response::Envelope;

/// Error identifier the API returns when the session token is missing or expired.
pub const NOT_AUTHENTICATED: &str = "NOAUTH";

#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Path could not be resolved against the configured endpoint
    Path,
    /// Request body could not be encoded as JSON
    Serialization,
    /// Response body could not be decoded
    Decode,
    /// Transport failure (connection refused, timeout, DNS)
    Dispatch,
    /// Non-2xx HTTP status
    Status,
    /// 2xx response whose envelope carries an error identifier or message
    Api,
    /// Login succeeded at the HTTP level but yielded no usable session token
    Auth,
    /// Automatic login after a `NOAUTH` response failed
    Reauthentication,
    /// Invalid input or configuration detected before any request was made
    Validation,
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    backtrace: Backtrace,
}

impl Error {
    #[must_use]
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            backtrace: Backtrace::capture(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    #[must_use]
    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let e = self.source.as_deref()?;
        e.downcast_ref::<E>()
    }

    /// The envelope-level failure, if this is a [`Kind::Api`] error.
    #[must_use]
    pub fn api(&self) -> Option<&Api> {
        if self.kind == Kind::Api {
            self.downcast_ref::<Api>()
        } else {
            None
        }
    }

    /// The HTTP status failure, if this is a [`Kind::Status`] error.
    #[must_use]
    pub fn status(&self) -> Option<&Status> {
        if self.kind == Kind::Status {
            self.downcast_ref::<Status>()
        } else {
            None
        }
    }

    /// `true` when the server rejected the call because the session is not authenticated.
    #[must_use]
    pub fn is_not_authenticated(&self) -> bool {
        self.api()
            .is_some_and(|api| api.error_id.as_deref() == Some(NOT_AUTHENTICATED))
    }

    #[must_use]
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Validation {
            reason: message.into(),
        }
        .into()
    }

    pub(crate) fn auth<S: Into<String>>(message: S) -> Self {
        Self::with_source(
            Kind::Auth,
            Validation {
                reason: message.into(),
            },
        )
    }

    pub(crate) fn reauthentication(cause: Error) -> Self {
        Self::with_source(Kind::Reauthentication, cause)
    }

    pub(crate) fn http_status(
        status_code: StatusCode,
        method: Method,
        path: String,
        headers: HeaderMap,
        message: String,
    ) -> Self {
        let retry_after = headers
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        Status {
            status_code,
            method,
            path,
            headers,
            retry_after,
            message,
        }
        .into()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(src) => write!(f, "{:?}: {src}", self.kind),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// HTTP call completed with a status outside `200..=299`.
///
/// `429 Too Many Requests` lands here as well; it is not retried, but the
/// parsed `Retry-After` value is kept so the caller can schedule its own retry.
#[non_exhaustive]
#[derive(Debug)]
pub struct Status {
    pub status_code: StatusCode,
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub retry_after: Option<Duration>,
    pub message: String,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error({}) making {} call to {} with {} | {:?}",
            self.status_code, self.method, self.path, self.message, self.headers
        )
    }
}

impl StdError for Status {}

/// Logical failure reported inside a 2xx envelope.
///
/// The decoded envelope is kept so callers can inspect the identifier and the
/// rate snapshot that came with the failure.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub struct Api {
    pub error_id: Option<String>,
    pub message: Option<String>,
    pub description: Option<String>,
    pub code: Option<String>,
    pub envelope: Envelope,
}

impl Api {
    pub(crate) fn from_envelope(envelope: Envelope) -> Self {
        Self {
            error_id: envelope.error_id.clone(),
            message: envelope.error.clone(),
            description: envelope.error_description.clone(),
            code: envelope.error_code.clone(),
            envelope,
        }
    }
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]: {}",
            self.error_id.as_deref().unwrap_or_default(),
            self.message.as_deref().unwrap_or_default()
        )
    }
}

impl StdError for Api {}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub reason: String,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid: {}", self.reason)
    }
}

impl StdError for Validation {}

impl From<Validation> for Error {
    fn from(err: Validation) -> Self {
        Error::with_source(Kind::Validation, err)
    }
}

impl From<Status> for Error {
    fn from(err: Status) -> Self {
        Error::with_source(Kind::Status, err)
    }
}

impl From<Api> for Error {
    fn from(err: Api) -> Self {
        Error::with_source(Kind::Api, err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(Kind::Path, err)
    }
}
