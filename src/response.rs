use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, NoneAsEmptyString, serde_as};

use crate::rate_limit::RateSnapshot;

/// Top-level `{"response": ...}` wrapper every API body is sent in.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned + Default"))]
pub(crate) struct Wire<T> {
    #[serde(default)]
    pub(crate) response: T,
}

/// Identifier returned by write calls; the API sends it as a number or a string.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum ObjectId {
    Number(i64),
    Text(String),
}

impl ObjectId {
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ObjectId::Number(id) => Some(*id),
            ObjectId::Text(id) => id.trim().parse().ok(),
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::Number(id) => write!(f, "{id}"),
            ObjectId::Text(id) => f.write_str(id),
        }
    }
}

/// Generic part of every response: status, error, pagination and rate telemetry.
///
/// Empty strings in the error fields decode as `None`, so a present field
/// always means the server reported something.
#[serde_as]
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Envelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_id: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_element: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_elements: Option<u64>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(rename = "dbg_info")]
    pub rate: RateSnapshot,
}

impl Envelope {
    /// A call failed logically when either error field is present, whatever the HTTP status.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error_id.is_some() || self.error.is_some()
    }

    #[must_use]
    pub fn pagination(&self) -> Option<Pagination> {
        let count = self.count?;
        Some(Pagination {
            count,
            start_element: self.start_element.unwrap_or_default(),
            num_elements: self.num_elements.unwrap_or_default(),
        })
    }
}

/// Position of a list response within the full result set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct Pagination {
    pub count: u64,
    pub start_element: u64,
    pub num_elements: u64,
}

impl Pagination {
    /// Index of the first element after this page, pinned at `u64::MAX`.
    #[must_use]
    pub fn next_start(&self) -> u64 {
        self.start_element.saturating_add(self.num_elements)
    }

    /// `true` while elements remain past this page.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.next_start() < self.count
    }
}

/// Generic envelope plus a payload decoded from the same body in a second pass.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct Response<T> {
    pub envelope: Envelope,
    pub data: T,
}
