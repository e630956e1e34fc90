use bon::Builder;
use serde::Serialize;

use crate::Result;
use crate::error::{Error, Kind};
use crate::response::{Envelope, Pagination};

/// Optional parameters accepted by the `list` operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Builder)]
#[non_exhaustive]
pub struct ListOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_element: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_elements: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl ListOptions {
    /// Options for the page following `pagination`, or `None` past the last one.
    #[must_use]
    pub fn next_page(self, pagination: Pagination) -> Option<Self> {
        if !pagination.has_more() {
            return None;
        }
        Some(Self {
            start_element: Some(pagination.next_start()),
            ..self
        })
    }

    /// Appends these options to `path` as query parameters.
    pub(crate) fn apply(&self, path: &str) -> Result<String> {
        let query =
            serde_html_form::to_string(self).map_err(|e| Error::with_source(Kind::Serialization, e))?;
        if query.is_empty() {
            return Ok(path.to_owned());
        }

        let separator = if path.contains('?') { '&' } else { '?' };
        Ok(format!("{path}{separator}{query}"))
    }
}

/// One page of a `list` call.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct Page<T> {
    pub items: Vec<T>,
    pub envelope: Envelope,
}

impl<T> Page<T> {
    #[must_use]
    pub fn pagination(&self) -> Option<Pagination> {
        self.envelope.pagination()
    }
}
