//! Typed CRUD wrappers over [`Client`](crate::Client) for each API service.
//!
//! Services own path construction and field schemas; everything else goes
//! through `build_request*` and `dispatch*` on the client.

mod deals;
mod members;
mod placements;
mod publishers;
mod segments;
mod sites;

pub use deals::{Deal, DealService, IdRef};
pub use members::{Member, MemberService};
pub use placements::{Placement, PlacementService};
pub use publishers::{Publisher, PublisherService};
pub use segments::{Segment, SegmentService};
pub use sites::{Site, SiteService};

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Result;
use crate::client::Client;
use crate::error::{Error, Kind, Validation};
use crate::response::{Envelope, ObjectId, Response};
use crate::types::{ListOptions, Page};

pub(crate) async fn fetch<P: DeserializeOwned + Default>(
    client: &Client,
    path: &str,
) -> Result<Response<P>> {
    let request = client.build_request(Method::GET, path)?;
    client.dispatch_into::<P>(request).await
}

pub(crate) async fn fetch_page<P, T, F>(
    client: &Client,
    path: &str,
    options: ListOptions,
    items: F,
) -> Result<Page<T>>
where
    P: DeserializeOwned + Default,
    F: FnOnce(P) -> Vec<T>,
{
    let path = options.apply(path)?;
    let Response { envelope, data } = fetch::<P>(client, &path).await?;

    Ok(Page {
        items: items(data),
        envelope,
    })
}

pub(crate) async fn send_body<B: Serialize>(
    client: &Client,
    method: Method,
    path: &str,
    body: &B,
) -> Result<Envelope> {
    let request = client.build_request_with_body(method, path, body)?;
    client.dispatch(request).await
}

pub(crate) async fn remove(client: &Client, path: &str) -> Result<Envelope> {
    let request = client.build_request(Method::DELETE, path)?;
    client.dispatch(request).await
}

/// Id assigned by the server to a freshly created object.
pub(crate) fn created_id(envelope: &Envelope) -> Option<i64> {
    envelope.id.as_ref().and_then(ObjectId::as_i64)
}

/// Updates address an existing object, so the item must carry a positive id.
pub(crate) fn existing_id(resource: &str, id: Option<i64>) -> Result<i64> {
    match id {
        Some(id) if id >= 1 => Ok(id),
        _ => Err(Error::validation(format!(
            "update {resource} requires a {resource} to have an id already"
        ))),
    }
}

/// Objects scoped under a parent address it through a positive parent id.
pub(crate) fn parent_id(resource: &str, parent: &str, id: i64) -> Result<i64> {
    if id >= 1 {
        Ok(id)
    } else {
        Err(Error::validation(format!(
            "{resource} requires a positive {parent} id, got {id}"
        )))
    }
}

pub(crate) fn missing(resource: &str) -> Error {
    Error::with_source(
        Kind::Decode,
        Validation {
            reason: format!("response carried no {resource}"),
        },
    )
}
