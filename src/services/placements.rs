use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::client::Client;
use crate::response::Envelope;
use crate::services::{
    created_id, existing_id, fetch, fetch_page, missing, parent_id, remove, send_body,
};
use crate::types::{ListOptions, Page};

/// Ad placement (tag) belonging to a publisher, optionally grouped under a site.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
#[non_exhaustive]
pub struct Placement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub publisher_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i64>,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlacementPayload {
    placement: Option<Placement>,
    placements: Vec<Placement>,
}

#[derive(Serialize)]
struct PlacementBody<'body> {
    placement: &'body Placement,
}

#[derive(Clone, Copy, Debug)]
pub struct PlacementService<'client> {
    client: &'client Client,
}

impl<'client> PlacementService<'client> {
    pub(crate) fn new(client: &'client Client) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: i64) -> Result<Placement> {
        let response =
            fetch::<PlacementPayload>(self.client, &format!("placement?id={id}")).await?;
        response.data.placement.ok_or_else(|| missing("placement"))
    }

    /// Placements of one publisher.
    pub async fn list(&self, publisher_id: i64, options: ListOptions) -> Result<Page<Placement>> {
        fetch_page(
            self.client,
            &format!("placement?publisher_id={publisher_id}"),
            options,
            |payload: PlacementPayload| payload.placements,
        )
        .await
    }

    /// Creates `item` under its own `publisher_id` and stores the assigned id.
    pub async fn add(&self, item: &mut Placement) -> Result<Envelope> {
        let publisher_id = parent_id("placement", "publisher", item.publisher_id)?;
        let envelope = send_body(
            self.client,
            Method::POST,
            &format!("placement?publisher_id={publisher_id}"),
            &PlacementBody { placement: &*item },
        )
        .await?;
        item.id = created_id(&envelope);
        Ok(envelope)
    }

    pub async fn update(&self, item: &Placement) -> Result<Envelope> {
        let id = existing_id("placement", item.id)?;
        let publisher_id = parent_id("placement", "publisher", item.publisher_id)?;
        send_body(
            self.client,
            Method::PUT,
            &format!("placement?id={id}&publisher_id={publisher_id}"),
            &PlacementBody { placement: item },
        )
        .await
    }

    pub async fn delete(&self, id: i64, publisher_id: i64) -> Result<Envelope> {
        remove(
            self.client,
            &format!("placement?id={id}&publisher_id={publisher_id}"),
        )
        .await
    }
}
