use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::client::Client;
use crate::response::Envelope;
use crate::services::{created_id, existing_id, fetch, fetch_page, missing, remove, send_body};
use crate::types::{ListOptions, Page};

/// Publisher owning sites and placements.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
#[non_exhaustive]
pub struct Publisher {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_oo: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reselling_exposure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_payment_rule_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_relationship: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_source: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PublisherPayload {
    publisher: Option<Publisher>,
    publishers: Vec<Publisher>,
}

#[derive(Serialize)]
struct PublisherBody<'body> {
    publisher: &'body Publisher,
}

#[derive(Clone, Copy, Debug)]
pub struct PublisherService<'client> {
    client: &'client Client,
}

impl<'client> PublisherService<'client> {
    pub(crate) fn new(client: &'client Client) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: i64) -> Result<Publisher> {
        let response =
            fetch::<PublisherPayload>(self.client, &format!("publisher?id={id}")).await?;
        response.data.publisher.ok_or_else(|| missing("publisher"))
    }

    pub async fn list(&self, options: ListOptions) -> Result<Page<Publisher>> {
        fetch_page(
            self.client,
            "publisher",
            options,
            |payload: PublisherPayload| payload.publishers,
        )
        .await
    }

    /// Creates `item` without a default placement and stores the assigned id in it.
    pub async fn add(&self, item: &mut Publisher) -> Result<Envelope> {
        let envelope = send_body(
            self.client,
            Method::POST,
            "publisher?create_default_placement=false",
            &PublisherBody { publisher: &*item },
        )
        .await?;
        item.id = created_id(&envelope);
        Ok(envelope)
    }

    pub async fn update(&self, item: &Publisher) -> Result<Envelope> {
        let id = existing_id("publisher", item.id)?;
        send_body(
            self.client,
            Method::PUT,
            &format!("publisher?id={id}"),
            &PublisherBody { publisher: item },
        )
        .await
    }

    pub async fn delete(&self, id: i64) -> Result<Envelope> {
        remove(self.client, &format!("publisher?id={id}")).await
    }
}
