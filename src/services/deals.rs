use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::client::Client;
use crate::response::Envelope;
use crate::services::{created_id, existing_id, fetch, fetch_page, missing, remove, send_body};
use crate::types::{ListOptions, Page};

/// Reference to another object by id (deal type, auction type, buyer).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[non_exhaustive]
pub struct IdRef {
    pub id: i64,
}

impl IdRef {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self { id }
    }
}

/// Deal between a seller and a buyer.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
#[non_exhaustive]
pub struct Deal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_price: Option<f64>,
    pub code: String,
    pub name: String,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub deal_type: Option<IdRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auction_type: Option<IdRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer: Option<IdRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DealPayload {
    deal: Option<Deal>,
    deals: Vec<Deal>,
}

#[derive(Serialize)]
struct DealBody<'body> {
    deal: &'body Deal,
}

/// `deal` service.
#[derive(Clone, Copy, Debug)]
pub struct DealService<'client> {
    client: &'client Client,
}

impl<'client> DealService<'client> {
    pub(crate) fn new(client: &'client Client) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: i64) -> Result<Deal> {
        let response = fetch::<DealPayload>(self.client, &format!("deal?id={id}")).await?;
        response.data.deal.ok_or_else(|| missing("deal"))
    }

    pub async fn list(&self, options: ListOptions) -> Result<Page<Deal>> {
        fetch_page(self.client, "deal", options, |payload: DealPayload| {
            payload.deals
        })
        .await
    }

    /// Creates `item` and stores the id the server assigned in it.
    pub async fn add(&self, item: &mut Deal) -> Result<Envelope> {
        let envelope =
            send_body(self.client, Method::POST, "deal", &DealBody { deal: &*item }).await?;
        item.id = created_id(&envelope);
        Ok(envelope)
    }

    pub async fn update(&self, item: &Deal) -> Result<Envelope> {
        let id = existing_id("deal", item.id)?;
        send_body(
            self.client,
            Method::PUT,
            &format!("deal?id={id}"),
            &DealBody { deal: item },
        )
        .await
    }

    pub async fn delete(&self, id: i64) -> Result<Envelope> {
        remove(self.client, &format!("deal?id={id}")).await
    }
}
