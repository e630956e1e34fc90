use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::client::Client;
use crate::response::Envelope;
use crate::services::{
    created_id, existing_id, fetch, fetch_page, missing, parent_id, remove, send_body,
};
use crate::types::{ListOptions, Page};

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
#[non_exhaustive]
pub struct Site {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub publisher_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub name: String,
    pub url: String,
    pub supply_type: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SitePayload {
    site: Option<Site>,
    sites: Vec<Site>,
}

#[derive(Serialize)]
struct SiteBody<'body> {
    site: &'body Site,
}

#[derive(Clone, Copy, Debug)]
pub struct SiteService<'client> {
    client: &'client Client,
}

impl<'client> SiteService<'client> {
    pub(crate) fn new(client: &'client Client) -> Self {
        Self { client }
    }

    /// Fetches a site, scoped to `publisher_id` when given.
    pub async fn get(&self, id: i64, publisher_id: Option<i64>) -> Result<Site> {
        let path = match publisher_id {
            Some(publisher_id) => format!("site?id={id}&publisher_id={publisher_id}"),
            None => format!("site?id={id}"),
        };
        let response = fetch::<SitePayload>(self.client, &path).await?;
        response.data.site.ok_or_else(|| missing("site"))
    }

    pub async fn list(&self, options: ListOptions) -> Result<Page<Site>> {
        fetch_page(self.client, "site", options, |payload: SitePayload| {
            payload.sites
        })
        .await
    }

    /// Creates `item` under its own `publisher_id` and stores the assigned id.
    pub async fn add(&self, item: &mut Site) -> Result<Envelope> {
        let publisher_id = parent_id("site", "publisher", item.publisher_id)?;
        let envelope = send_body(
            self.client,
            Method::POST,
            &format!("site?publisher_id={publisher_id}"),
            &SiteBody { site: &*item },
        )
        .await?;
        item.id = created_id(&envelope);
        Ok(envelope)
    }

    pub async fn update(&self, item: &Site) -> Result<Envelope> {
        let id = existing_id("site", item.id)?;
        let publisher_id = parent_id("site", "publisher", item.publisher_id)?;
        send_body(
            self.client,
            Method::PUT,
            &format!("site?id={id}&publisher_id={publisher_id}"),
            &SiteBody { site: item },
        )
        .await
    }

    pub async fn delete(&self, id: i64, publisher_id: i64) -> Result<Envelope> {
        remove(
            self.client,
            &format!("site?id={id}&publisher_id={publisher_id}"),
        )
        .await
    }
}
