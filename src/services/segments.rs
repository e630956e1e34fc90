use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::client::Client;
use crate::response::Envelope;
use crate::services::{created_id, existing_id, fetch, fetch_page, missing, remove, send_body};
use crate::types::{ListOptions, Page};

/// Audience segment owned by a member.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
#[non_exhaustive]
pub struct Segment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub short_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_minutes: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SegmentPayload {
    segment: Option<Segment>,
    segments: Vec<Segment>,
}

#[derive(Serialize)]
struct SegmentBody<'body> {
    segment: &'body Segment,
}

#[derive(Clone, Copy, Debug)]
pub struct SegmentService<'client> {
    client: &'client Client,
}

impl<'client> SegmentService<'client> {
    pub(crate) fn new(client: &'client Client) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: i64) -> Result<Segment> {
        let response = fetch::<SegmentPayload>(self.client, &format!("segment?id={id}")).await?;
        response.data.segment.ok_or_else(|| missing("segment"))
    }

    pub async fn list(&self, member_id: i64, options: ListOptions) -> Result<Page<Segment>> {
        fetch_page(
            self.client,
            &format!("segment?member_id={member_id}"),
            options,
            |payload: SegmentPayload| payload.segments,
        )
        .await
    }

    pub async fn add(&self, item: &mut Segment, member_id: i64) -> Result<Envelope> {
        let envelope = send_body(
            self.client,
            Method::POST,
            &format!("segment?member_id={member_id}"),
            &SegmentBody { segment: &*item },
        )
        .await?;
        item.id = created_id(&envelope);
        Ok(envelope)
    }

    pub async fn update(&self, item: &Segment, member_id: i64) -> Result<Envelope> {
        let id = existing_id("segment", item.id)?;
        send_body(
            self.client,
            Method::PUT,
            &format!("segment?id={id}&member_id={member_id}"),
            &SegmentBody { segment: item },
        )
        .await
    }

    pub async fn delete(&self, id: i64, member_id: i64) -> Result<Envelope> {
        remove(
            self.client,
            &format!("segment?id={id}&member_id={member_id}"),
        )
        .await
    }
}
