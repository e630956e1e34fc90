use serde::{Deserialize, Serialize};

use crate::Result;
use crate::client::Client;
use crate::services::{fetch, fetch_page, missing};
use crate::types::{ListOptions, Page};

/// Console member (the account owning all other objects). Read-only through the API.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
#[non_exhaustive]
pub struct Member {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MemberPayload {
    member: Option<Member>,
    members: Vec<Member>,
}

#[derive(Clone, Copy, Debug)]
pub struct MemberService<'client> {
    client: &'client Client,
}

impl<'client> MemberService<'client> {
    pub(crate) fn new(client: &'client Client) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: i64) -> Result<Member> {
        let response = fetch::<MemberPayload>(self.client, &format!("member?id={id}")).await?;
        response.data.member.ok_or_else(|| missing("member"))
    }

    /// Members visible to the logged-in user; a single-member response is returned as one item.
    pub async fn list(&self, options: ListOptions) -> Result<Page<Member>> {
        fetch_page(self.client, "member", options, |payload: MemberPayload| {
            match payload.member {
                Some(member) if payload.members.is_empty() => vec![member],
                _ => payload.members,
            }
        })
        .await
    }
}
