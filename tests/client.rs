use std::time::{Duration, Instant};

use appnexus_client_sdk::error::{Api, NOT_AUTHENTICATED, Status};
use appnexus_client_sdk::services::{Deal, Placement};
use appnexus_client_sdk::{Client, Config, Error, Kind, ListOptions, RateSnapshot, ReauthPolicy};
use httpmock::prelude::*;
use reqwest::{Method as HttpMethod, StatusCode};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

const USERNAME: &str = "api-user";
const PASSWORD: &str = "hunter2";

fn init_tracing() {
    let _: Result<(), Box<dyn std::error::Error + Send + Sync>> = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn login_body() -> Value {
    json!({ "auth": { "username": USERNAME, "password": PASSWORD } })
}

fn ok_envelope() -> Value {
    json!({ "response": { "status": "OK", "dbg_info": { "reads": 1, "read_limit": 100, "read_limit_seconds": 60 } } })
}

fn noauth_envelope() -> Value {
    json!({ "response": { "error_id": NOT_AUTHENTICATED, "error": "No valid session", "dbg_info": {} } })
}

async fn mock_login<'server>(server: &'server MockServer, token: &str) -> httpmock::Mock<'server> {
    let cookie = format!("session={token}; Path=/");
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth").json_body(login_body());
            then.status(200)
                .header("Set-Cookie", cookie.as_str())
                .json_body(ok_envelope());
        })
        .await
}

#[tokio::test]
async fn login_token_is_sent_verbatim() -> anyhow::Result<()> {
    init_tracing();
    let server = MockServer::start_async().await;
    let auth = mock_login(&server, "hbapi:1:abc").await;
    let deal = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/deal")
                .query_param("id", "5")
                .header("authorization", "hbapi:1:abc");
            then.status(200).json_body(json!({
                "response": {
                    "status": "OK",
                    "deal": { "id": 5, "code": "PMP-5", "name": "Premium", "active": true },
                    "dbg_info": { "reads": 2, "read_limit": 100, "read_limit_seconds": 60 }
                }
            }));
        })
        .await;

    let client = Client::new(&server.base_url())?;
    assert!(!client.is_authenticated(), "no token before login");

    client.login(USERNAME, PASSWORD).await?;
    assert!(client.is_authenticated(), "token stored after login");

    let fetched = client.deals().get(5).await?;

    assert_eq!(fetched.id, Some(5), "deal id");
    assert_eq!(fetched.code, "PMP-5", "deal code");
    assert_eq!(client.rate().reads, 2, "rate taken from the last response");
    auth.assert_async().await;
    deal.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn login_without_cookie_fails() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth");
            then.status(200).json_body(ok_envelope());
        })
        .await;

    let client = Client::new(&server.base_url())?;
    let err = client.login(USERNAME, PASSWORD).await.unwrap_err();

    assert_eq!(err.kind(), Kind::Auth, "unexpected kind: {err}");
    assert!(!client.is_authenticated(), "no token without a cookie");
    Ok(())
}

#[tokio::test]
async fn logical_failure_still_updates_rate() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/foo");
            then.status(200).json_body(json!({
                "response": {
                    "error_id": "SYNTAX",
                    "error": "invalid service",
                    "dbg_info": { "reads": 7, "read_limit": 100, "read_limit_seconds": 60, "output_term": "not_found" }
                }
            }));
        })
        .await;

    let client = Client::new(&server.base_url())?;
    let request = client.build_request(HttpMethod::GET, "foo")?;
    let err = client.dispatch(request).await.unwrap_err();

    assert_eq!(err.kind(), Kind::Api, "unexpected kind: {err}");
    let api = err.downcast_ref::<Api>().expect("api error");
    assert_eq!(api.to_string(), "[SYNTAX]: invalid service", "api error display");
    assert_eq!(api.envelope.rate.reads, 7, "envelope kept on the error");
    assert_eq!(client.rate().reads, 7, "session rate updated");
    assert_eq!(client.rate().read_limit_seconds, 60, "session read window");
    Ok(())
}

#[tokio::test]
async fn null_debug_info_is_accepted() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/member").query_param("id", "1");
            then.status(200).json_body(json!({
                "response": { "status": "OK", "member": { "id": 1, "name": "Acme" }, "dbg_info": null }
            }));
        })
        .await;

    let client = Client::new(&server.base_url())?;
    let member = client.members().get(1).await?;

    assert_eq!(member.name, "Acme", "member decoded");
    assert_eq!(client.rate(), RateSnapshot::default(), "null dbg_info reads as empty");
    Ok(())
}

#[tokio::test]
async fn too_many_requests_fails_without_retry() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let limited = server
        .mock_async(|when, then| {
            when.method(GET).path("/foo1");
            then.status(429).header("Retry-After", "1");
        })
        .await;

    let client = Client::new(&server.base_url())?;
    let request = client.build_request(HttpMethod::GET, "foo1")?;
    let err = client.dispatch(request).await.unwrap_err();

    assert_eq!(err.kind(), Kind::Status, "unexpected kind: {err}");
    let status = err.downcast_ref::<Status>().expect("status error");
    assert_eq!(status.status_code, StatusCode::TOO_MANY_REQUESTS, "status code");
    assert_eq!(
        status.retry_after,
        Some(Duration::from_secs(1)),
        "Retry-After kept for the caller"
    );
    assert_eq!(status.path, "/foo1", "failing path");
    limited.assert_calls_async(1).await;
    Ok(())
}

#[tokio::test]
async fn noauth_reauthenticates_and_replays_once() -> anyhow::Result<()> {
    init_tracing();
    let server = MockServer::start_async().await;
    let mut first_login = mock_login(&server, "tok-1").await;

    let client = Client::new(&server.base_url())?;
    client.login(USERNAME, PASSWORD).await?;
    first_login.assert_async().await;
    first_login.delete_async().await;

    let second_login = mock_login(&server, "tok-2").await;
    let expired = server
        .mock_async(|when, then| {
            when.method(GET).path("/member").header("authorization", "tok-1");
            then.status(200).json_body(noauth_envelope());
        })
        .await;
    let fresh = server
        .mock_async(|when, then| {
            when.method(GET).path("/member").header("authorization", "tok-2");
            then.status(200).json_body(json!({
                "response": { "status": "OK", "members": [{ "id": 1, "name": "Acme" }], "dbg_info": {} }
            }));
        })
        .await;

    let page = client.members().list(ListOptions::default()).await?;

    let names: Vec<_> = page.items.iter().map(|member| member.name.as_str()).collect();
    assert_eq!(names, ["Acme"], "replayed call's members");
    expired.assert_calls_async(1).await;
    second_login.assert_calls_async(1).await;
    fresh.assert_calls_async(1).await;
    Ok(())
}

#[tokio::test]
async fn persistent_noauth_is_replayed_only_once() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let auth = mock_login(&server, "tok").await;
    let member = server
        .mock_async(|when, then| {
            when.method(GET).path("/member");
            then.status(200).json_body(noauth_envelope());
        })
        .await;

    let client = Client::new(&server.base_url())?;
    client.login(USERNAME, PASSWORD).await?;
    let err = client.members().get(1).await.unwrap_err();

    assert_eq!(err.kind(), Kind::Api, "unexpected kind: {err}");
    assert!(err.is_not_authenticated(), "NOAUTH surfaces: {err}");
    auth.assert_calls_async(2).await;
    member.assert_calls_async(2).await;
    Ok(())
}

#[tokio::test]
async fn never_policy_surfaces_noauth_without_login() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let auth = mock_login(&server, "tok").await;
    let member = server
        .mock_async(|when, then| {
            when.method(GET).path("/member");
            then.status(200).json_body(noauth_envelope());
        })
        .await;

    let config = Config::builder()
        .endpoint(server.base_url().parse()?)
        .reauthentication(ReauthPolicy::Never)
        .build();
    let client = Client::with_config(config)?;
    client.login(USERNAME, PASSWORD).await?;

    let err = client.members().get(1).await.unwrap_err();

    assert_eq!(err.kind(), Kind::Api, "unexpected kind: {err}");
    let api = err.api().expect("api error");
    assert_eq!(
        api.error_id.as_deref(),
        Some(NOT_AUTHENTICATED),
        "NOAUTH reaches the caller untouched"
    );
    assert!(client.is_authenticated(), "stale token is not discarded");
    auth.assert_calls_async(1).await;
    member.assert_calls_async(1).await;
    Ok(())
}

#[tokio::test]
async fn failed_reauthentication_is_wrapped() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let mut login = mock_login(&server, "tok").await;

    let client = Client::new(&server.base_url())?;
    client.login(USERNAME, PASSWORD).await?;
    login.delete_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth");
            then.status(401).body("unauthorized");
        })
        .await;
    let site = server
        .mock_async(|when, then| {
            when.method(GET).path("/site");
            then.status(200).json_body(noauth_envelope());
        })
        .await;

    let err = client.sites().get(3, None).await.unwrap_err();

    assert_eq!(err.kind(), Kind::Reauthentication, "unexpected kind: {err}");
    let cause = err.downcast_ref::<Error>().expect("wrapped cause");
    assert_eq!(cause.kind(), Kind::Status, "unexpected cause: {cause}");
    assert!(!client.is_authenticated(), "token dropped after failed login");
    site.assert_calls_async(1).await;
    Ok(())
}

#[tokio::test]
async fn noauth_without_stored_credentials_fails() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let auth = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth");
            then.status(200).json_body(ok_envelope());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/publisher");
            then.status(200).json_body(noauth_envelope());
        })
        .await;

    let client = Client::new(&server.base_url())?;
    let err = client.publishers().get(9).await.unwrap_err();

    assert_eq!(err.kind(), Kind::Reauthentication, "unexpected kind: {err}");
    auth.assert_calls_async(0).await;
    Ok(())
}

#[tokio::test]
async fn noauth_from_the_auth_service_is_not_retried() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let auth = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth");
            then.status(200).json_body(noauth_envelope());
        })
        .await;

    let client = Client::new(&server.base_url())?;
    let err = client.login(USERNAME, PASSWORD).await.unwrap_err();

    assert_eq!(err.kind(), Kind::Api, "unexpected kind: {err}");
    auth.assert_calls_async(1).await;
    Ok(())
}

#[tokio::test]
async fn add_stores_assigned_id() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let created = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/deal")
                .json_body(json!({ "deal": { "code": "PMP-9", "name": "New", "active": false } }));
            then.status(200)
                .json_body(json!({ "response": { "status": "OK", "id": "77", "dbg_info": {} } }));
        })
        .await;

    let client = Client::new(&server.base_url())?;
    let mut deal = Deal::default();
    deal.code = "PMP-9".to_owned();
    deal.name = "New".to_owned();
    client.deals().add(&mut deal).await?;

    assert_eq!(deal.id, Some(77), "server-assigned id stored on the item");
    created.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn placement_writes_are_scoped_to_the_item_publisher() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let created = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/placement")
                .query_param("publisher_id", "12");
            then.status(200)
                .json_body(json!({ "response": { "status": "OK", "id": 31, "dbg_info": {} } }));
        })
        .await;
    let updated = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/placement")
                .query_param("id", "31")
                .query_param("publisher_id", "12");
            then.status(200)
                .json_body(json!({ "response": { "status": "OK", "id": 31, "dbg_info": {} } }));
        })
        .await;

    let client = Client::new(&server.base_url())?;
    let mut placement = Placement::default();
    placement.publisher_id = 12;
    placement.code = "leaderboard".to_owned();
    placement.name = "Leaderboard".to_owned();

    client.placements().add(&mut placement).await?;
    placement.name = "Leaderboard 728x90".to_owned();
    client.placements().update(&placement).await?;

    assert_eq!(placement.id, Some(31), "server-assigned id stored on the item");
    created.assert_async().await;
    updated.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn placement_without_publisher_is_rejected_before_dispatch() -> anyhow::Result<()> {
    let client = Client::new("http://127.0.0.1:9/")?;
    let mut placement = Placement::default();
    placement.name = "Orphan".to_owned();

    let err = client.placements().add(&mut placement).await.unwrap_err();

    assert_eq!(err.kind(), Kind::Validation, "unexpected kind: {err}");
    assert_eq!(placement.id, None, "nothing was created");
    Ok(())
}

#[tokio::test]
async fn update_without_id_is_rejected_before_dispatch() -> anyhow::Result<()> {
    let client = Client::new("http://127.0.0.1:9/")?;

    let err = client.deals().update(&Deal::default()).await.unwrap_err();

    assert_eq!(err.kind(), Kind::Validation, "unexpected kind: {err}");
    Ok(())
}

#[tokio::test]
async fn list_encodes_pagination_options() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let listed = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/placement")
                .query_param("publisher_id", "4")
                .query_param("start_element", "0")
                .query_param("num_elements", "2");
            then.status(200).json_body(json!({
                "response": {
                    "status": "OK",
                    "count": 3,
                    "start_element": 0,
                    "num_elements": 2,
                    "placements": [
                        { "id": 1, "publisher_id": 4, "code": "a", "name": "A" },
                        { "id": 2, "publisher_id": 4, "code": "b", "name": "B" }
                    ],
                    "dbg_info": {}
                }
            }));
        })
        .await;

    let client = Client::new(&server.base_url())?;
    let options = ListOptions::builder()
        .start_element(0)
        .num_elements(2)
        .build();
    let page = client.placements().list(4, options).await?;

    assert_eq!(page.items.len(), 2, "placements on the page");
    let pagination = page.pagination().expect("pagination");
    assert_eq!(pagination.count, 3, "total count");
    assert_eq!(
        options.next_page(pagination).and_then(|next| next.start_element),
        Some(2),
        "next page starts after this one"
    );
    listed.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn empty_delete_response_is_success() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let deleted = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/segment")
                .query_param("id", "8")
                .query_param("member_id", "2");
            then.status(200);
        })
        .await;

    let client = Client::new(&server.base_url())?;
    let envelope = client.segments().delete(8, 2).await?;

    assert!(!envelope.is_error(), "empty body is not an error");
    deleted.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn reported_read_limit_throttles_next_get() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/member");
            then.status(200).json_body(json!({
                "response": {
                    "status": "OK",
                    "member": { "id": 1, "name": "Acme" },
                    "dbg_info": { "reads": 100, "read_limit": 100, "read_limit_seconds": 1 }
                }
            }));
        })
        .await;

    let client = Client::new(&server.base_url())?;
    client.members().get(1).await?;

    let start = Instant::now();
    client.members().get(1).await?;

    assert!(
        start.elapsed() >= Duration::from_secs(1),
        "second read waited only {:?}",
        start.elapsed()
    );
    Ok(())
}

#[tokio::test]
async fn transport_failure_is_a_dispatch_error() -> anyhow::Result<()> {
    let client = Client::new("http://127.0.0.1:1/")?;

    let err = client.members().get(1).await.unwrap_err();

    assert_eq!(err.kind(), Kind::Dispatch, "unexpected kind: {err}");
    Ok(())
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/site");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let client = Client::new(&server.base_url())?;
    let err = client.sites().list(ListOptions::default()).await.unwrap_err();

    assert_eq!(err.kind(), Kind::Decode, "unexpected kind: {err}");
    Ok(())
}
