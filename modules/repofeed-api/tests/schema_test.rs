//! GraphQL surface against in-memory collaborators: cache hints, error codes,
//! field-level enrichment failures and the commentAdded subscription.

use std::sync::Arc;
use std::time::Duration;

use async_graphql::{Request, Response};
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::time::timeout;

use repofeed_api::graphql::context::AuthContext;
use repofeed_api::graphql::{build_schema, ApiSchema};
use repofeed_api::ServerDeps;
use repofeed_common::Identity;
use repofeed_domains::testing::{StaticDirectory, StaticGeocoder, StaticWeather};
use repofeed_domains::MemoryStore;
use repofeed_events::{CommentAdded, EventBus, COMMENT_ADDED};

struct TestApi {
    schema: ApiSchema,
    bus: EventBus<CommentAdded>,
}

fn api_with_weather(weather: StaticWeather) -> TestApi {
    let directory = Arc::new(
        StaticDirectory::new()
            .with_repo("apollographql/apollo-client")
            .with_repo("rust-lang/rust")
            .with_user("alice", Some("Oakland, CA"))
            .with_user("bob", None),
    );
    let geocoder = Arc::new(StaticGeocoder::new().with_place("Oakland, CA", 37.80, -122.27));
    let bus = EventBus::new();
    let deps = ServerDeps::new(
        Arc::new(MemoryStore::new()),
        directory.clone(),
        directory,
        geocoder,
        Arc::new(weather),
        bus.clone(),
    );
    TestApi {
        schema: build_schema(deps),
        bus,
    }
}

fn api() -> TestApi {
    api_with_weather(StaticWeather::mild())
}

async fn run(api: &TestApi, login: Option<&str>, query: &str) -> Response {
    let request = Request::new(query).data(AuthContext(login.map(Identity::new)));
    api.schema.execute(request).await
}

fn data(resp: &Response) -> Value {
    resp.data.clone().into_json().unwrap()
}

fn error_codes(resp: &Response) -> Vec<String> {
    resp.errors
        .iter()
        .map(|e| {
            let v = serde_json::to_value(e).unwrap();
            v["extensions"]["code"].as_str().unwrap_or_default().to_string()
        })
        .collect()
}

async fn submit(api: &TestApi, login: &str, repo: &str) {
    let resp = run(
        api,
        Some(login),
        &format!(r#"mutation {{ submitRepository(repoFullName: "{repo}") {{ id }} }}"#),
    )
    .await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
}

// ---------------------------------------------------------------------------
// Cache hints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn feed_and_entry_are_publicly_cacheable() {
    let api = api();
    submit(&api, "alice", "rust-lang/rust").await;

    let feed = run(&api, None, "{ feed(type: NEW) { score } }").await;
    assert!(feed.errors.is_empty());
    assert_eq!(feed.cache_control.value().as_deref(), Some("max-age=60"));

    let entry = run(
        &api,
        None,
        r#"{ entry(repoFullName: "rust-lang/rust") { commentCount } }"#,
    )
    .await;
    assert_eq!(entry.cache_control.value().as_deref(), Some("max-age=60"));
}

#[tokio::test]
async fn current_user_is_private() {
    let api = api();
    let resp = run(&api, Some("alice"), "{ currentUser { login } }").await;
    assert_eq!(data(&resp), json!({ "currentUser": { "login": "alice" } }));
    assert_eq!(
        resp.cache_control.value().as_deref(),
        Some("max-age=60, private")
    );
}

#[tokio::test]
async fn feed_with_caller_vote_is_private() {
    let api = api();
    submit(&api, "alice", "rust-lang/rust").await;
    let resp = run(
        &api,
        Some("alice"),
        r#"mutation { vote(repoFullName: "rust-lang/rust", type: UP) { score } }"#,
    )
    .await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);

    let resp = run(&api, Some("alice"), "{ feed(type: NEW) { vote { voteValue } } }").await;
    assert_eq!(data(&resp), json!({ "feed": [{ "vote": { "voteValue": 1 } }] }));
    assert_eq!(
        resp.cache_control.value().as_deref(),
        Some("max-age=60, private")
    );
}

#[tokio::test]
async fn mutations_carry_no_cache_hint() {
    let api = api();
    let resp = run(
        &api,
        Some("alice"),
        r#"mutation { submitRepository(repoFullName: "rust-lang/rust") { id } }"#,
    )
    .await;
    assert!(resp.errors.is_empty());
    assert_eq!(resp.cache_control.value(), None);
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn anonymous_current_user_is_null() {
    let api = api();
    let resp = run(&api, None, "{ currentUser { login } }").await;
    assert!(resp.errors.is_empty());
    assert_eq!(data(&resp), json!({ "currentUser": null }));
}

#[tokio::test]
async fn feed_limit_is_clamped() {
    let api = api();
    submit(&api, "alice", "rust-lang/rust").await;
    submit(&api, "alice", "apollographql/apollo-client").await;

    for limit in [0, 500, -3] {
        let resp = run(
            &api,
            None,
            &format!("{{ feed(type: TOP, limit: {limit}) {{ id }} }}"),
        )
        .await;
        assert!(resp.errors.is_empty());
        assert_eq!(data(&resp)["feed"].as_array().unwrap().len(), 2);
    }

    let resp = run(&api, None, "{ feed(type: HOT, offset: 1000) { id } }").await;
    assert_eq!(data(&resp), json!({ "feed": [] }));
}

#[tokio::test]
async fn entry_resolves_repository_and_poster() {
    let api = api();
    submit(&api, "alice", "rust-lang/rust").await;

    let resp = run(
        &api,
        Some("alice"),
        r#"{ entry(repoFullName: "rust-lang/rust") {
            repository { fullName owner { login } }
            postedBy { login location { name latitude } }
            vote { voteValue }
        } }"#,
    )
    .await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    assert_eq!(
        data(&resp),
        json!({ "entry": {
            "repository": { "fullName": "rust-lang/rust", "owner": { "login": "rust-lang" } },
            "postedBy": { "login": "alice", "location": { "name": "Oakland, CA", "latitude": 37.8 } },
            "vote": { "voteValue": 0 }
        } })
    );
}

#[tokio::test]
async fn missing_entry_is_null() {
    let api = api();
    let resp = run(&api, None, r#"{ entry(repoFullName: "nobody/nothing") { id } }"#).await;
    assert!(resp.errors.is_empty());
    assert_eq!(data(&resp), json!({ "entry": null }));
}

// ---------------------------------------------------------------------------
// Enrichment failures stay on their field
// ---------------------------------------------------------------------------

#[tokio::test]
async fn weather_failure_nulls_only_weather() {
    let api = api_with_weather(StaticWeather::Failing);
    let resp = run(
        &api,
        Some("alice"),
        "{ currentUser { login avatarUrl location { name weather { temperatureC } } } }",
    )
    .await;

    assert_eq!(error_codes(&resp), vec!["ENRICHMENT_FAILURE"]);
    let body = data(&resp);
    let user = &body["currentUser"];
    assert_eq!(user["login"], "alice");
    assert_eq!(user["location"]["name"], "Oakland, CA");
    assert_eq!(user["location"]["weather"], Value::Null);
}

#[tokio::test]
async fn user_without_location_has_null_location() {
    let api = api();
    let resp = run(&api, Some("bob"), "{ currentUser { location { name } } }").await;
    assert!(resp.errors.is_empty());
    assert_eq!(data(&resp), json!({ "currentUser": { "location": null } }));
}

// ---------------------------------------------------------------------------
// Mutation errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mutation_error_codes() {
    let api = api();

    let resp = run(
        &api,
        None,
        r#"mutation { submitRepository(repoFullName: "rust-lang/rust") { id } }"#,
    )
    .await;
    assert_eq!(error_codes(&resp), vec!["UNAUTHENTICATED"]);

    let resp = run(
        &api,
        Some("alice"),
        r#"mutation { submitRepository(repoFullName: "nobody/nothing") { id } }"#,
    )
    .await;
    assert_eq!(error_codes(&resp), vec!["UNKNOWN_REPOSITORY"]);

    submit(&api, "alice", "rust-lang/rust").await;
    let resp = run(
        &api,
        Some("bob"),
        r#"mutation { submitRepository(repoFullName: "rust-lang/rust") { id } }"#,
    )
    .await;
    assert_eq!(error_codes(&resp), vec!["DUPLICATE_SUBMISSION"]);

    let resp = run(
        &api,
        Some("bob"),
        r#"mutation { submitComment(repoFullName: "apollographql/apollo-client", commentContent: "hi") { id } }"#,
    )
    .await;
    assert_eq!(error_codes(&resp), vec!["UNKNOWN_ENTRY"]);
}

#[tokio::test]
async fn vote_mutation_returns_updated_entry() {
    let api = api();
    submit(&api, "alice", "rust-lang/rust").await;

    let resp = run(
        &api,
        Some("bob"),
        r#"mutation { vote(repoFullName: "rust-lang/rust", type: UP) { score vote { voteValue } } }"#,
    )
    .await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    assert_eq!(
        data(&resp),
        json!({ "vote": { "score": 1, "vote": { "voteValue": 1 } } })
    );

    let resp = run(
        &api,
        Some("bob"),
        r#"mutation { vote(repoFullName: "rust-lang/rust", type: DOWN) { score } }"#,
    )
    .await;
    assert_eq!(data(&resp), json!({ "vote": { "score": -1 } }));

    let resp = run(
        &api,
        None,
        r#"mutation { vote(repoFullName: "rust-lang/rust", type: UP) { score } }"#,
    )
    .await;
    assert_eq!(error_codes(&resp), vec!["UNAUTHENTICATED"]);
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

#[tokio::test]
async fn comment_added_streams_matching_comments() {
    let api = api();
    submit(&api, "alice", "rust-lang/rust").await;
    submit(&api, "alice", "apollographql/apollo-client").await;

    let mut stream = api.schema.execute_stream(Request::new(
        r#"subscription { commentAdded(repoFullName: "rust-lang/rust") { content postedBy { login } } }"#,
    ));
    let first = tokio::spawn(async move { stream.next().await });

    timeout(Duration::from_secs(1), async {
        while api.bus.subscriber_count(COMMENT_ADDED) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("subscription registered");

    for (repo, content) in [
        ("apollographql/apollo-client", "elsewhere"),
        ("rust-lang/rust", "borrowck is my friend"),
    ] {
        let resp = run(
            &api,
            Some("bob"),
            &format!(
                r#"mutation {{ submitComment(repoFullName: "{repo}", commentContent: "{content}") {{ id }} }}"#
            ),
        )
        .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    }

    let event = timeout(Duration::from_secs(1), first)
        .await
        .expect("timeout")
        .unwrap()
        .expect("stream item");
    assert_eq!(
        event.data.into_json().unwrap(),
        json!({ "commentAdded": { "content": "borrowck is my friend", "postedBy": { "login": "bob" } } })
    );
}
