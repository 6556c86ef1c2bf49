mod common;

use graphloader::config::Config;
use graphloader::gateway::{Gateway, GraphQlRequest};
use serde_json::{json, Value};

use common::{as_store, fixture, CountingStore, ALICE, BOB, CAROL, P1, P2, P3};

async fn run(gateway: &Gateway, query: &str) -> (Value, Vec<String>) {
    let response = gateway.execute(GraphQlRequest::new(query)).await;
    let errors = response.errors.iter().map(|e| e.message.clone()).collect();
    (response.data.into_json().unwrap(), errors)
}

#[tokio::test]
async fn relation_fields_are_batched_per_level() {
    let store = CountingStore::new(fixture());
    let gateway = Gateway::new(as_store(&store), &Config::default());

    let (data, errors) = run(
        &gateway,
        "{ users { id posts { id } profile { memberType { id postsLimitPerMonth } } } }",
    )
    .await;

    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(
        data,
        json!({ "users": [
            {
                "id": ALICE.to_string(),
                "posts": [{ "id": P1.to_string() }, { "id": P2.to_string() }],
                "profile": { "memberType": { "id": "basic", "postsLimitPerMonth": 20 } },
            },
            { "id": BOB.to_string(), "posts": [], "profile": null },
            {
                "id": CAROL.to_string(),
                "posts": [{ "id": P3.to_string() }],
                "profile": { "memberType": { "id": "business", "postsLimitPerMonth": 100 } },
            },
        ]})
    );
    assert_eq!(store.count("users"), 1);
    assert_eq!(store.count("posts_by_authors"), 1);
    assert_eq!(store.count("profiles_by_users"), 1);
    assert_eq!(store.count("member_types_by_ids"), 1);
    assert_eq!(store.total(), 4);
}

#[tokio::test]
async fn selected_subscribers_are_prefetched() {
    let store = CountingStore::new(fixture());
    let gateway = Gateway::new(as_store(&store), &Config::default());

    let (data, errors) = run(&gateway, "{ users { name subscribedToUser { name } } }").await;

    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(
        data,
        json!({ "users": [
            { "name": "alice", "subscribedToUser": [{ "name": "bob" }, { "name": "carol" }] },
            { "name": "bob", "subscribedToUser": [] },
            { "name": "carol", "subscribedToUser": [{ "name": "alice" }] },
        ]})
    );
    assert_eq!(store.count("users"), 1);
    assert_eq!(store.count("subscriptions_of"), 1);
    assert_eq!(store.count("subscribers_of"), 0);
    assert_eq!(store.total(), 2);
}

#[tokio::test]
async fn unselected_relations_trigger_no_prefetch() {
    let store = CountingStore::new(fixture());
    let gateway = Gateway::new(as_store(&store), &Config::default());

    let (_, errors) = run(&gateway, "{ users { id name } }").await;

    assert!(errors.is_empty());
    assert_eq!(store.count("subscriptions_of"), 0);
    assert_eq!(store.total(), 1);
}

#[tokio::test]
async fn prefetch_does_not_change_results() {
    let query = "{ users { id userSubscribedTo { name subscribedToUser { name } } subscribedToUser { id } } }";

    let with_store = CountingStore::new(fixture());
    let with = Gateway::new(as_store(&with_store), &Config::default());
    let without_store = CountingStore::new(fixture());
    let without =
        Gateway::new(as_store(&without_store), &Config { prefetch: false, ..Config::default() });

    let (with_data, with_errors) = run(&with, query).await;
    let (without_data, without_errors) = run(&without, query).await;

    assert!(with_errors.is_empty() && without_errors.is_empty());
    assert_eq!(with_data, without_data);
    assert_eq!(without_store.count("subscriptions_of"), 0);
    assert_eq!(without_store.count("subscribers_of"), 1);
    assert_eq!(without_store.count("subscribed_authors"), 1);
    // Every nested user is one of the listed users, so the cache answers all of them.
    assert_eq!(with_store.count("subscribers_of"), 0);
    assert_eq!(with_store.count("subscribed_authors"), 0);
}

#[tokio::test]
async fn failed_prefetch_falls_back_to_the_loaders() {
    let query = "{ users { name subscribedToUser { name } userSubscribedTo { name } } }";

    let with_store = CountingStore::failing(fixture(), &["subscriptions_of"]);
    let with = Gateway::new(as_store(&with_store), &Config::default());
    let without_store = CountingStore::failing(fixture(), &["subscriptions_of"]);
    let without =
        Gateway::new(as_store(&without_store), &Config { prefetch: false, ..Config::default() });

    let (with_data, with_errors) = run(&with, query).await;
    let (without_data, without_errors) = run(&without, query).await;

    assert!(with_errors.is_empty(), "{:?}", with_errors);
    assert_eq!(with_errors, without_errors);
    assert_eq!(with_data, without_data);
    assert_eq!(
        with_data["users"][0],
        json!({
            "name": "alice",
            "subscribedToUser": [{ "name": "bob" }, { "name": "carol" }],
            "userSubscribedTo": [{ "name": "carol" }],
        })
    );
    assert_eq!(with_store.count("subscriptions_of"), 1);
    assert_eq!(with_store.count("subscribers_of"), 1);
    assert_eq!(with_store.count("subscribed_authors"), 1);
}

#[tokio::test]
async fn too_deep_queries_never_execute() {
    let store = CountingStore::new(fixture());
    let gateway = Gateway::new(as_store(&store), &Config { max_depth: 2, ..Config::default() });

    let response = gateway
        .execute(GraphQlRequest::new("{ users { subscribedToUser { posts { id } } } }"))
        .await;

    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "'anonymous' exceeds maximum operation depth of 2");
    assert_eq!(response.data, async_graphql::Value::Null);
    assert_eq!(store.total(), 0);
}

#[tokio::test]
async fn queries_at_the_bound_execute() {
    let store = CountingStore::new(fixture());
    let gateway = Gateway::new(as_store(&store), &Config { max_depth: 2, ..Config::default() });

    let (data, errors) = run(&gateway, "{ users { posts { title } } }").await;

    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(data["users"][0]["posts"][0]["title"], "p1");
}

#[tokio::test]
async fn failed_fetch_is_reported_per_field() {
    let store = CountingStore::failing(fixture(), &["posts_by_authors"]);
    let gateway = Gateway::new(as_store(&store), &Config::default());

    let query = "{ users { name posts { id } profile { id } } }";
    let response = gateway.execute(GraphQlRequest::new(query)).await;

    assert_eq!(response.errors.len(), 3);
    assert!(response.errors.iter().all(|e| e.message.contains("posts_by_authors is down")));
    assert!(response.errors.iter().all(|e| !e.path.is_empty()));

    let data = response.data.into_json().unwrap();
    assert_eq!(data["users"][0]["name"], "alice");
    assert_eq!(data["users"][0]["posts"], Value::Null);
    assert!(data["users"][0]["profile"]["id"].is_string());
    assert_eq!(store.count("posts_by_authors"), 1);
}

#[tokio::test]
async fn requests_get_separate_loaders() {
    let store = CountingStore::new(fixture());
    let gateway = Gateway::new(as_store(&store), &Config::default());

    run(&gateway, "{ users { posts { id } } }").await;
    run(&gateway, "{ users { posts { id } } }").await;

    assert_eq!(store.count("posts_by_authors"), 2);
}

#[tokio::test]
async fn variables_and_single_lookups() {
    let store = CountingStore::new(fixture());
    let gateway = Gateway::new(as_store(&store), &Config::default());

    let query = "query One($id: UUID!) { user(id: $id) { name posts { title } } }";
    let request = GraphQlRequest::new(query).variables(json!({ "id": CAROL.to_string() }));
    let response = gateway.execute(request).await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "user": { "name": "carol", "posts": [{ "title": "p3" }] } })
    );
    assert_eq!(store.count("user"), 1);
    assert_eq!(store.count("posts_by_authors"), 1);
}

#[tokio::test]
async fn unknown_user_resolves_to_null() {
    let store = CountingStore::new(fixture());
    let gateway = Gateway::new(as_store(&store), &Config::default());

    let query = format!("{{ user(id: \"{}\") {{ name }} }}", uuid::Uuid::from_u128(0xFF));
    let (data, errors) = run(&gateway, &query).await;

    assert!(errors.is_empty());
    assert_eq!(data, json!({ "user": null }));
}
