//! HTTP boundary tests driven through the router without a socket.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::{Duration, TimeZone, Utc};
use sautii_core::{
    Comment, Dimension, Issue, IssueUpdate, Location, NewComment, NewIssue, Predicate, Result,
    SautiiError, UserId, VoteType,
};
use sautii_server::{build_router, AppState};
use sautii_storage::{GroupCounts, InMemoryStore, IssueStore, PageWindow, SortPlan};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn issue(id: &str, day: i64, category: &str, tags: &[&str], at: Option<(f64, f64)>) -> Issue {
    let mut i = Issue::new(
        NewIssue {
            id: Some(id.into()),
            title: format!("Report {id}"),
            description: "Streetlight out near the junction".into(),
            category: Some(category.into()),
            priority: Some("medium".into()),
            location: at.map(|(lat, lng)| Location {
                lat,
                lng,
                address: String::new(),
            }),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        },
        None,
    );
    i.created_at = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap() + Duration::days(day);
    i
}

fn seeded() -> InMemoryStore {
    InMemoryStore::from_issues([
        issue("a", 1, "security", &["night"], Some((-1.2864, 36.8172))),
        issue("b", 2, "security", &["night", "market"], None),
        issue("c", 3, "health", &["water"], Some((-4.0435, 39.6682))),
    ])
}

fn app(store: impl IssueStore) -> axum::Router {
    let store: Arc<dyn IssueStore> = Arc::new(store);
    build_router(AppState::new(store))
}

/// Store whose backend is unreachable.
struct DownStore;

fn down() -> SautiiError {
    SautiiError::Store("backend unreachable".into())
}

#[async_trait::async_trait]
impl IssueStore for DownStore {
    async fn query(&self, _: &Predicate) -> Result<Vec<Issue>> {
        Err(down())
    }
    async fn count(&self, _: &Predicate) -> Result<u64> {
        Err(down())
    }
    async fn group_count(&self, _: &Predicate, _: Dimension, _: bool) -> Result<GroupCounts> {
        Err(down())
    }
    async fn sorted_page(&self, _: &Predicate, _: SortPlan, _: PageWindow) -> Result<Vec<Issue>> {
        Err(down())
    }
    async fn insert(&self, _: NewIssue, _: Option<UserId>) -> Result<Issue> {
        Err(down())
    }
    async fn get(&self, _: &str) -> Result<Issue> {
        Err(down())
    }
    async fn update(&self, _: &str, _: IssueUpdate) -> Result<Issue> {
        Err(down())
    }
    async fn vote(&self, _: &str, _: &str, _: VoteType) -> Result<Issue> {
        Err(down())
    }
    async fn add_comment(&self, _: &str, _: NewComment) -> Result<Comment> {
        Err(down())
    }
}

async fn call(router: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let resp = app(seeded()).oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn query_params_search_with_repeated_keys() {
    let (status, body) = call(
        app(seeded()),
        get("/api/issues?categories=security&categories=health&tags=night&sortOrder=desc&limit=500&page=-2"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    let ids: Vec<&str> = body["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(body["facets"]["categories"], json!({"security": 2}));
    assert_eq!(body["facets"]["tags"], json!({"night": 2, "market": 1}));
}

#[tokio::test]
async fn json_body_search_with_nested_location() {
    let (status, body) = call(
        app(seeded()),
        post_json(
            "/api/search/issues",
            r#"{"location": {"lat": -1.2921, "lng": 36.8219, "radius": 10}, "limit": "5"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["issues"][0]["id"], "a");
    assert_eq!(body["issues"][0]["createdAt"], "2024-02-02T08:00:00Z");
}

#[tokio::test]
async fn empty_match_keeps_all_three_fields() {
    let (status, body) = call(
        app(seeded()),
        post_json("/api/search/issues", r#"{"categories": ["NONEXISTENT"]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "issues": [],
            "total": 0,
            "facets": {"categories": {}, "priorities": {}, "statuses": {}, "tags": {}}
        })
    );
}

#[tokio::test]
async fn facets_endpoint_returns_only_facets() {
    let (status, body) = call(
        app(seeded()),
        post_json("/api/search/facets", r#"{"tags": "night", "page": 7, "limit": 50}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("issues").is_none());
    assert_eq!(body["categories"], json!({"security": 2}));
    assert_eq!(body["statuses"], json!({"pending": 2}));

    let (status, body) = call(app(seeded()), get("/api/search/facets?statuses=pending")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["categories"], json!({"security": 2, "health": 1}));
}

#[tokio::test]
async fn malformed_body_is_a_client_error() {
    let (status, body) = call(app(seeded()), post_json("/api/search/issues", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("invalid request body"));

    let (status, _) = call(
        app(seeded()),
        post_json("/api/search/facets", r#"{"categories": 42}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn issue_lookup_reflects_votes() {
    let store = seeded();
    store.vote("c", "u1", VoteType::Up).await.unwrap();
    store.vote("c", "u1", VoteType::Down).await.unwrap();
    let (status, body) = call(app(store), get("/api/issues/c")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["votes"]["up"], json!([]));
    assert_eq!(body["votes"]["down"], json!(["u1"]));

    let (status, body) = call(app(seeded()), get("/api/issues/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "issue not found");
}

#[tokio::test]
async fn metrics_expose_search_counters() {
    let router = app(seeded());
    let _ = call(router.clone(), get("/api/issues")).await;
    let resp = router.oneshot(get("/metrics")).await.unwrap();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("search_requests_total"));
}

#[tokio::test]
async fn store_failure_is_a_server_error_without_partial_result() {
    for uri in ["/api/search/issues", "/api/search/facets"] {
        let (status, body) = call(app(DownStore), post_json(uri, r#"{"tags": ["night"]}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert!(body["error"].as_str().unwrap().contains("backend unreachable"));
        for key in ["issues", "total", "facets", "categories"] {
            assert!(body.get(key).is_none(), "{uri} leaked {key}");
        }
    }
    let (status, _) = call(app(DownStore), get("/api/issues?page=2")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
