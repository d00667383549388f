//! End-to-end tests of the router: request in, forward or rejection out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use routing::{
    ChangeLookup, CommitRef, Dispatcher, LookupError, PackageId, PackageRegistry,
    PullRequestNumber, RateLimitInfo, RepositoryRef, SuppressionRule, CODECOV_BOT_ID,
};
use serde_json::json;
use tower::ServiceExt;

use super::*;
use crate::signature::sign;

const MONOREPO_URL: &str = "https://hooks.test/monorepo";
const PKG_A_URL: &str = "https://hooks.test/pkg-a";
const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

// ─── Test doubles ───

/// Answers every lookup with the same result and counts calls.
struct FixedLookup {
    result: Result<Vec<String>, LookupError>,
    calls: AtomicUsize,
}

impl FixedLookup {
    fn files(paths: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(paths.iter().map(|p| (*p).to_owned()).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(err: LookupError) -> Arc<Self> {
        Arc::new(Self {
            result: Err(err),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChangeLookup for FixedLookup {
    async fn commit_files(
        &self,
        _repo: &RepositoryRef,
        _commit: &CommitRef,
    ) -> Result<Vec<String>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }

    async fn pull_request_files(
        &self,
        _repo: &RepositoryRef,
        _number: PullRequestNumber,
    ) -> Result<Vec<String>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Records deliveries instead of making them.
#[derive(Default)]
struct RecordingForwarder {
    delivered: Mutex<Vec<(String, ForwardRequest)>>,
    unreachable: bool,
}

impl RecordingForwarder {
    fn endpoints(&self) -> Vec<String> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|(endpoint, _)| endpoint.clone())
            .collect()
    }

    fn last_request(&self) -> ForwardRequest {
        self.delivered.lock().unwrap().last().unwrap().1.clone()
    }
}

#[async_trait]
impl Forwarder for RecordingForwarder {
    async fn forward(
        &self,
        endpoint: &str,
        request: ForwardRequest,
    ) -> Result<ForwardResponse, ForwardError> {
        if self.unreachable {
            // Any real transport error will do; port 1 refuses connections.
            let err = reqwest::Client::new()
                .post("http://127.0.0.1:1/")
                .send()
                .await
                .unwrap_err();
            return Err(ForwardError::Request(err));
        }
        self.delivered
            .lock()
            .unwrap()
            .push((endpoint.to_owned(), request));
        Ok(ForwardResponse {
            status: StatusCode::OK,
            content_type: Some("text/plain".into()),
            body: Bytes::from_static(b"delivered"),
        })
    }
}

// ─── Fixtures ───

struct Harness {
    lookup: Arc<FixedLookup>,
    forwarder: Arc<RecordingForwarder>,
    secret: Option<Vec<u8>>,
    endpoints: EndpointMap,
}

impl Harness {
    fn new(lookup: Arc<FixedLookup>) -> Self {
        Self {
            lookup,
            forwarder: Arc::new(RecordingForwarder::default()),
            secret: None,
            endpoints: EndpointMap::new(Some(MONOREPO_URL.into()))
                .with_package(pkg("pkg-a"), PKG_A_URL),
        }
    }

    fn with_secret(mut self, secret: &[u8]) -> Self {
        self.secret = Some(secret.to_vec());
        self
    }

    fn with_endpoints(mut self, endpoints: EndpointMap) -> Self {
        self.endpoints = endpoints;
        self
    }

    fn with_unreachable_forwarder(mut self) -> Self {
        self.forwarder = Arc::new(RecordingForwarder {
            unreachable: true,
            ..RecordingForwarder::default()
        });
        self
    }

    fn router(&self) -> axum::Router {
        let registry = PackageRegistry::from_names(["pkg-a", "pkg-b", "pkg-c"], Some("pkg-a")).unwrap();
        let dispatcher = Dispatcher::new(
            registry,
            SuppressionRule::new(true, true, []),
            self.lookup.clone(),
        );
        build_router(AppState::new(
            dispatcher,
            self.endpoints.clone(),
            self.forwarder.clone(),
            self.secret.clone(),
        ))
    }
}

fn pkg(name: &str) -> PackageId {
    PackageId::new(name).unwrap()
}

fn delivery(event: &str, body: &serde_json::Value) -> Request<Body> {
    let bytes = serde_json::to_vec(body).unwrap();
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header("user-agent", "GitHub-Hookshot/044aadd")
        .header("x-github-event", event)
        .header("x-github-delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958")
        .body(Body::from(bytes))
        .unwrap()
}

fn signed_delivery(event: &str, body: &serde_json::Value, secret: &[u8]) -> Request<Body> {
    let bytes = serde_json::to_vec(body).unwrap();
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("user-agent", "GitHub-Hookshot/044aadd")
        .header("x-github-event", event)
        .header("x-hub-signature-256", sign(&bytes, secret))
        .body(Body::from(bytes))
        .unwrap()
}

fn release(tag: &str) -> serde_json::Value {
    json!({ "action": "published", "release": { "tag_name": tag } })
}

fn commit_comment(author: u64) -> serde_json::Value {
    json!({
        "action": "created",
        "comment": { "commit_id": SHA, "user": { "id": author, "login": "someone" } },
        "repository": { "name": "monorepo", "owner": { "login": "acme" } }
    })
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ─── Health ───

#[tokio::test]
async fn health_returns_200() {
    let app = Harness::new(FixedLookup::files(&[])).router();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}

// ─── Request validation ───

#[tokio::test]
async fn non_hookshot_user_agent_is_400() {
    let harness = Harness::new(FixedLookup::files(&[]));
    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("user-agent", "curl/8.5.0")
        .header("x-github-event", "push")
        .body(Body::from("{}"))
        .unwrap();

    let response = harness.router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Not a github event");
    assert!(harness.forwarder.endpoints().is_empty());
}

#[tokio::test]
async fn missing_event_header_is_400() {
    let harness = Harness::new(FixedLookup::files(&[]));
    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("user-agent", "GitHub-Hookshot/044aadd")
        .body(Body::from("{}"))
        .unwrap();

    let response = harness.router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bad_signature_is_401() {
    let harness = Harness::new(FixedLookup::files(&[])).with_secret(b"right");

    let response = harness
        .router()
        .oneshot(signed_delivery("release", &release("x/pkg-a@1.0.0"), b"wrong"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(harness.forwarder.endpoints().is_empty());
}

#[tokio::test]
async fn missing_signature_is_401_when_secret_configured() {
    let harness = Harness::new(FixedLookup::files(&[])).with_secret(b"right");

    let response = harness
        .router()
        .oneshot(delivery("release", &release("x/pkg-a@1.0.0")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_signature_is_forwarded() {
    let harness = Harness::new(FixedLookup::files(&[])).with_secret(b"right");

    let response = harness
        .router()
        .oneshot(signed_delivery("release", &release("x/pkg-a@1.0.0"), b"right"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(harness.forwarder.endpoints(), vec![PKG_A_URL]);
}

// ─── Forwarding ───

#[tokio::test]
async fn unchecked_event_goes_to_monorepo_endpoint() {
    let harness = Harness::new(FixedLookup::files(&[]));

    let response = harness
        .router()
        .oneshot(delivery("star", &json!({ "action": "created" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(harness.forwarder.endpoints(), vec![MONOREPO_URL]);
    assert_eq!(harness.lookup.calls(), 0);
}

#[tokio::test]
async fn package_event_relays_upstream_answer() {
    let harness = Harness::new(FixedLookup::files(&[]));
    let payload = release("x/pkg-a@1.0.0");

    let response = harness
        .router()
        .oneshot(delivery("release", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/plain");
    assert_eq!(body_text(response).await, "delivered");

    let forwarded = harness.forwarder.last_request();
    assert_eq!(forwarded.headers["x-github-event"], "release");
    assert_eq!(forwarded.headers["user-agent"], "GitHub-Hookshot/044aadd");
    assert_eq!(forwarded.body, Bytes::from(serde_json::to_vec(&payload).unwrap()));
}

#[tokio::test]
async fn package_without_endpoint_falls_back_to_monorepo() {
    let harness = Harness::new(FixedLookup::files(&[]));

    harness
        .router()
        .oneshot(delivery("release", &release("x/pkg-b@2.1.0")))
        .await
        .unwrap();

    assert_eq!(harness.forwarder.endpoints(), vec![MONOREPO_URL]);
}

#[tokio::test]
async fn commit_comment_routes_by_changed_files() {
    let harness = Harness::new(FixedLookup::files(&["packages/pkg-a/src/index.ts"]));

    harness
        .router()
        .oneshot(delivery("commit_comment", &commit_comment(583_231)))
        .await
        .unwrap();

    assert_eq!(harness.forwarder.endpoints(), vec![PKG_A_URL]);
    assert_eq!(harness.lookup.calls(), 1);
}

#[tokio::test]
async fn suppressed_event_is_204_and_not_forwarded() {
    let harness = Harness::new(FixedLookup::files(&["packages/pkg-a/src/index.ts"]));

    let response = harness
        .router()
        .oneshot(delivery("commit_comment", &commit_comment(CODECOV_BOT_ID.as_u64())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(harness.forwarder.endpoints().is_empty());
    assert_eq!(harness.lookup.calls(), 0);
}

#[tokio::test]
async fn missing_monorepo_endpoint_is_500() {
    let harness = Harness::new(FixedLookup::files(&[])).with_endpoints(EndpointMap::new(None));

    let response = harness
        .router()
        .oneshot(delivery("star", &json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_text(response).await,
        "Cannot process request due to missing server side keys"
    );
}

#[tokio::test]
async fn unreachable_endpoint_is_502() {
    let harness = Harness::new(FixedLookup::files(&[])).with_unreachable_forwarder();

    let response = harness
        .router()
        .oneshot(delivery("star", &json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

// ─── Lookup failures ───

#[tokio::test]
async fn not_found_lookup_forwards_to_monorepo() {
    let harness = Harness::new(FixedLookup::failing(LookupError::NotFound {
        message: "No commit found for SHA".into(),
    }));

    let response = harness
        .router()
        .oneshot(delivery("commit_comment", &commit_comment(583_231)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(harness.forwarder.endpoints(), vec![MONOREPO_URL]);
}

#[tokio::test]
async fn rate_limited_lookup_is_429_with_metadata() {
    let harness = Harness::new(FixedLookup::failing(LookupError::RateLimited {
        status: 403,
        message: "API rate limit exceeded".into(),
        rate_limit: RateLimitInfo {
            limit: Some("5000".into()),
            remaining: Some("0".into()),
            reset: Some("1717171717".into()),
        },
    }));

    let response = harness
        .router()
        .oneshot(delivery("commit_comment", &commit_comment(583_231)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let headers = response.headers();
    assert_eq!(headers["x-middleware-github-status"], "403");
    assert_eq!(headers["x-middleware-github-message"], "API rate limit exceeded");
    assert_eq!(headers["x-ratelimit-limit"], "5000");
    assert_eq!(headers["x-ratelimit-remaining"], "0");
    assert_eq!(headers["x-ratelimit-reset"], "1717171717");
    assert_eq!(headers["retry-after"], "0");
    assert!(harness.forwarder.endpoints().is_empty());
}

#[tokio::test]
async fn transport_failure_is_500_with_upstream_status() {
    let harness = Harness::new(FixedLookup::failing(LookupError::Transport {
        status: Some(502),
        message: "Bad Gateway".into(),
    }));

    let response = harness
        .router()
        .oneshot(delivery("pull_request", &json!({
            "action": "opened",
            "pull_request": { "number": 9, "labels": [] },
            "repository": { "name": "monorepo", "owner": { "login": "acme" } }
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()["x-middleware-github-status"], "502");
    assert!(response.headers().get("x-ratelimit-limit").is_none());
}

#[tokio::test]
async fn malformed_payload_is_500_with_error_headers() {
    let harness = Harness::new(FixedLookup::files(&[]));

    let response = harness
        .router()
        .oneshot(delivery("release", &json!({ "release": {} })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()["x-middleware-error"], "PayloadError");
    assert!(response.headers().contains_key("x-middleware-error-message"));
    assert!(harness.forwarder.endpoints().is_empty());
}
