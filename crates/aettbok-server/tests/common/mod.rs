//! Shared helpers for server integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use aettbok_core::{EntityStore, InMemoryCache, InMemoryGraph, NodeCache};
use aettbok_server::{build_router, AppState};

/// Test app plus handles on its in-memory backends.
pub struct TestApp {
    pub router: Router,
    pub graph: Arc<InMemoryGraph>,
    pub cache: Arc<InMemoryCache>,
}

/// Creates an app over fresh in-memory backends.
pub fn create_test_app(api_key: Option<&str>) -> TestApp {
    let graph = Arc::new(InMemoryGraph::new());
    let cache = Arc::new(InMemoryCache::new());
    let store = EntityStore::new(
        graph.clone(),
        NodeCache::new(cache.clone(), Duration::from_secs(60)),
    );
    let state = Arc::new(AppState {
        store,
        api_key: api_key.map(String::from),
    });
    TestApp {
        router: build_router(state),
        graph,
        cache,
    }
}

/// Sends one request, with an optional JSON body.
pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    router
        .clone()
        .oneshot(request)
        .await
        .expect("Request failed")
}

/// Reads a response body as JSON.
pub async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&body).expect("Invalid JSON")
}
