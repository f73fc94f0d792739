//! Shared helpers for router tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use questlog_api::{router, AppContext, Stores};
use questlog_common::MockClock;
use questlog_domain::{Config, StorageBackend};
use serde_json::Value;
use tower::ServiceExt;

/// Router over in-memory stores with the clock pinned to 2025-03-10 09:00 UTC.
pub struct TestApp {
    pub router: Router,
    pub clock: MockClock,
}

impl TestApp {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.database.backend = StorageBackend::Memory;
        let clock = MockClock::at(Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap());
        let ctx = AppContext::from_parts(config, Stores::in_memory(), Arc::new(clock.clone()), None);
        Self { router: router(Arc::new(ctx)), clock }
    }

    /// Send a request as `user` (no identity header when `None`).
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            request = request.header("x-user-id", user);
        }
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    /// Create a task for `user` and return its id.
    pub async fn create_task(&self, user: &str, body: Value) -> String {
        let (status, json) = self.call(Method::POST, "/tasks", Some(user), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {json}");
        json["task"]["id"].as_str().unwrap().to_string()
    }
}
