#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use mepie_finance_api::clock::ManualClock;
use mepie_finance_api::config::AppConfig;
use mepie_finance_api::database::MemoryStore;
use mepie_finance_api::{app, AppState};

pub const PASSWORD: &str = "mepie2024admin";

/// In-process app over the memory store with a hand-driven clock
pub struct TestApp {
    router: Router,
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryStore>,
    next_client: AtomicUsize,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::development())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()));
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(Arc::new(config), store.clone(), clock.clone());

        Self {
            router: app(state),
            clock,
            store,
            next_client: AtomicUsize::new(1),
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        headers: &[(&str, &str)],
        body: Option<Body>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .header("content-type", "application/json")
            .body(body.unwrap_or_else(Body::empty))
            .context("failed to build request")?;

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response body is not JSON")?
        };

        Ok(TestResponse { status, headers, body })
    }

    pub async fn send(&self, method: Method, uri: &str, body: Value) -> Result<TestResponse> {
        self.request(method, uri, &[], Some(Body::from(body.to_string()))).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Result<TestResponse> {
        self.send(Method::POST, uri, body).await
    }

    pub async fn get(&self, uri: &str) -> Result<TestResponse> {
        self.request(Method::GET, uri, &[], None).await
    }

    /// Log in from a fresh client address so tests never share a limiter bucket
    pub async fn login(&self, user_name: &str) -> Result<String> {
        let ip = format!("192.0.2.{}", self.next_client.fetch_add(1, Ordering::Relaxed));
        let res = self
            .request(
                Method::POST,
                "/api/finance/auth",
                &[("x-forwarded-for", ip.as_str())],
                Some(Body::from(
                    json!({"action": "login", "userName": user_name, "password": PASSWORD}).to_string(),
                )),
            )
            .await?;
        anyhow::ensure!(res.status == StatusCode::OK, "login failed: {}", res.body);

        res.body["sessionToken"]
            .as_str()
            .map(str::to_string)
            .context("login response has no sessionToken")
    }

    /// Create a record through the mutate endpoint and return it
    pub async fn create(&self, token: &str, kind: &str, data: Value) -> Result<Value> {
        let res = self
            .post(
                "/api/finance/mutate",
                json!({"sessionToken": token, "action": "create", "type": kind, "data": data}),
            )
            .await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "create failed: {}", res.body);
        Ok(res.body["record"].clone())
    }
}

pub fn incoming(amount: Value, source: &str) -> Value {
    json!({
        "date": "2024-05-20",
        "amount": amount,
        "source": source,
        "donor_initials": "JD",
        "approved_by": "Marshall Epie"
    })
}

pub fn outgoing(amount: Value) -> Value {
    json!({
        "date": "2024-05-21",
        "amount": amount,
        "recipient": "Community Hall",
        "purpose": "Venue hire",
        "category": "Operations",
        "approved_by": "Aruna Ramineni"
    })
}
