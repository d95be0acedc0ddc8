//! Fake backends and request helpers shared by the integration tests.
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use incepta::config::{Config, PacingConfig};
use incepta::llm::prompts::{QUERY_ANALYSIS, SEARCH_QUERY_GENERATION};
use incepta::llm::ChatBackend;
use incepta::models::{ChatMessage, SearchResult};
use incepta::search::SearchBackend;
use incepta::state::AppState;

/// Chat backend that answers by pipeline step, keyed on the first system prompt.
#[derive(Default)]
pub struct ScriptedChat {
    analysis_replies: Mutex<VecDeque<String>>,
    generation_reply: Mutex<String>,
    pub analysis_inputs: Mutex<Vec<Vec<ChatMessage>>>,
    pub calls: AtomicUsize,
    pub fail: std::sync::atomic::AtomicBool,
}

impl ScriptedChat {
    pub fn new(analysis: &[&str], generation: &str) -> Arc<Self> {
        Arc::new(Self {
            analysis_replies: Mutex::new(analysis.iter().map(|s| s.to_string()).collect()),
            generation_reply: Mutex::new(generation.to_string()),
            ..Default::default()
        })
    }

    pub fn push_analysis(&self, reply: &str) {
        self.analysis_replies.lock().push_back(reply.to_string());
    }
}

#[async_trait]
impl ChatBackend for ScriptedChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("chat provider unavailable");
        }
        let first = messages.first().map(|m| m.content.as_str()).unwrap_or_default();
        if first == QUERY_ANALYSIS {
            self.analysis_inputs.lock().push(messages.to_vec());
            return Ok(self
                .analysis_replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| "QUERY_READY".to_string()));
        }
        if first == SEARCH_QUERY_GENERATION {
            return Ok(self.generation_reply.lock().clone());
        }
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        Ok(format!("Echo: {}", last.lines().next().unwrap_or_default()))
    }
}

/// Search backend returning canned results per query text.
#[derive(Default)]
pub struct FakeSearch {
    results: HashMap<String, Vec<SearchResult>>,
    failing: Option<String>,
    pub calls: AtomicUsize,
    pub queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, query: &str, titles: &[&str]) -> Self {
        self.results
            .insert(query.to_string(), titles.iter().map(|t| result(t)).collect());
        self
    }

    pub fn failing_on(mut self, query: &str) -> Self {
        self.failing = Some(query.to_string());
        self
    }
}

#[async_trait]
impl SearchBackend for FakeSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().push(query.to_string());
        if self.failing.as_deref() == Some(query) {
            anyhow::bail!("Pinecone search error (503): unavailable");
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }
}

/// Chat backend that holds every call until the test releases a permit.
pub struct GatedChat {
    inner: Arc<ScriptedChat>,
    pub gate: tokio::sync::Semaphore,
}

impl GatedChat {
    pub fn new(inner: Arc<ScriptedChat>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            gate: tokio::sync::Semaphore::new(0),
        })
    }
}

#[async_trait]
impl ChatBackend for GatedChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.gate.acquire().await?.forget();
        self.inner.complete(messages).await
    }
}

pub fn result(title: &str) -> SearchResult {
    SearchResult {
        id: format!("id-{title}"),
        title: title.to_string(),
        university: "Test University".to_string(),
        description: format!("{title} description"),
        score: 0.5,
        ..Default::default()
    }
}

pub fn generation_json(queries: &[&str]) -> String {
    let items: Vec<Value> = queries
        .iter()
        .map(|q| serde_json::json!({ "query": q, "explanation": format!("Covers {q}.") }))
        .collect();
    serde_json::json!({ "queries": items }).to_string()
}

pub fn test_state(
    dir: &tempfile::TempDir,
    chat: Arc<dyn ChatBackend>,
    search: Arc<FakeSearch>,
) -> AppState {
    let config = Config {
        data_dir: dir.path().to_path_buf(),
        pacing: PacingConfig::none(),
        ..Config::default()
    };
    AppState::with_backends(config, chat, search).unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> TestResponse {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&v).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

/// Poll the session view until `done` holds for it.
pub async fn wait_for(app: &Router, id: &str, done: impl Fn(&Value) -> bool) -> Value {
    for _ in 0..500 {
        let resp = send(app, "GET", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(resp.status, StatusCode::OK);
        let session = resp.json();
        if done(&session) {
            return session;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("session {id} never reached the expected state");
}

/// Poll until the session's current run has finished.
pub async fn wait_idle(app: &Router, id: &str) -> Value {
    wait_for(app, id, |s| s["is_loading"] == false).await
}

/// Start a session and wait for its first run to finish.
pub async fn start_and_wait(app: &Router, query: &str) -> Value {
    let resp = send(app, "POST", "/api/sessions", Some(serde_json::json!({ "query": query }))).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let id = resp.json()["id"].as_str().unwrap().to_string();
    wait_idle(app, &id).await
}
