//! Pipeline runs against fake backends, including the minimum step durations.

mod common;

use parking_lot::RwLock;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

use common::{generation_json, FakeSearch, ScriptedChat};
use incepta::config::PacingConfig;
use incepta::models::SearchQuery;
use incepta::pipeline::{
    Outcome, Pipeline, PipelineError, Session, SessionHandle, RESULTS_DONE, RUN_FAILED,
};

fn handle(query: &str) -> SessionHandle {
    Arc::new(RwLock::new(Session::new(query)))
}

fn queries(texts: &[&str]) -> Vec<SearchQuery> {
    texts
        .iter()
        .map(|q| SearchQuery {
            query: q.to_string(),
            explanation: String::new(),
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_ready_run_respects_minimum_durations() {
    let chat = ScriptedChat::new(&["QUERY_READY"], &generation_json(&["a"]));
    let search = Arc::new(FakeSearch::new().with("a", &["Hit"]));
    let pipeline = Pipeline::new(chat, search, PacingConfig::default());
    let session = handle("anything");

    let started = Instant::now();
    let outcome = pipeline.start(&session).await.unwrap();

    assert_eq!(outcome, Outcome::Results(1));
    assert!(started.elapsed() >= Duration::from_millis(2500));
}

#[tokio::test(start_paused = true)]
async fn test_clarify_run_only_waits_for_analysis() {
    let chat = ScriptedChat::new(&["What budget do you have?"], "");
    let search = Arc::new(FakeSearch::new());
    let pipeline = Pipeline::new(chat, search.clone(), PacingConfig::default());
    let session = handle("anything");

    let started = Instant::now();
    let outcome = pipeline.start(&session).await.unwrap();

    assert_eq!(outcome, Outcome::Clarify);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(1000));
    assert!(elapsed < Duration::from_millis(2500));
    assert_eq!(search.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fan_out_is_all_or_nothing() {
    let search = Arc::new(
        FakeSearch::new()
            .with("a", &["One", "Two"])
            .with("b", &["Two", "Three"])
            .failing_on("c"),
    );
    let pipeline = Pipeline::new(ScriptedChat::new(&[], ""), search, PacingConfig::none());

    let merged = pipeline.fan_out(&queries(&["a", "b"])).await.unwrap();
    let titles: Vec<_> = merged.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["One", "Two", "Three"]);

    assert!(pipeline.fan_out(&queries(&["a", "b", "c"])).await.is_err());
}

#[tokio::test]
async fn test_failure_leaves_session_idle_without_placeholders() {
    let chat = ScriptedChat::new(&["QUERY_READY"], &generation_json(&["ok", "bad"]));
    let search = Arc::new(FakeSearch::new().with("ok", &["Fine"]).failing_on("bad"));
    let pipeline = Pipeline::new(chat, search, PacingConfig::none());
    let session = handle("q");

    let err = pipeline.start(&session).await.unwrap_err();
    assert!(matches!(err, PipelineError::Failed(_)));

    let s = session.read();
    assert!(!s.is_loading);
    assert!(s.messages.iter().all(|m| !m.is_searching));
    assert!(s.results.is_empty());
    assert!(s.messages.iter().all(|m| m.content != RESULTS_DONE));
    assert_eq!(s.error.as_deref(), Some(RUN_FAILED));
}

#[tokio::test]
async fn test_spawned_start_marks_loading_before_it_runs() {
    let chat = ScriptedChat::new(&["QUERY_READY"], &generation_json(&["a"]));
    let search = Arc::new(FakeSearch::new().with("a", &["Hit"]));
    let pipeline = Pipeline::new(chat, search, PacingConfig::none());
    let session = handle("anything");

    let task = pipeline.spawn_start(&session).unwrap();
    assert!(session.read().is_loading);
    assert!(matches!(pipeline.spawn_start(&session), Err(PipelineError::Busy)));

    assert_eq!(task.await.unwrap().unwrap(), Outcome::Results(1));
    let s = session.read();
    assert!(!s.is_loading);
    assert_eq!(s.results.len(), 1);
}

#[tokio::test]
async fn test_unparseable_generation_falls_back_to_context() {
    let chat = ScriptedChat::new(&["QUERY_READY"], "Sorry, I can't produce JSON today.");
    let search = Arc::new(FakeSearch::new().with("water desalination", &["Membrane X"]));
    let pipeline = Pipeline::new(chat, search.clone(), PacingConfig::none());
    let session = handle("water desalination");

    let outcome = pipeline.start(&session).await.unwrap();

    assert_eq!(outcome, Outcome::Results(1));
    assert_eq!(*search.queries.lock(), vec!["water desalination"]);
}

#[tokio::test]
async fn test_generation_capped_at_three_queries() {
    let chat = ScriptedChat::new(
        &["QUERY_READY"],
        &generation_json(&["one", "two", "three", "four", "five"]),
    );
    let search = Arc::new(FakeSearch::new());
    let pipeline = Pipeline::new(chat, search.clone(), PacingConfig::none());
    let session = handle("q");

    let outcome = pipeline.start(&session).await.unwrap();

    assert_eq!(outcome, Outcome::Results(0));
    assert_eq!(search.calls.load(Ordering::SeqCst), 3);
    let s = session.read();
    assert_eq!(s.messages.last().unwrap().content, RESULTS_DONE);
}

#[tokio::test]
async fn test_refine_replaces_results() {
    let chat = ScriptedChat::new(&["QUERY_READY", "QUERY_READY"], &generation_json(&["q"]));
    let search = Arc::new(FakeSearch::new().with("q", &["Same Title"]));
    let pipeline = Pipeline::new(chat.clone(), search, PacingConfig::none());
    let session = handle("q");

    pipeline.start(&session).await.unwrap();
    pipeline.refine(&session, "narrower").await.unwrap();

    let s = session.read();
    assert_eq!(s.results.len(), 1);
    let done = s
        .messages
        .iter()
        .filter(|m| m.content == RESULTS_DONE)
        .count();
    assert_eq!(done, 2);
    assert_eq!(chat.analysis_inputs.lock().len(), 2);
}
