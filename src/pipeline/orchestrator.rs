use anyhow::{Context, Result};
use futures_util::future::try_join_all;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::PacingConfig;
use crate::llm::prompts::{
    parse_analysis, sanitize_for_prompt, Analysis, QUERY_ANALYSIS, REFINEMENT_ANALYSIS,
};
use crate::llm::query_gen::generate_queries;
use crate::llm::ChatBackend;
use crate::models::{ChatMessage, Message, SearchQuery, SearchResult};
use crate::pipeline::pacing::at_least;
use crate::pipeline::session::{LoadingGuard, SessionHandle};
use crate::search::merge::merge_by_title;
use crate::search::SearchBackend;

/// System message appended once a search round has finished.
pub const RESULTS_DONE: &str = "RESULTS_DONE";

/// Shown to the user when a run fails; details go to the log.
pub const RUN_FAILED: &str = "Failed to process search. Please try again.";

/// How many previous result titles are shown to the LLM when refining.
const PREVIOUS_TITLES_IN_PROMPT: usize = 10;

/// How a pipeline run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The analysis asked a clarifying question; nothing was searched.
    Clarify,
    /// A search round completed with this many unique results.
    Results(usize),
}

#[derive(Debug)]
pub enum PipelineError {
    /// Another step is already running for this session.
    Busy,
    Failed(anyhow::Error),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Busy => write!(f, "A search is already in progress"),
            PipelineError::Failed(e) => write!(f, "{e:#}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<anyhow::Error> for PipelineError {
    fn from(e: anyhow::Error) -> Self {
        PipelineError::Failed(e)
    }
}

/// Sequences analyze → (clarify | generate → fan-out search → merge) for a
/// session and records every step in its transcript.
#[derive(Clone)]
pub struct Pipeline {
    chat: Arc<dyn ChatBackend>,
    search: Arc<dyn SearchBackend>,
    pacing: PacingConfig,
}

impl Pipeline {
    pub fn new(
        chat: Arc<dyn ChatBackend>,
        search: Arc<dyn SearchBackend>,
        pacing: PacingConfig,
    ) -> Self {
        Self {
            chat,
            search,
            pacing,
        }
    }

    /// First run for a freshly created session, awaited in place.
    pub async fn start(&self, handle: &SessionHandle) -> Result<Outcome, PipelineError> {
        let guard = self.begin(handle, None)?;
        self.finish(guard, handle).await
    }

    /// Mark the session busy and run its first pass on a background task, so
    /// callers can return the session id and poll its transcript.
    pub fn spawn_start(
        &self,
        handle: &SessionHandle,
    ) -> Result<JoinHandle<Result<Outcome, PipelineError>>, PipelineError> {
        let guard = self.begin(handle, None)?;
        let pipeline = self.clone();
        let handle = handle.clone();
        Ok(tokio::spawn(async move {
            pipeline.finish(guard, &handle).await
        }))
    }

    /// Re-enter the pipeline with the refinement folded into the context.
    /// When the last step asked a question, the refinement is its answer.
    pub async fn refine(
        &self,
        handle: &SessionHandle,
        refinement: &str,
    ) -> Result<Outcome, PipelineError> {
        let guard = self.begin(handle, Some(refinement))?;
        self.finish(guard, handle).await
    }

    /// Take the loading flag and record the user turn that triggered the run.
    fn begin(
        &self,
        handle: &SessionHandle,
        refinement: Option<&str>,
    ) -> Result<LoadingGuard, PipelineError> {
        let guard = LoadingGuard::acquire(handle).ok_or(PipelineError::Busy)?;
        let mut session = handle.write();
        session.error = None;
        match refinement {
            Some(text) => {
                session.push(Message::user(text));
                session.add_turn(text);
            }
            None => {
                let query = session.query.clone();
                session.push(Message::user(query));
            }
        }
        Ok(guard)
    }

    /// The guard is dropped only after a failure has been recorded, so a
    /// poller never sees an idle session without its error.
    async fn finish(
        &self,
        _guard: LoadingGuard,
        handle: &SessionHandle,
    ) -> Result<Outcome, PipelineError> {
        match self.run(handle).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                let id = handle.read().id;
                tracing::error!("Pipeline run failed for session {id}: {e:#}");
                handle.write().error = Some(RUN_FAILED.to_string());
                Err(PipelineError::Failed(e))
            }
        }
    }

    async fn run(&self, handle: &SessionHandle) -> Result<Outcome> {
        let (context, previous_titles) = {
            let session = handle.read();
            let titles: Vec<String> = session
                .results
                .iter()
                .take(PREVIOUS_TITLES_IN_PROMPT)
                .map(|r| sanitize_for_prompt(&r.title))
                .collect();
            (sanitize_for_prompt(&session.combined_context()), titles)
        };

        // ── Step 1: Analysis / clarification gate ────────────
        handle
            .write()
            .push(Message::placeholder("Analyzing your query..."));

        let prompt = analysis_messages(&context, &previous_titles);
        let reply = at_least(self.pacing.analysis_min(), self.chat.complete(&prompt))
            .await
            .context("Query analysis failed")?;

        match parse_analysis(&reply) {
            Analysis::Clarify { question } => {
                tracing::info!("Analysis asked for clarification");
                let mut session = handle.write();
                session.clear_placeholders();
                session.push(Message::system(question));
                session.awaiting_clarification = true;
                return Ok(Outcome::Clarify);
            }
            Analysis::Ready { explanation } => {
                let mut session = handle.write();
                session.clear_placeholders();
                session.awaiting_clarification = false;
                if !explanation.is_empty() {
                    session.push(Message::system(explanation));
                }
            }
        }

        // ── Step 2: Query generation ─────────────────────────
        handle
            .write()
            .push(Message::placeholder("Generating search queries..."));

        let mut queries = generate_queries(self.chat.as_ref(), &context)
            .await
            .context("Query generation failed")?;
        if queries.is_empty() {
            tracing::warn!("No queries generated; searching with the request as written");
            queries.push(SearchQuery {
                query: context.clone(),
                explanation: "Searching with your request as written.".to_string(),
            });
        }
        tracing::info!("Generated {} search queries", queries.len());

        {
            let mut session = handle.write();
            session.clear_placeholders();
            session.push(
                Message::system(format!(
                    "Searching with {} {}:",
                    queries.len(),
                    if queries.len() == 1 { "query" } else { "queries" }
                ))
                .with_queries(queries.clone()),
            );
            session.push(Message::placeholder("Loading search results..."));
        }

        // ── Step 3: Fan-out search + merge ───────────────────
        let results = at_least(self.pacing.search_min(), self.fan_out(&queries)).await?;
        let count = results.len();
        tracing::info!("Search round produced {count} unique results");

        let mut session = handle.write();
        session.clear_placeholders();
        session.results = results.clone();
        session.push(Message::results(
            format!("Found {count} relevant technologies."),
            results,
        ));
        session.push(Message::system(RESULTS_DONE));

        Ok(Outcome::Results(count))
    }

    /// Search every query concurrently and merge by title. A single failed
    /// search fails the whole batch.
    pub async fn fan_out(&self, queries: &[SearchQuery]) -> Result<Vec<SearchResult>> {
        let searches = queries.iter().map(|q| self.search.search(&q.query));
        let batches = try_join_all(searches).await.context("Search failed")?;
        Ok(merge_by_title(batches))
    }
}

fn analysis_messages(context: &str, previous_titles: &[String]) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(QUERY_ANALYSIS)];
    if previous_titles.is_empty() {
        messages.push(ChatMessage::user(context));
    } else {
        messages.push(ChatMessage::system(REFINEMENT_ANALYSIS));
        messages.push(ChatMessage::user(format!(
            "{context}\n\nPrevious results:\n- {}",
            previous_titles.join("\n- ")
        )));
    }
    messages
}
