//! # incepta
//!
//! A web service for finding university technologies, patents and funding
//! from a plain-language description of a need. An LLM checks whether the
//! request is specific enough, writes diversified search queries, and later
//! summarizes the results a user picks into a downloadable report. Matches
//! come from a hosted vector index.
//!
//! ## Pipeline
//!
//! ```text
//!                     ┌──────────────┐
//!                     │  User Query  │
//!                     └──────┬───────┘
//!                            ▼
//!                 ┌─────────────────────┐
//!                 │  Analysis (LLM)     │──── no QUERY_READY ───▶ one clarifying
//!                 │  paced ≥ 1.0s       │                         question, stop
//!                 └──────────┬──────────┘
//!                            │ QUERY_READY
//!                            ▼
//!                 ┌─────────────────────┐
//!                 │ Query generation    │
//!                 │ (LLM: up to 3)      │
//!                 └──────────┬──────────┘
//!            ┌───────────────┼───────────────┐
//!            ▼               ▼               ▼
//!     ┌────────────┐  ┌────────────┐  ┌────────────┐
//!     │ embed+query│  │ embed+query│  │ embed+query│   all-or-nothing
//!     └─────┬──────┘  └─────┬──────┘  └─────┬──────┘   paced ≥ 1.5s
//!           └───────────────┼───────────────┘
//!                           ▼
//!                ┌──────────────────────┐
//!                │ Merge by title       │
//!                │ (first seen wins)    │
//!                └──────────┬───────────┘
//!                           ▼
//!                ┌──────────────────────┐      refine: original query +
//!                │ Results + selection  │◀──── every later user turn
//!                └──────────┬───────────┘
//!                           ▼
//!                ┌──────────────────────┐
//!                │ Report: LLM summaries│
//!                │ → HTML / PDF         │
//!                └──────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, LLM, Pinecone and pacing
//! - [`models`] - Shared data types: `SearchResult`, `Message`, `SearchQuery`, request/response types
//! - [`llm::chat`] - Chat completion via Ollama or OpenAI-compatible APIs
//! - [`llm::prompts`] - Prompt library and the analysis ready/clarify split
//! - [`llm::query_gen`] - LLM query generation (at most 3 queries)
//! - [`search::pinecone`] - Embedding + namespace query against Pinecone
//! - [`search::merge`] - Title-keyed deduplicating merge
//! - [`pipeline`] - Sessions, pacing and the analyze/search/refine orchestration
//! - [`recent`] - Capped most-recent-first list of previous queries
//! - [`report`] - Selected results summarized into HTML and PDF
//! - [`api`] - Axum HTTP handlers and router
//! - [`state`] - Shared application state

pub mod api;
pub mod config;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod recent;
pub mod report;
pub mod search;
pub mod state;
