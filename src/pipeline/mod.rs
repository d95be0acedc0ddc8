//! Results-page orchestration: sessions, pacing and the analyze/search pipeline.

pub mod orchestrator;
pub mod pacing;
pub mod session;

pub use orchestrator::{Outcome, Pipeline, PipelineError, RESULTS_DONE, RUN_FAILED};
pub use session::{LoadingGuard, Session, SessionHandle, SessionStore};
