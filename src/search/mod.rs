//! Vector search: the hosted index client and result merging.

pub mod merge;
pub mod pinecone;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::SearchResult;

/// Text in, top-K technology records out.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}
