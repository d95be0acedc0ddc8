use anyhow::Result;

use crate::llm::prompts::SEARCH_QUERY_GENERATION;
use crate::llm::ChatBackend;
use crate::models::{ChatMessage, SearchQuery, SearchQueryResponse};

/// Upper bound on queries fanned out per pipeline run.
pub const MAX_QUERIES: usize = 3;

/// Ask the LLM for up to three diversified search queries for `context`.
/// An unparseable reply yields an empty list rather than an error.
pub async fn generate_queries(chat: &dyn ChatBackend, context: &str) -> Result<Vec<SearchQuery>> {
    let messages = vec![
        ChatMessage::system(SEARCH_QUERY_GENERATION),
        ChatMessage::user(context),
    ];
    let reply = chat.complete(&messages).await?;
    Ok(parse_search_queries(&reply))
}

pub fn parse_search_queries(content: &str) -> Vec<SearchQuery> {
    // Extract the JSON object from the reply
    let json_str = match (content.find('{'), content.rfind('}')) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => content,
    };

    match serde_json::from_str::<SearchQueryResponse>(json_str) {
        Ok(parsed) => parsed
            .queries
            .into_iter()
            .filter(|q| !q.query.trim().is_empty())
            .map(|q| SearchQuery {
                query: q.query.trim().to_string(),
                explanation: q.explanation.trim().to_string(),
            })
            .take(MAX_QUERIES)
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to parse generated queries: {e}. Raw: {content}");
            Vec::new()
        }
    }
}
