use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A technology record returned by the vector index.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub university: String,
    /// Reference number assigned by the licensing office
    #[serde(default, deserialize_with = "lenient_string")]
    pub number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub published_date: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub patents: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub page_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_teaser: Option<String>,
    #[serde(default)]
    pub score: f32,
}

impl SearchResult {
    /// Short display text: teaser, then summary, then the raw description.
    pub fn teaser(&self) -> &str {
        [self.llm_teaser.as_deref(), self.llm_summary.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .unwrap_or(&self.description)
    }
}

/// Index metadata is loosely typed: numbers, booleans and string lists are
/// accepted and rendered as text, null becomes empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    })
}

/// One LLM-generated search query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchQueryResponse {
    #[serde(default)]
    pub queries: Vec<SearchQuery>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    System,
    Result,
}

/// A transcript entry on the results page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_queries: Option<Vec<SearchQuery>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<SearchResult>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_searching: bool,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageKind::User, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageKind::System, content)
    }

    pub fn results(content: impl Into<String>, results: Vec<SearchResult>) -> Self {
        Self {
            results: Some(results),
            ..Self::new(MessageKind::Result, content)
        }
    }

    /// Transient "loading" entry, removed once its step completes.
    pub fn placeholder(content: impl Into<String>) -> Self {
        Self {
            is_searching: true,
            ..Self::new(MessageKind::System, content)
        }
    }

    pub fn with_queries(mut self, queries: Vec<SearchQuery>) -> Self {
        self.search_queries = Some(queries);
        self
    }

    fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            search_queries: None,
            results: None,
            is_searching: false,
        }
    }
}

/// A single role-tagged chat turn sent to the LLM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Search request
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// Search response
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub results: Vec<SearchResult>,
}

/// Body returned with status 500 when the search proxy fails
#[derive(Debug, Clone, Serialize)]
pub struct SearchFailure {
    pub success: bool,
    pub error: String,
    pub details: String,
}

/// Chat request
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// Chat response
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub message: String,
}

/// Start-session request
#[derive(Debug, Clone, Deserialize)]
pub struct StartSessionRequest {
    pub query: String,
}

/// Refine request
#[derive(Debug, Clone, Deserialize)]
pub struct RefineRequest {
    pub refinement: String,
}

/// Selection toggle request, keyed by result title
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionRequest {
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kind_serializes_lowercase() {
        let json = serde_json::to_value(MessageKind::Result).unwrap();
        assert_eq!(json, "result");
    }

    #[test]
    fn test_message_uses_camel_case_and_skips_empty_fields() {
        let msg = Message::placeholder("Searching...").with_queries(vec![SearchQuery {
            query: "solid state battery".into(),
            explanation: "Direct match".into(),
        }]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "system");
        assert_eq!(json["isSearching"], true);
        assert_eq!(json["searchQueries"][0]["query"], "solid state battery");
        assert!(json.get("results").is_none());

        let plain = serde_json::to_value(Message::user("hi")).unwrap();
        assert!(plain.get("isSearching").is_none());
        assert!(plain.get("searchQueries").is_none());
    }

    #[test]
    fn test_search_result_tolerates_missing_metadata() {
        let result: SearchResult =
            serde_json::from_str(r#"{"title": "Graphene Anode", "score": 0.8}"#).unwrap();
        assert_eq!(result.title, "Graphene Anode");
        assert!(result.university.is_empty());
        assert!(result.llm_teaser.is_none());
    }

    #[test]
    fn test_teaser_prefers_llm_teaser_then_summary_then_description() {
        let mut result = SearchResult {
            description: "raw".into(),
            ..Default::default()
        };
        assert_eq!(result.teaser(), "raw");

        result.llm_summary = Some("summary".into());
        assert_eq!(result.teaser(), "summary");

        result.llm_teaser = Some("   ".into());
        assert_eq!(result.teaser(), "summary");

        result.llm_teaser = Some("teaser".into());
        assert_eq!(result.teaser(), "teaser");
    }
}
