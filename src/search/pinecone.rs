use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::PineconeConfig;
use crate::models::SearchResult;
use crate::search::SearchBackend;

/// Search proxy over Pinecone: embed the query text, then query one index
/// namespace for its nearest neighbours.
pub struct PineconeSearch {
    client: reqwest::Client,
    config: PineconeConfig,
}

impl PineconeSearch {
    pub fn new(client: reqwest::Client, config: PineconeConfig) -> Self {
        Self { client, config }
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .context("PINECONE_API_KEY is not set")
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embed", self.config.embed_url);
        let req = EmbedRequest {
            model: &self.config.embed_model,
            parameters: EmbedParameters {
                input_type: "passage",
                truncate: "END",
            },
            inputs: vec![EmbedInput { text }],
        };

        tracing::debug!("Fetching embedding for query");
        let resp = self
            .client
            .post(&url)
            .header("Api-Key", self.api_key()?)
            .header("X-Pinecone-API-Version", &self.config.api_version)
            .json(&req)
            .send()
            .await
            .context("Failed to call Pinecone embed API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Embedding API error ({status}): {body}");
        }

        let body: EmbedResponse = resp
            .json()
            .await
            .context("Failed to parse Pinecone embed response")?;

        body.data
            .into_iter()
            .next()
            .map(|d| d.values)
            .context("No embedding returned")
    }

    async fn query(&self, vector: Vec<f32>) -> Result<Vec<SearchResult>> {
        let host = self
            .config
            .index_host
            .as_deref()
            .context("PINECONE_HOSTNAME is not set")?;
        let url = index_query_url(host);

        let req = QueryRequest {
            namespace: &self.config.namespace,
            vector,
            top_k: self.config.top_k,
            include_values: false,
            include_metadata: true,
        };

        tracing::debug!("Querying namespace '{}'", self.config.namespace);
        let resp = self
            .client
            .post(&url)
            .header("Api-Key", self.api_key()?)
            .json(&req)
            .send()
            .await
            .context("Failed to call Pinecone query API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Pinecone search error ({status}): {body}");
        }

        let body: QueryResponse = resp
            .json()
            .await
            .context("Failed to parse Pinecone query response")?;

        Ok(body.matches.into_iter().map(Match::into_result).collect())
    }
}

#[async_trait]
impl SearchBackend for PineconeSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let vector = self.embed(query).await?;
        let results = self.query(vector).await?;
        tracing::info!("Search for '{query}' returned {} matches", results.len());
        Ok(results)
    }
}

fn index_query_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{host}/query")
    } else {
        format!("https://{host}/query")
    }
}

// ─── Wire types ──────────────────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    parameters: EmbedParameters,
    inputs: Vec<EmbedInput<'a>>,
}

#[derive(Serialize)]
struct EmbedParameters {
    input_type: &'static str,
    truncate: &'static str,
}

#[derive(Serialize)]
struct EmbedInput<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    values: Vec<f32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    namespace: &'a str,
    vector: Vec<f32>,
    top_k: usize,
    include_values: bool,
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Deserialize)]
struct Match {
    #[serde(default)]
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<SearchResult>,
}

impl Match {
    fn into_result(self) -> SearchResult {
        let mut result = self.metadata.unwrap_or_default();
        if result.id.is_empty() {
            result.id = self.id;
        }
        result.score = self.score;
        result
    }
}
