use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the recent-searches list is stored
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Embedding + vector index configuration
    pub pinecone: PineconeConfig,
    /// Minimum step durations for the results page
    pub pacing: PacingConfig,
    /// Maximum number of live result sessions kept in memory
    pub max_sessions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for chat completions
    pub chat_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Sampling temperature sent to OpenAI-compatible APIs
    pub temperature: f32,
}

/// Pinecone inference (embedding) and index query settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PineconeConfig {
    pub api_key: Option<String>,
    /// Index host without scheme, e.g. "my-index-abc123.svc.pinecone.io"
    pub index_host: Option<String>,
    /// Base URL of the inference API
    pub embed_url: String,
    pub embed_model: String,
    pub api_version: String,
    pub namespace: String,
    pub top_k: usize,
}

/// Artificial lower bounds on how long pipeline steps appear to take.
/// Zero disables pacing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PacingConfig {
    pub analysis_min_ms: u64,
    pub search_min_ms: u64,
}

impl PacingConfig {
    pub fn none() -> Self {
        Self {
            analysis_min_ms: 0,
            search_min_ms: 0,
        }
    }

    pub fn analysis_min(&self) -> Duration {
        Duration::from_millis(self.analysis_min_ms)
    }

    pub fn search_min(&self) -> Duration {
        Duration::from_millis(self.search_min_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:9000".to_string(),
            llm: LlmConfig::default(),
            pinecone: PineconeConfig::default(),
            pacing: PacingConfig::default(),
            max_sessions: 1_000,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            api_key: None,
            temperature: 0.3,
        }
    }
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_host: None,
            embed_url: "https://api.pinecone.io".to_string(),
            embed_model: "multilingual-e5-large".to_string(),
            api_version: "2024-10".to_string(),
            namespace: "tech_transfer".to_string(),
            top_k: 20,
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            analysis_min_ms: 1_000,
            search_min_ms: 1_500,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("INCEPTA_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("INCEPTA_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(val) = std::env::var("INCEPTA_MAX_SESSIONS") {
            if let Ok(v) = val.parse::<usize>() {
                config.max_sessions = v.max(1);
            }
        }

        // LLM
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(val) = std::env::var("LLM_TEMPERATURE") {
            if let Ok(v) = val.parse() {
                config.llm.temperature = v;
            }
        }

        // Pinecone
        if let Ok(key) = std::env::var("PINECONE_API_KEY") {
            config.pinecone.api_key = Some(key);
        }
        if let Ok(host) = std::env::var("PINECONE_HOSTNAME") {
            config.pinecone.index_host = Some(host);
        }
        if let Ok(url) = std::env::var("PINECONE_EMBED_URL") {
            config.pinecone.embed_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("PINECONE_EMBED_MODEL") {
            config.pinecone.embed_model = model;
        }
        if let Ok(ns) = std::env::var("PINECONE_NAMESPACE") {
            config.pinecone.namespace = ns;
        }
        if let Ok(val) = std::env::var("PINECONE_TOP_K") {
            if let Ok(v) = val.parse::<usize>() {
                config.pinecone.top_k = v.clamp(1, 100);
            }
        }

        // Pacing
        if let Ok(val) = std::env::var("INCEPTA_ANALYSIS_MIN_MS") {
            if let Ok(v) = val.parse() {
                config.pacing.analysis_min_ms = v;
            }
        }
        if let Ok(val) = std::env::var("INCEPTA_SEARCH_MIN_MS") {
            if let Ok(v) = val.parse() {
                config.pacing.search_min_ms = v;
            }
        }

        config
    }

    pub fn recent_searches_path(&self) -> PathBuf {
        self.data_dir.join("recent_searches.json")
    }
}
