use std::sync::Arc;

use crate::config::Config;
use crate::llm::{ChatBackend, HttpChatBackend};
use crate::pipeline::{Pipeline, SessionStore};
use crate::recent::RecentSearches;
use crate::search::pinecone::PineconeSearch;
use crate::search::SearchBackend;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub chat: Arc<dyn ChatBackend>,
    pub search: Arc<dyn SearchBackend>,
    pub pipeline: Pipeline,
    pub sessions: Arc<SessionStore>,
    pub recent: Arc<RecentSearches>,
}

impl AppState {
    /// State wired to the hosted LLM and Pinecone services.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        let chat = Arc::new(HttpChatBackend::new(http_client.clone(), config.llm.clone()));
        let search = Arc::new(PineconeSearch::new(http_client, config.pinecone.clone()));
        Self::with_backends(config, chat, search)
    }

    pub fn with_backends(
        config: Config,
        chat: Arc<dyn ChatBackend>,
        search: Arc<dyn SearchBackend>,
    ) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let recent = RecentSearches::open_or_create(&config.recent_searches_path())?;
        let pipeline = Pipeline::new(chat.clone(), search.clone(), config.pacing);

        Ok(Self {
            sessions: Arc::new(SessionStore::new(config.max_sessions)),
            recent: Arc::new(recent),
            config,
            chat,
            search,
            pipeline,
        })
    }
}
