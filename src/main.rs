use tracing_subscriber::EnvFilter;

use incepta::api;
use incepta::config::Config;
use incepta::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);
    tracing::info!(
        "Vector index: {} (namespace '{}', top {})",
        config.pinecone.index_host.as_deref().unwrap_or("<unset>"),
        config.pinecone.namespace,
        config.pinecone.top_k
    );
    if config.pinecone.api_key.is_none() || config.pinecone.index_host.is_none() {
        tracing::warn!("PINECONE_API_KEY or PINECONE_HOSTNAME not set; searches will fail");
    }

    let state = AppState::new(config.clone())?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
