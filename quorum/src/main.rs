use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quorum::api::{create_router, AppState};
use quorum::config::Config;
use quorum::embeddings::EmbeddingProvider;
use quorum::llm::LlmProvider;
use quorum::pipeline::{Collaborators, PipelineSettings, QaPipeline};
use quorum::sources::{HttpSummaryIndex, HttpTranscriptStore};

#[derive(Parser)]
#[command(name = "quorum")]
#[command(about = "Grounded question answering over meeting transcripts")]
struct Args {
    /// Override QUORUM_HOST
    #[arg(long)]
    host: Option<String>,

    /// Override QUORUM_PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    let mut config = Config::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quorum=info,tower_http=debug".into());
    if config.server.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Initializing embedding provider: {}...", config.embeddings.model);
    let embeddings = EmbeddingProvider::new(&config.embeddings)?;

    if let Some(llm_config) = &config.llm {
        tracing::info!("Initializing LLM provider: {}...", llm_config.model);
    }
    let llm = LlmProvider::new(config.llm.as_ref());
    if !llm.is_available() {
        tracing::warn!("LLM unavailable - questions with retrievable context will fail");
    }

    let summaries = HttpSummaryIndex::new(&config.sources)?;
    let transcripts = HttpTranscriptStore::new(&config.sources)?;
    tracing::info!(
        summary_index = %config.sources.summary_index_url,
        transcript_api = %config.sources.transcript_api_url,
        "Sources configured"
    );

    let pipeline = QaPipeline::new(
        Collaborators {
            embedder: Arc::new(embeddings),
            completer: Arc::new(llm.clone()),
            transcripts: Arc::new(transcripts),
            summaries: Arc::new(summaries),
        },
        PipelineSettings::from_config(&config),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, llm, pipeline);
    let app = create_router(state);

    tracing::info!("Quorum starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  Ask:          POST http://{}/api/v1/ask", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
