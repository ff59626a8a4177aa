//! Document chat server binary
//!
//! Run with: cargo run -p doc-chat --bin doc-chat-server -- --config config.toml

use clap::Parser;
use doc_chat::{config::ChatConfig, server::DocChatServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Serve the document chat HTTP API
#[derive(Parser)]
#[command(name = "doc-chat-server", version, about)]
struct Args {
    /// Configuration file (TOML); defaults to <config dir>/doc-chat/config.toml if present
    #[arg(long, short, env = "DOC_CHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long, short)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_chat=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = ChatConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embeddings: {:?}", config.embeddings.backend);
    tracing::info!("  - LLM: {:?}", config.llm.backend);
    tracing::info!(
        "  - Chunking: {} / {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - Top k: {}", config.retrieval.top_k);

    let server = DocChatServer::new(config)?;

    let providers = server.state().providers();
    if !providers.llm.health_check().await.unwrap_or(false) {
        tracing::warn!(
            "Generative model '{}' ({}) is not reachable; chat requests will fail until it is",
            providers.llm.model(),
            providers.llm.name()
        );
    }
    if !providers.embedder.health_check().await.unwrap_or(false) {
        tracing::warn!(
            "Embedding backend '{}' is not reachable; initialization will fail until it is",
            providers.embedder.name()
        );
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  Info: http://{}/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /initialize - Upload a document or submit a web_url");
    println!("  POST /chat       - Ask a question");
    println!("  GET  /session    - Active document");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
