mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::DocentConfig;
use docent_agent::{LlmClient, Tutor};
use docent_gateway::GatewayServer;
use docent_memory::{
    extract_text, Chunker, DocumentIndex, EmbeddingBackend, EmbeddingProvider, FileVectorStore,
    HttpEmbedding, InMemoryVectorStore, LocalEmbedding, RetrievalEngine, VectorStore,
};
use docent_session::InMemorySessionStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docent", about = "Docent - chat with and get quizzed on your documents")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "docent.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Extract and chunk a PDF or TXT file and print the chunks
    Chunk {
        /// File to split
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let mut config = DocentConfig::load(&cli.config).await?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let tutor = build_tutor(&config).await?;
            info!(
                provider = ?config.model.provider,
                model = %config.model.model_id,
                embedding = ?config.embedding.backend,
                "Starting Docent"
            );
            GatewayServer::serve(tutor, &config.server).await?;
        }
        Commands::Chunk { file } => print_chunks(&config, &file).await?,
    }

    Ok(())
}

async fn build_tutor(config: &DocentConfig) -> anyhow::Result<Arc<Tutor>> {
    let dimension = config.embedding.dimension;
    let embedder: Arc<dyn EmbeddingProvider> = match config.embedding.backend {
        EmbeddingBackend::Local => Arc::new(LocalEmbedding::new(dimension)),
        EmbeddingBackend::Http => Arc::new(HttpEmbedding::from_config(&config.embedding)?),
    };

    let index = if config.index.persist {
        let store = Arc::new(FileVectorStore::open(config.index_dir()).await?);
        if config.index.reset_on_start {
            store.clear().await?;
            info!(path = %store.path().display(), "Persisted index cleared for a clean start");
        }
        DocumentIndex::open(store, dimension).await?
    } else {
        DocumentIndex::new(Arc::new(InMemoryVectorStore::new()), dimension)
    };

    let retrieval = Arc::new(RetrievalEngine::new(
        embedder,
        Arc::new(index),
        Chunker::from_config(&config.chunking),
        config.embedding.timeout(),
    ));

    if config.model.resolved_api_key().is_empty() {
        warn!("No completion API key configured; replies will use fallbacks");
    }
    let llm = Arc::new(LlmClient::new(config.model.clone()));

    Ok(Arc::new(Tutor::new(
        retrieval,
        Arc::new(InMemorySessionStore::new()),
        llm,
        config.retrieval.clone(),
    )))
}

async fn print_chunks(config: &DocentConfig, file: &Path) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read '{}'", file.display()))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let text = extract_text(&file_name, bytes).await?;
    let chunks = Chunker::from_config(&config.chunking).chunk(&text);

    println!("{file_name}: {} chars, {} chunk(s)", text.chars().count(), chunks.len());
    for chunk in &chunks {
        let preview: String = chunk.text.chars().take(60).collect();
        println!(
            "  #{} offset={} chars={}  {}",
            chunk.index,
            chunk.offset,
            chunk.char_len(),
            preview.replace('\n', " ")
        );
    }
    Ok(())
}
