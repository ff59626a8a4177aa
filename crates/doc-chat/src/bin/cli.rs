//! `doc-chat` command line
//!
//! ```bash
//! # Start the server
//! doc-chat serve --config config.toml
//!
//! # Initialize a document and chat from stdin
//! doc-chat ask --file report.pdf
//!
//! # One-shot question about a web page
//! doc-chat ask --url https://example.com/article -q "What is the main claim?"
//! ```

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use doc_chat::{
    config::ChatConfig, server::DocChatServer, types::ChatRequest, ChatClient, Conversation,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Chat with a PDF, Word document, spreadsheet or web page
#[derive(Parser)]
#[command(name = "doc-chat", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Configuration file (TOML)
        #[arg(long, short, env = "DOC_CHAT_CONFIG")]
        config: Option<PathBuf>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Initialize a document on a running server, then ask questions.
    ///
    /// Questions are read from stdin, one per line, unless given with -q.
    Ask(AskArgs),

    /// Show the active document of a running server
    Status {
        /// Server URL
        #[arg(long, default_value = "http://127.0.0.1:8000", env = "DOC_CHAT_SERVER")]
        server: String,
    },
}

#[derive(Args)]
struct AskArgs {
    /// Server URL
    #[arg(long, default_value = "http://127.0.0.1:8000", env = "DOC_CHAT_SERVER")]
    server: String,

    /// File to upload
    #[arg(long, conflicts_with = "url")]
    file: Option<PathBuf>,

    /// Web page to fetch instead of a file
    #[arg(long)]
    url: Option<String>,

    /// Chunk size in characters
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Characters shared by consecutive chunks
    #[arg(long)]
    chunk_overlap: Option<usize>,

    /// Question(s) to ask instead of reading stdin
    #[arg(long = "question", short = 'q')]
    questions: Vec<String>,

    /// Print the retrieved chunks after each answer
    #[arg(long)]
    sources: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.command {
        Commands::Serve { .. } => "doc_chat=info,tower_http=debug",
        _ => "doc_chat=warn",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Serve { config, host, port } => {
            let mut config = ChatConfig::load(config.as_deref())?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let server = DocChatServer::new(config)?;
            println!("Serving on http://{}", server.address());
            server.start().await?;
        }
        Commands::Ask(args) => ask(args).await?,
        Commands::Status { server } => {
            let client = ChatClient::new(server)?;
            match client.session().await? {
                Some(summary) => println!("{}", serde_json::to_string_pretty(&summary)?),
                None => println!("No document initialized on {}", client.base_url()),
            }
        }
    }

    Ok(())
}

async fn ask(args: AskArgs) -> anyhow::Result<()> {
    let client = ChatClient::new(&args.server)?;

    match (&args.file, &args.url) {
        (Some(path), _) => {
            client
                .initialize_file(path, args.chunk_size, args.chunk_overlap)
                .await
                .with_context(|| format!("initializing {}", path.display()))?;
            eprintln!("Initialized {}", path.display());
        }
        (None, Some(url)) => {
            client
                .initialize_url(url, args.chunk_size, args.chunk_overlap)
                .await
                .with_context(|| format!("initializing {}", url))?;
            eprintln!("Initialized {}", url);
        }
        (None, None) => {
            if client.session().await?.is_none() {
                anyhow::bail!("no document on the server; pass --file or --url");
            }
        }
    }

    let mut conversation = Conversation::new();

    if !args.questions.is_empty() {
        for question in &args.questions {
            ask_one(&client, &mut conversation, question, args.sources).await;
        }
        return Ok(());
    }

    let stdin = std::io::stdin();
    prompt()?;
    for line in stdin.lock().lines() {
        let line = line?;
        if !line.trim().is_empty() {
            ask_one(&client, &mut conversation, &line, args.sources).await;
        }
        prompt()?;
    }

    Ok(())
}

/// Ask one question; failures are reported and leave the history untouched
async fn ask_one(client: &ChatClient, conversation: &mut Conversation, question: &str, sources: bool) {
    let result = conversation
        .ask(question, |question| async move {
            let response = client
                .chat_with(&ChatRequest {
                    question,
                    include_sources: sources,
                })
                .await?;
            if let Some(sources) = &response.sources {
                for source in sources {
                    eprintln!(
                        "  [{:.3}] chunk {}: {}",
                        source.score,
                        source.chunk.index,
                        source.chunk.text.chars().take(80).collect::<String>().replace('\n', " ")
                    );
                }
            }
            Ok(response.response)
        })
        .await;

    match result {
        Ok(answer) => println!("{}\n", answer),
        Err(e) => eprintln!("error: {}\n", e),
    }
}

fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}
