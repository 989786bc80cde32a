use celine::api;
use celine::config::AppConfig;
use celine::embeddings::precompute_embeddings;
use celine::embeddings::EmbeddingService;
use celine::Assistant;
use celine::Result;
use clap::Parser;
use clap::Subcommand;
use tracing::info;

#[derive(Parser)]
#[command(name = "celine")]
#[command(about = "HR FAQ assistant service for Fundação Tiradentes")]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides config)
        #[arg(long)]
        port: Option<u16>,
        /// Disable CORS even when enabled in config
        #[arg(long)]
        no_cors: bool,
    },
    /// Answer a single question from the command line
    Ask {
        /// The question to answer
        question: String,
        /// Context tag carried over from a previous turn
        #[arg(short, long)]
        context: Option<String>,
    },
    /// Embedding maintenance commands
    #[command(subcommand)]
    Embeddings(EmbeddingsCommands),
    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
enum EmbeddingsCommands {
    /// Precompute fact embeddings and write an enriched knowledge file
    Generate {
        /// Input knowledge file (defaults to the configured path)
        #[arg(long)]
        input: Option<String>,
        /// Output file with embeddings filled in
        #[arg(long, default_value = "knowledge_base_com_embeddings.json")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    celine::logging::init_logging_with_config(Some(&config))?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            no_cors,
        } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let enable_cors = config.server.enable_cors && !no_cors;
            api::serve(&config, host, port, enable_cors).await?;
        }
        Commands::Ask { question, context } => {
            let assistant = Assistant::new(&config)?;
            let reply = assistant.answer(&question, context.as_deref(), &[]).await;
            println!("{}", reply.answer);
            if let Some(follow_up) = reply.follow_up {
                println!("{follow_up}");
            }
            if let Some(context) = reply.context {
                info!("Next-turn context: {context}");
            }
        }
        Commands::Embeddings(EmbeddingsCommands::Generate { input, output }) => {
            let input = input.unwrap_or_else(|| config.knowledge_path().to_string());
            let service = EmbeddingService::new(&config)?;
            precompute_embeddings(&service, &input, &output).await?;
            println!("Wrote {output}");
        }
        Commands::Config => {
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| celine::CelineError::Config(e.to_string()))?;
            println!("{rendered}");
        }
    }

    Ok(())
}
