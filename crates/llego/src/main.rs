use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use llego_common::{logger, AppConfig};
use llego_vector::{BulkVectorizer, EntityKind, JobStatus};
use std::path::PathBuf;
use std::sync::Arc;

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    match find_project_root().map(|root| root.join(".env")) {
        Some(env_path) if env_path.exists() => {
            dotenv::from_path(&env_path).ok();
        }
        _ => {
            dotenv::dotenv().ok();
        }
    }
}

#[derive(Parser)]
#[command(name = "llego")]
#[command(about = "Llego - marketplace backend with semantic product and branch search", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,
    },

    /// Embed every record of an entity into its vector collection
    Vectorize {
        /// products or branches
        entity: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    load_dotenv_from_project_root();

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            // CLI arguments override the environment
            if let Some(host) = &host {
                std::env::set_var("SERVER_HOST", host);
            }
            if let Some(port) = port {
                std::env::set_var("SERVER_PORT", port.to_string());
            }
            serve().await?;
        }
        Some(Commands::Vectorize { entity }) => {
            let kind: EntityKind = entity.parse()?;
            vectorize(kind).await?;
        }
        None => serve().await?,
    }

    Ok(())
}

async fn serve() -> Result<()> {
    let config = AppConfig::from_env()?;
    logger::setup_logging(&config.log_dir, &config.log_level)?;

    tracing::info!("Llego starting...");
    tracing::info!("  Bind: {}", config.server_bind_address());
    tracing::info!("  Database: {}", config.mongodb_database);
    tracing::info!("  Vector backend: {}", config.vector_backend);
    tracing::info!("  Embedding model: {}", config.gemini_model);

    llego_server::start_server(config).await?;
    Ok(())
}

async fn vectorize(kind: EntityKind) -> Result<()> {
    let config = AppConfig::from_env()?;
    logger::setup_console_logging(&config.log_level)?;

    let mongo = llego_server::connect_store(&config).await?;
    let vectorizer = BulkVectorizer::new(
        llego_server::build_embedder(&config)?,
        llego_server::build_vector_index(&config)?,
        Arc::new(mongo.clone()),
    );

    let result = vectorizer.vectorize(kind).await;
    mongo.shutdown().await;

    let report = result?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.status == JobStatus::Failed {
        bail!("Vectorization of {} failed", kind);
    }
    Ok(())
}
