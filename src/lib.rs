pub mod config;
pub mod error;
pub mod model;
pub mod providers;
pub mod search;
pub mod server;
pub mod suggest;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use config::AppConfig;
use model::{ImagePayload, SearchQuery, SearchRange};
use providers::SpotCatalog;
use providers::catalog_fs::FsCatalog;
use providers::gateway::RemoteModelGateway;
use providers::offline::{ByteHistogramImageEmbedder, FnvTextEmbedder, UnavailableGenerator};
use search::pipeline::{Providers, SearchPipeline};
use server::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "spotsearch",
    version,
    about = "Multimodal spot search: text and image queries ranked by weighted similarity fusion"
)]
pub struct Cli {
    /// Path to a TOML config file (defaults + SPOTSEARCH_* env otherwise)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Use the deterministic offline embedders instead of the model gateway
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Override the bind address (host:port)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Run one search and print the ranked results as JSON
    Search {
        /// Query text
        #[arg(long)]
        text: Option<String>,

        /// Path to a query image
        #[arg(long)]
        image: Option<PathBuf>,

        /// Text/image mix in [0, 100]: 0 text-only, 100 image-only
        #[arg(long, default_value_t = 50)]
        range: i64,

        /// Print top-N slices at the fixed comparison weights instead
        #[arg(long)]
        compare: bool,

        /// Entries per slice with --compare
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Print random query-image suggestions as JSON
    Suggest {
        /// How many ids to print (defaults to the configured count)
        #[arg(long)]
        count: Option<usize>,
    },
    /// Generate shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate man page to stdout
    Man,
}

pub async fn run() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = AppConfig::resolve(cli.config.as_deref())?;
    if cli.offline {
        config.offline = true;
    }

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            run_serve(config).await
        }
        Commands::Search {
            text,
            image,
            range,
            compare,
            top,
        } => run_search(config, text, image, range, compare, top).await,
        Commands::Suggest { count } => run_suggest(config, count).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "spotsearch", &mut std::io::stdout());
            Ok(())
        }
        Commands::Man => {
            let cmd = Cli::command();
            let man = clap_mangen::Man::new(cmd);
            let mut out = std::io::stdout();
            man.render(&mut out)?;
            Ok(())
        }
    }
}

/// Quiet by default for dependencies; `RUST_LOG` overrides everything.
fn init_tracing() {
    // Logs go to stderr; stdout is reserved for command output so that
    // `search`/`suggest` stay pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("spot_search=info,tower_http=warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Wires the configured provider set: the file-backed catalog always, plus
/// either the remote gateway or the offline embedders.
fn build_providers(config: &AppConfig) -> Result<Providers> {
    let catalog: Arc<dyn SpotCatalog> =
        Arc::new(FsCatalog::new(&config.catalog_path, &config.features_dir));

    if config.offline {
        info!("offline mode: deterministic embedders, no generators");
        return Ok(Providers {
            text_embedder: Arc::new(FnvTextEmbedder::default()),
            image_embedder: Arc::new(ByteHistogramImageEmbedder::default()),
            captioner: Arc::new(UnavailableGenerator),
            synthesizer: Arc::new(UnavailableGenerator),
            catalog,
        });
    }

    let gateway = Arc::new(RemoteModelGateway::new(&config.gateway)?);
    Ok(Providers {
        text_embedder: gateway.clone(),
        image_embedder: gateway.clone(),
        captioner: gateway.clone(),
        synthesizer: gateway,
        catalog,
    })
}

async fn run_serve(config: AppConfig) -> Result<()> {
    let providers = build_providers(&config)?;
    let state = Arc::new(AppState::new(providers, config.suggestion_count));
    info!(
        offline = config.offline,
        catalog = %config.catalog_path.display(),
        "spotsearch starting"
    );
    server::run_server(state, config.bind_addr)
        .await
        .context("HTTP server failed")
}

async fn run_search(
    config: AppConfig,
    text: Option<String>,
    image: Option<PathBuf>,
    range: i64,
    compare: bool,
    top: usize,
) -> Result<()> {
    let range = SearchRange::new(range)?;
    let image = match image {
        Some(path) => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading query image {}", path.display()))?;
            Some(ImagePayload::new(bytes))
        }
        None => None,
    };
    let query = SearchQuery::new(text, image, range);

    let pipeline = SearchPipeline::new(build_providers(&config)?);
    if compare {
        let slices = pipeline.search_comparison(&query, top).await?;
        println!("{}", serde_json::to_string_pretty(&slices)?);
    } else {
        let outcome = pipeline.search(&query).await?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }
    Ok(())
}

async fn run_suggest(config: AppConfig, count: Option<usize>) -> Result<()> {
    let catalog = FsCatalog::new(&config.catalog_path, &config.features_dir);
    let ids =
        suggest::suggest_query_images(&catalog, count.unwrap_or(config.suggestion_count)).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({ "suggested_images": ids }))?
    );
    Ok(())
}
