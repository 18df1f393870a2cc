use ahash::AHashMap;
use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use lookbook_api::RestApi;
use lookbook_core::{Category, Distance, PersonaCatalog};
use lookbook_engine::{
    parse_descriptions, Embedder, HashingEmbedder, IndexBuilder, Justifier, LookbookService,
    OpenAiConfig, OpenAiEmbedder, OpenAiJustifier, ServiceConfig, TemplateJustifier,
    DEFAULT_API_BASE, DEFAULT_EMBEDDING_DIM, DEFAULT_RESULT_CAP,
};
use lookbook_storage::{persistence, spawn_session_reaper, write_category_index, IndexStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Step-by-step outfit recommendation server
#[derive(Parser, Debug)]
#[command(name = "lookbook", version)]
#[command(about = "Session-driven outfit recommendations over per-category embedding indices", long_about = None)]
struct Cli {
    /// Log level
    #[arg(long, global = true, default_value = "info", env = "LOOKBOOK_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Embed crawled items and write one category index
    BuildIndex(BuildIndexArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EmbedderKind {
    Hashing,
    Openai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum JustifierKind {
    Template,
    Openai,
}

#[derive(Args, Debug)]
struct EmbeddingArgs {
    /// Embedding backend
    #[arg(long, value_enum, default_value_t = EmbedderKind::Hashing, env = "LOOKBOOK_EMBEDDER")]
    embedder: EmbedderKind,

    /// Dimension of the hashing embedder
    #[arg(long, default_value_t = DEFAULT_EMBEDDING_DIM)]
    embedding_dim: usize,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, default_value = DEFAULT_API_BASE, env = "OPENAI_API_BASE")]
    api_base: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, default_value = "text-embedding-3-small")]
    embedding_model: String,
}

impl EmbeddingArgs {
    fn openai(&self, model: &str) -> OpenAiConfig {
        OpenAiConfig::new(model)
            .with_api_base(self.api_base.clone())
            .with_api_key(self.api_key.clone())
    }

    fn build(&self) -> anyhow::Result<Arc<dyn Embedder>> {
        Ok(match self.embedder {
            EmbedderKind::Hashing => Arc::new(HashingEmbedder::new(self.embedding_dim)?),
            EmbedderKind::Openai => {
                Arc::new(OpenAiEmbedder::new(self.openai(&self.embedding_model))?)
            }
        })
    }
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Directory holding one index directory per category
    #[arg(short, long, default_value = "./data", env = "LOOKBOOK_DATA_DIR")]
    data_dir: PathBuf,

    /// HTTP API port
    #[arg(long, default_value_t = 8000, env = "LOOKBOOK_HTTP_PORT")]
    http_port: u16,

    /// Items returned per recommendation
    #[arg(long, default_value_t = DEFAULT_RESULT_CAP)]
    result_cap: usize,

    /// Persona catalog JSON file; the builtin presets are used when absent
    #[arg(long)]
    personas: Option<PathBuf>,

    /// Sessions older than this are evicted; 0 keeps them forever
    #[arg(long, default_value_t = 24 * 60 * 60)]
    session_ttl_secs: u64,

    #[arg(long, default_value_t = 300)]
    reap_interval_secs: u64,

    #[command(flatten)]
    embedding: EmbeddingArgs,

    /// Recommendation reason generator
    #[arg(long, value_enum, default_value_t = JustifierKind::Template)]
    justifier: JustifierKind,

    #[arg(long, default_value = "gpt-4o-mini")]
    chat_model: String,

    /// Load every category index before accepting requests
    #[arg(long)]
    preload: bool,
}

#[derive(Args, Debug)]
struct BuildIndexArgs {
    #[arg(short, long, default_value = "./data", env = "LOOKBOOK_DATA_DIR")]
    data_dir: PathBuf,

    /// Category tag (top, bottom, outerwear, bag, shoes) or its Korean name
    #[arg(long)]
    category: Category,

    /// Crawled items as JSON lines
    #[arg(long)]
    items: PathBuf,

    /// Generated descriptions as JSON lines of {product_id, description}
    #[arg(long)]
    descriptions: Option<PathBuf>,

    #[arg(long, default_value = "cosine")]
    distance: Distance,

    #[command(flatten)]
    embedding: EmbeddingArgs,
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let log_level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Command::Serve(args) => serve(args),
        Command::BuildIndex(args) => build_index(args),
    }
}

fn serve(args: ServeArgs) -> anyhow::Result<()> {
    info!("Starting Lookbook v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", args.data_dir);
    info!("HTTP API port: {}", args.http_port);

    let indices = Arc::new(IndexStore::open(&args.data_dir));
    if args.preload {
        let available = indices.preload();
        info!("{}/{} category indices loaded", available, Category::ALL.len());
    }

    let personas = match &args.personas {
        Some(path) => PersonaCatalog::from_json_file(path)
            .with_context(|| format!("loading personas from {:?}", path))?,
        None => PersonaCatalog::builtin(),
    };
    info!("{} personas available", personas.len());

    let justifier: Arc<dyn Justifier> = match args.justifier {
        JustifierKind::Template => Arc::new(TemplateJustifier::default()),
        JustifierKind::Openai => {
            Arc::new(OpenAiJustifier::new(args.embedding.openai(&args.chat_model))?)
        }
    };

    let service = Arc::new(
        LookbookService::new(
            ServiceConfig {
                result_cap: args.result_cap,
            },
            indices,
        )
        .with_personas(personas)
        .with_embedder(args.embedding.build()?)
        .with_justifier(justifier),
    );
    if args.preload {
        service
            .check_indices()
            .context("loaded indices do not match the configured embedder")?;
    }

    if args.session_ttl_secs > 0 {
        spawn_session_reaper(
            service.sessions().clone(),
            Duration::from_secs(args.session_ttl_secs),
            Duration::from_secs(args.reap_interval_secs.max(1)),
        )?;
    } else {
        warn!("Session eviction disabled");
    }

    let service_http = service.clone();
    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(service_http, http_port).await {
                eprintln!("HTTP server error: {}", e);
            }
        })
    });

    info!("Lookbook started successfully");
    info!("HTTP API: http://localhost:{}/", http_port);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
            }
            _ = tokio::task::spawn_blocking(move || {
                http_handle.join().ok();
            }) => {
                info!("HTTP server stopped");
            }
        }
    });

    info!("Shutting down...");
    runtime.shutdown_background();
    Ok(())
}

fn build_index(args: BuildIndexArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.items)
        .with_context(|| format!("reading items from {:?}", args.items))?;
    let items = persistence::parse_items(&text)
        .with_context(|| format!("parsing items in {:?}", args.items))?;
    info!("{} rows read from {:?}", items.len(), args.items);

    let descriptions = match &args.descriptions {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading descriptions from {:?}", path))?;
            parse_descriptions(&text)?
        }
        None => AHashMap::new(),
    };

    let embedder = args.embedding.build()?;
    let index = IndexBuilder::new(args.category, embedder.as_ref())
        .with_distance(args.distance)
        .build(items, &descriptions)?;

    let manifest = write_category_index(&args.data_dir, &index)?;
    info!(
        "Wrote {} items ({}-dim, {:?}) for {} to {:?}",
        manifest.count,
        manifest.vector_dim,
        manifest.distance,
        args.category,
        persistence::category_dir(&args.data_dir, args.category)
    );
    Ok(())
}
