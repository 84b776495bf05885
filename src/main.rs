use anyhow::{anyhow, Context, Result};
use bhai_ki_advice_lib::advice::AdviceHandler;
use bhai_ki_advice_lib::client::HttpAdviceClient;
use bhai_ki_advice_lib::config::AppConfig;
use bhai_ki_advice_lib::feed::{FeedStore, FileFeedStore, RemoteFeedStore};
use bhai_ki_advice_lib::file_storage::get_global_data_dir;
use bhai_ki_advice_lib::generation::{GeminiClient, TextGenerator};
use bhai_ki_advice_lib::ledger::{FileLocalStorage, VoteDedupLedger};
use bhai_ki_advice_lib::server::{self, ServerAppState};
use bhai_ki_advice_lib::shutdown::{register_signal_handlers, ShutdownState};
use bhai_ki_advice_lib::view::{render_feed, FeedController};
use bhai_ki_advice_lib::FeedOrder;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

/// Bhai Ki Advice - ask Bhai, get advice, vote on the best
#[derive(Parser, Debug)]
#[command(name = "bhai-ki-advice")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Data directory (default: ~/.bhai-ki-advice)
    #[arg(long, global = true, env = "BHAI_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP/WebSocket server
    Serve(ServeArgs),
    /// Ask Bhai for advice and post it to the feed
    Ask {
        /// Your problem
        problem: String,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Show the advice feed
    Feed {
        /// latest or popular
        #[arg(long, default_value = "latest")]
        order: FeedOrder,
        /// Keep printing the feed as it changes
        #[arg(long)]
        watch: bool,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Up-vote an advice (once per device)
    Vote {
        /// Advice id
        id: String,
        #[command(flatten)]
        remote: RemoteArgs,
    },
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Gemini API key
    #[arg(long, env = "GOOGLE_AI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Config file (default: ~/.bhai-ki-advice/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to bind the server to
    #[arg(long)]
    port: Option<u16>,

    /// Address to bind the server to
    #[arg(long)]
    bind: Option<String>,

    /// Allowed CORS origin (repeatable; default allows any)
    #[arg(long = "cors-origin")]
    cors_origins: Vec<String>,
}

#[derive(Args, Debug)]
struct RemoteArgs {
    /// Advice server URL
    #[arg(long, env = "BHAI_SERVER_URL", default_value = "http://localhost:3420")]
    server: String,
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(run(cli)) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve(args) => serve(args, cli.data_dir).await,
        Command::Ask { problem, remote } => {
            let mut view = controller(&remote.server, cli.data_dir)?;
            let submitted = view
                .submit(&problem)
                .await
                .map_err(|notice| anyhow!("{}", notice))?;
            println!("Bhai's Advice: {}", submitted.advice);
            println!("(id {})", submitted.id);
            Ok(())
        }
        Command::Feed {
            order,
            watch,
            remote,
        } => {
            let store = RemoteFeedStore::new(remote.server);
            if !watch {
                println!("{}", render_feed(&store.list(order).await?));
                return Ok(());
            }

            let mut subscription = store.subscribe(order).await?;
            while let Some(advices) = subscription.next().await {
                println!("── {} ──", order);
                println!("{}\n", render_feed(&advices));
            }
            log::info!("Feed connection closed");
            Ok(())
        }
        Command::Vote { id, remote } => {
            let mut view = controller(&remote.server, cli.data_dir)?;
            view.vote(&id)
                .await
                .map_err(|notice| anyhow!("{}", notice))?;
            println!("👍 Vote counted");
            Ok(())
        }
    }
}

fn controller(server_url: &str, data_dir: Option<PathBuf>) -> Result<FeedController> {
    let data_dir = data_dir.unwrap_or_else(get_global_data_dir);
    let ledger = VoteDedupLedger::load(Box::new(FileLocalStorage::new(&data_dir)))
        .map_err(|e| anyhow!("Failed to load vote ledger: {}", e))?;

    Ok(FeedController::new(
        Arc::new(HttpAdviceClient::new(server_url)),
        Arc::new(RemoteFeedStore::new(server_url)),
        ledger,
    ))
}

async fn serve(args: ServeArgs, data_dir: Option<PathBuf>) -> Result<()> {
    let config_path = args.config.unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load(&config_path)?;

    // CLI flags override the config file
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if !args.cors_origins.is_empty() {
        config.server.cors_origins = args.cors_origins;
    }
    if data_dir.is_some() {
        config.storage.data_dir = data_dir;
    }

    let settings = config.gemini_settings(args.api_key)?;
    let generator = GeminiClient::new(settings);
    generator
        .check_ready()
        .map_err(|e| anyhow!("Invalid Gemini configuration: {}", e))?;
    log::info!("Using model {}", generator.model());

    let data_dir = config.data_dir();
    let feed = FileFeedStore::open(&data_dir)
        .with_context(|| format!("Failed to open feed in {}", data_dir.display()))?;
    log::info!("Loaded {} advices from {}", feed.len(), data_dir.display());

    let shutdown_state = ShutdownState::new();
    if let Err(e) = register_signal_handlers(shutdown_state.clone()) {
        log::warn!("Failed to register signal handlers: {}", e);
    }

    let state = ServerAppState::new(
        AdviceHandler::new(Arc::new(generator)),
        Arc::new(feed),
        shutdown_state,
    );

    server::run_server(
        config.server.port,
        &config.server.bind,
        state,
        &config.server.cors_origins,
    )
    .await
    .map_err(|e| anyhow!(e))
}
