//! EVM Indexer CLI.
//!
//! Entry point for the indexer binary. Provides subcommands for:
//! - `run` - Start the Supervisor and control-plane API
//! - `migrate` - Run database migrations
//! - `version` - Show version information

use std::collections::HashMap;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use evm_indexer::api::{self, AppState};
use evm_indexer::bus::EventBus;
use evm_indexer::config::Settings;
use evm_indexer::indexer::Supervisor;
use evm_indexer::ports::LogPublisher;
use evm_indexer::store::{MemoryAbiCache, PostgresStore};
use evm_indexer::streaming::IggyPublisher;
use evm_indexer::{metrics, VERSION};

/// EVM Indexer
#[derive(Parser, Debug)]
#[command(name = "evm-indexer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the Supervisor and control-plane API server
    Run,
    /// Run pending database migrations
    Migrate,
    /// Show version information
    Version,
}

fn init_tracing(settings: &evm_indexer::config::LoggingSettings) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn build_pool(database: &evm_indexer::config::DatabaseSettings) -> eyre::Result<sqlx::PgPool> {
    PgPoolOptions::new()
        .max_connections(database.max_connections)
        .min_connections(database.min_connections)
        .acquire_timeout(database.connect_timeout())
        .idle_timeout(database.idle_timeout())
        .connect(&database.url)
        .await
        .map_err(Into::into)
}

/// Connect one RPC client per registered blockchain, keyed by `Blockchain::id`.
///
/// A blockchain whose RPC endpoint can't be reached is logged and skipped;
/// the Supervisor simply never spawns sources on it, rather than failing
/// the whole process over one bad endpoint.
async fn connect_rpc_clients(
    store: &PostgresStore,
) -> eyre::Result<HashMap<Uuid, Arc<dyn rpc_client::RpcClient>>> {
    use evm_indexer::ports::ControlPlaneStore;

    let blockchains = store.list_blockchains().await?;
    let mut clients = HashMap::with_capacity(blockchains.len());
    for blockchain in blockchains {
        match rpc_client::JsonRpcClient::new(blockchain.rpc_url.clone()).await {
            Ok(client) => {
                clients.insert(blockchain.id, Arc::new(client) as Arc<dyn rpc_client::RpcClient>);
            }
            Err(err) => {
                error!(blockchain_id = %blockchain.id, rpc_url = %blockchain.rpc_url, error = %err, "failed to connect RPC client, skipping blockchain");
            }
        }
    }
    Ok(clients)
}

async fn run(settings: Settings) -> eyre::Result<()> {
    let pool = build_pool(&settings.database).await?;
    let store = Arc::new(PostgresStore::new(pool));
    store.run_migrations().await?;

    let abi_cache = Arc::new(MemoryAbiCache::new(&settings.cache));
    let bus = EventBus::new();

    if let Err(err) = metrics::install(&settings.metrics) {
        warn!(error = %err, "failed to install metrics exporter");
    }

    let publisher = IggyPublisher::new(&settings.iggy)?;
    publisher.connect().await?;
    let publisher: Arc<dyn LogPublisher> = Arc::new(publisher);

    let rpc_clients = connect_rpc_clients(&store).await?;
    let shutdown = CancellationToken::new();

    let supervisor = Supervisor::new(
        store.clone(),
        store.clone(),
        store.clone(),
        abi_cache,
        publisher,
        rpc_clients,
        bus.clone(),
        shutdown.clone(),
    );
    let supervisor_handle = tokio::spawn(supervisor.run());

    let state = AppState {
        control_store: store.clone(),
        source_store: store.clone(),
        index_store: store,
        bus,
    };
    let app = api::router(state);

    let addr = settings.api.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr.clone()).await?;
    info!(%addr, instance_id = %settings.instance_id, "control-plane API listening");

    let api_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            api_shutdown.cancel();
        })
        .await?;

    shutdown.cancel();
    match supervisor_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => error!(error = %err, "supervisor exited with an error"),
        Err(err) => error!(error = %err, "supervisor task panicked"),
    }
    Ok(())
}

async fn migrate(settings: Settings) -> eyre::Result<()> {
    let pool = build_pool(&settings.database).await?;
    let store = PostgresStore::new(pool);
    store.run_migrations().await?;
    info!("migrations applied");
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::load()?;
    init_tracing(&settings.logging);

    if let Err(errors) = settings.validate() {
        for error in &errors {
            error!(%error, "invalid configuration");
        }
        eyre::bail!("configuration validation failed: {} error(s)", errors.len());
    }

    info!(version = VERSION, instance_id = %settings.instance_id, "starting evm-indexer");

    match cli.command {
        Commands::Run => run(settings).await,
        Commands::Migrate => migrate(settings).await,
        Commands::Version => {
            println!("evm-indexer {VERSION}");
            Ok(())
        }
    }
}
