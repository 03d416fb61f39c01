//! TorqueSrv main program
//!
//! Loads the key dictionary, connects the InfluxDB writer and serves the
//! Torque upload route.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use torquesrv::{
    api::create_router, storage::InfluxDbClient, AppState, Config, Dictionary, Result,
    TorqueError,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "TorqueSrv - Torque telemetry ingestion")]
struct Args {
    /// Key dictionary (`raw_key,canonical_key` per line)
    #[arg(value_name = "DICTIONARY")]
    dictionary: PathBuf,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "TORQUESRV_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check configuration, dictionary and InfluxDB connectivity
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;

    let _guard = common::init_logging(&config.log)
        .map_err(|e| TorqueError::config(format!("Failed to initialize logging: {e:#}")))?;

    info!(
        "Starting TorqueSrv v{}, log file {}",
        env!("CARGO_PKG_VERSION"),
        config.log.file_path().display()
    );

    let result = match args.command {
        Some(Commands::Check) => check(config, &args.dictionary).await,
        None => run_service(config, &args.dictionary).await,
    };

    if let Err(e) = &result {
        error!("{}", e);
    }
    result
}

async fn run_service(config: Config, dictionary_path: &std::path::Path) -> Result<()> {
    let dictionary = Dictionary::load(dictionary_path)?;
    info!(
        "Dictionary loaded: {} entries from {}",
        dictionary.len(),
        dictionary_path.display()
    );

    let client = InfluxDbClient::new(&config.storage)?;
    info!(
        "InfluxDB client ready: {} database {}",
        client.base_url(),
        config.storage.name
    );

    let bind_addr = config.api.bind_addr();
    let route = config.api.route.clone();
    let state = AppState::new(config, dictionary, Arc::new(client));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| TorqueError::Server(format!("Failed to bind {bind_addr}: {e}")))?;
    info!("Listening on http://{}{}", bind_addr, route);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(common::wait_for_shutdown())
    .await
    .map_err(|e| TorqueError::Server(e.to_string()))?;

    info!("TorqueSrv stopped");
    Ok(())
}

async fn check(config: Config, dictionary_path: &std::path::Path) -> Result<()> {
    println!("Listen:     {}{}", config.api.bind_addr(), config.api.route);
    println!(
        "InfluxDB:   {} database {}",
        config.storage.base_url(),
        config.storage.name
    );
    println!("Log file:   {}", config.log.file_path().display());

    let dictionary = Dictionary::load(dictionary_path)?;
    println!(
        "Dictionary: {} ({} entries)",
        dictionary_path.display(),
        dictionary.len()
    );

    let client = InfluxDbClient::new(&config.storage)?;
    client.ping().await?;
    println!("InfluxDB:   reachable");

    Ok(())
}
