//! FlowSrv entry point
//!
//! Runs the HTTP service by default; `flowsrv export` compiles the
//! configured topology, writes the artifact and exits.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use flowsrv::app_state::AppState;
use flowsrv::config::FlowsrvConfig;
use flowsrv::flow;
use flowsrv::logging;
use flowsrv::routes::create_routes;

#[derive(Parser, Debug)]
#[command(author, version, about = "FlowSrv - energy topology flow export service")]
struct Args {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compile the topology, write the flow artifact, and exit
    Export {
        /// Artifact filename (defaults to the configured one)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = FlowsrvConfig::load(args.config.as_deref())?;
    logging::init(&config.log.level);

    info!(
        "Starting {} v{}",
        config.service.name,
        env!("CARGO_PKG_VERSION")
    );

    let state = Arc::new(AppState::from_config(config));

    match args.command {
        Some(Commands::Export { output }) => run_export(state, output).await,
        None => run_service(state).await,
    }
}

/// One-shot export mode
async fn run_export(state: Arc<AppState>, output: Option<String>) -> Result<()> {
    let points = state.registry.points();
    let program = state.compiler.compile(&points, state.registry.edges());
    let bytes = flow::serialize(&program)?;

    let filename = output.unwrap_or_else(|| state.config.export.filename.clone());
    state.sink.emit(&filename, &bytes).await?;

    info!(
        stages = program.len(),
        filename = %filename,
        "flow program exported"
    );
    Ok(())
}

/// Service mode: HTTP API until shutdown
async fn run_service(state: Arc<AppState>) -> Result<()> {
    let bind_address = state.config.api.bind_address.clone();
    let app = create_routes(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("flowsrv API listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
