// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Sealchain Node
//!
//! Entry point for the `sealchain-node` binary. Parses CLI arguments,
//! initializes logging, and either runs one ledger operation against a
//! snapshot file or serves the ledger over HTTP.
//!
//! Subcommands:
//!
//! - `init`    — create a ledger file holding only its genesis record
//! - `append`  — append one JSON payload
//! - `seal`    — seal the ledger
//! - `verify`  — walk the chain and report the first bad record
//! - `show`    — print records
//! - `serve`   — run the HTTP API and metrics endpoint
//! - `version` — print build version information
//!
//! File subcommands print JSON on stdout; logs go to stderr.

mod api;
mod cli;
mod commands;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tokio::signal;

use sealchain_ledger::config::LEDGER_VERSION;
use sealchain_ledger::{Chain, ChainConfig, SharedChain};

use cli::{Commands, SealchainCli};
use logging::LogFormat;
use metrics::NodeMetrics;

/// Default filter for one-shot file commands. Quiet so stdout stays readable.
const FILE_COMMAND_LOG_LEVEL: &str = "sealchain_node=warn,sealchain_ledger=warn";

/// Default filter for `serve`.
const SERVE_LOG_LEVEL: &str = "sealchain_node=info,sealchain_ledger=info,tower_http=debug";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = SealchainCli::parse();
    let format = LogFormat::from_str_lossy(&cli.log_format);

    match cli.command {
        Commands::Init(args) => {
            logging::init_logging(FILE_COMMAND_LOG_LEVEL, format);
            print_json(&commands::init(&args)?)
        }
        Commands::Append(args) => {
            logging::init_logging(FILE_COMMAND_LOG_LEVEL, format);
            print_json(&commands::append(&args)?)
        }
        Commands::Seal(args) => {
            logging::init_logging(FILE_COMMAND_LOG_LEVEL, format);
            print_json(&commands::seal(&args)?)
        }
        Commands::Verify(args) => {
            logging::init_logging(FILE_COMMAND_LOG_LEVEL, format);
            verify_ledger(args)
        }
        Commands::Show(args) => {
            logging::init_logging(FILE_COMMAND_LOG_LEVEL, format);
            print_json(&commands::show(&args)?)
        }
        Commands::Serve(args) => {
            logging::init_logging(SERVE_LOG_LEVEL, format);
            serve(args).await
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Verifies the ledger and prints the report. Fails when the chain is invalid.
fn verify_ledger(args: cli::FileArgs) -> Result<()> {
    let report = commands::verify(&args)?;
    print_json(&report)?;
    commands::ensure_valid(&args.file, &report)
}

// ---------------------------------------------------------------------------
// Serve
// ---------------------------------------------------------------------------

/// Runs the HTTP API and the metrics endpoint until a shutdown signal arrives.
async fn serve(args: cli::ServeArgs) -> Result<()> {
    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        file = ?args.file,
        "starting sealchain-node"
    );

    // --- Ledger ---
    let chain = match &args.file {
        Some(path) if path.exists() => {
            let chain = commands::load_verified(path)?;
            tracing::info!(
                chain_id = %chain.id(),
                length = chain.len(),
                sealed = chain.is_sealed(),
                "ledger loaded"
            );
            chain
        }
        Some(path) => {
            let chain = Chain::with_config(ChainConfig::default().with_hash_algorithm(args.hash));
            commands::save(&chain, path)?;
            tracing::info!(chain_id = %chain.id(), path = %path.display(), "ledger created");
            chain
        }
        None => {
            let chain = Chain::with_config(ChainConfig::default().with_hash_algorithm(args.hash));
            tracing::warn!(chain_id = %chain.id(), "no ledger file given; chain is in-memory only");
            chain
        }
    };

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new().context("failed to register metrics")?);

    // --- Application state ---
    let app_state = api::AppState::new(
        format!("{} (ledger {})", env!("CARGO_PKG_VERSION"), LEDGER_VERSION),
        SharedChain::new(chain),
        Arc::clone(&node_metrics),
        args.file.clone(),
    );

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("{}:{}", args.bind, args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("{}:{}", args.bind, args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("sealchain-node stopped");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("sealchain-node {}", env!("CARGO_PKG_VERSION"));
    println!("ledger         {}", LEDGER_VERSION);
    println!("rustc          {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// A handler that cannot be installed is logged and never fires; the other
/// one still can. On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
