//! # CLI Interface
//!
//! Defines the command-line argument structure for `sealchain-node` using
//! `clap` derive. File-based subcommands (`init`, `append`, `seal`,
//! `verify`, `show`) operate on a JSON snapshot; `serve` runs the HTTP API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sealchain_ledger::config::{DEFAULT_API_PORT, DEFAULT_METRICS_PORT};
use sealchain_ledger::HashAlgorithm;

/// Sealchain ledger node.
///
/// Creates, extends, seals and verifies append-only hash-chain ledgers,
/// either one command at a time against a snapshot file or as a long-running
/// HTTP service.
#[derive(Parser, Debug)]
#[command(
    name = "sealchain-node",
    about = "Append-only, sealable hash-chain ledger",
    version,
    propagate_version = true
)]
pub struct SealchainCli {
    /// Log output format: "pretty" or "json". Logs always go to stderr.
    #[arg(long, global = true, env = "SEALCHAIN_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new ledger file containing only its genesis record.
    Init(InitArgs),
    /// Append one JSON payload to a ledger file.
    Append(AppendArgs),
    /// Seal a ledger file. Sealing an already sealed ledger is a no-op.
    Seal(FileArgs),
    /// Verify every record in a ledger file. Exits non-zero when invalid.
    Verify(FileArgs),
    /// Print the records of a ledger file.
    Show(ShowArgs),
    /// Serve a ledger over HTTP with Prometheus metrics.
    Serve(ServeArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Path of the ledger snapshot to create.
    #[arg(long, short = 'f', env = "SEALCHAIN_FILE")]
    pub file: PathBuf,

    /// Hash algorithm for the new ledger: sha256, sha512 or blake3.
    #[arg(long, env = "SEALCHAIN_HASH", default_value_t = HashAlgorithm::Sha256)]
    pub hash: HashAlgorithm,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `append` subcommand.
#[derive(Parser, Debug)]
pub struct AppendArgs {
    /// Path of the ledger snapshot.
    #[arg(long, short = 'f', env = "SEALCHAIN_FILE")]
    pub file: PathBuf,

    /// Payload as a JSON document, e.g. '{"a":1}'.
    #[arg(long, short = 'p')]
    pub payload: String,
}

/// Arguments shared by subcommands that only need the ledger path.
#[derive(Parser, Debug)]
pub struct FileArgs {
    /// Path of the ledger snapshot.
    #[arg(long, short = 'f', env = "SEALCHAIN_FILE")]
    pub file: PathBuf,
}

/// Arguments for the `show` subcommand.
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Path of the ledger snapshot.
    #[arg(long, short = 'f', env = "SEALCHAIN_FILE")]
    pub file: PathBuf,

    /// Print only the record at this index.
    #[arg(long, short = 'i')]
    pub index: Option<u64>,
}

/// Arguments for the `serve` subcommand.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Ledger snapshot to load and keep up to date. When omitted the ledger
    /// lives in memory only and is lost on shutdown.
    #[arg(long, short = 'f', env = "SEALCHAIN_FILE")]
    pub file: Option<PathBuf>,

    /// Hash algorithm used when a new ledger has to be created.
    #[arg(long, env = "SEALCHAIN_HASH", default_value_t = HashAlgorithm::Sha256)]
    pub hash: HashAlgorithm,

    /// Address to bind both listeners on.
    #[arg(long, env = "SEALCHAIN_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Port for the HTTP API.
    #[arg(long, env = "SEALCHAIN_API_PORT", default_value_t = DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "SEALCHAIN_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,
}
