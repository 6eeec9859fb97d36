//! # File Commands
//!
//! Bodies of the one-shot subcommands that operate on a snapshot file. Each
//! returns the JSON value `main` prints; none of them touch stdout.

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use std::path::Path;

use sealchain_ledger::{Chain, ChainConfig, ChainSnapshot, IntegrityReport, SealOutcome};

use crate::cli::{AppendArgs, FileArgs, InitArgs, ShowArgs};

/// Load a snapshot and rebuild the chain, refusing data that fails verification.
pub fn load_verified(path: &Path) -> Result<Chain> {
    let snapshot = ChainSnapshot::load(path)
        .with_context(|| format!("failed to read ledger {}", path.display()))?;
    Chain::from_snapshot(snapshot)
        .with_context(|| format!("ledger {} failed verification", path.display()))
}

pub fn save(chain: &Chain, path: &Path) -> Result<()> {
    chain
        .snapshot()
        .save(path)
        .with_context(|| format!("failed to write ledger {}", path.display()))
}

/// `init`: create a ledger file holding only the genesis record.
pub fn init(args: &InitArgs) -> Result<Value> {
    if args.file.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            args.file.display()
        );
    }

    let chain = Chain::with_config(ChainConfig::default().with_hash_algorithm(args.hash));
    save(&chain, &args.file)?;

    tracing::info!(
        chain_id = %chain.id(),
        algorithm = %chain.algorithm(),
        path = %args.file.display(),
        "ledger initialized"
    );

    Ok(json!({
        "file": args.file.display().to_string(),
        "chain_id": chain.id(),
        "algorithm": chain.algorithm(),
        "genesis_hash": chain.genesis().hash,
    }))
}

/// `append`: append one payload and rewrite the file.
pub fn append(args: &AppendArgs) -> Result<Value> {
    let payload: Value =
        serde_json::from_str(&args.payload).context("payload is not valid JSON")?;

    let mut chain = load_verified(&args.file)?;
    let record = chain.append(payload)?.clone();
    save(&chain, &args.file)?;

    Ok(serde_json::to_value(record)?)
}

/// `seal`: seal the ledger. The file is only rewritten when the state changed.
pub fn seal(args: &FileArgs) -> Result<Value> {
    let mut chain = load_verified(&args.file)?;
    let outcome = chain.seal();
    if outcome == SealOutcome::Sealed {
        save(&chain, &args.file)?;
    }

    Ok(json!({
        "outcome": outcome,
        "length": chain.len(),
    }))
}

/// `verify`: walk the ledger and return the report.
///
/// Loads without verification so a tampered file produces a report rather
/// than a load error. Pair with [`ensure_valid`] for the exit status.
pub fn verify(args: &FileArgs) -> Result<IntegrityReport> {
    let snapshot = ChainSnapshot::load(&args.file)
        .with_context(|| format!("failed to read ledger {}", args.file.display()))?;
    let chain = Chain::from_snapshot_unchecked(snapshot)?;
    Ok(chain.verify_integrity())
}

/// Fail when `report` names a bad record.
pub fn ensure_valid(path: &Path, report: &IntegrityReport) -> Result<()> {
    match &report.failure {
        None => Ok(()),
        Some(failure) => bail!("ledger {} is invalid: {}", path.display(), failure),
    }
}

/// `show`: all records, or one when `--index` is given.
pub fn show(args: &ShowArgs) -> Result<Value> {
    let chain = load_verified(&args.file)?;
    match args.index {
        Some(index) => {
            let record = chain
                .get(index)
                .with_context(|| format!("no record at index {}", index))?;
            Ok(serde_json::to_value(record)?)
        }
        None => Ok(serde_json::to_value(chain.records())?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealchain_ledger::{FailureReason, HashAlgorithm};
    use std::path::PathBuf;

    fn init_args(file: &Path, force: bool) -> InitArgs {
        InitArgs {
            file: file.to_path_buf(),
            hash: HashAlgorithm::Sha256,
            force,
        }
    }

    fn file_args(file: &Path) -> FileArgs {
        FileArgs {
            file: file.to_path_buf(),
        }
    }

    fn append_to(file: &Path, payload: &str) -> Result<Value> {
        append(&AppendArgs {
            file: file.to_path_buf(),
            payload: payload.to_string(),
        })
    }

    fn ledger_in(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("ledger.json")
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = ledger_in(&dir);

        let first = init(&init_args(&path, false)).unwrap();
        append_to(&path, r#"{"a":1}"#).unwrap();

        let err = init(&init_args(&path, false)).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(load_verified(&path).unwrap().len(), 2);

        let second = init(&init_args(&path, true)).unwrap();
        assert_ne!(first["chain_id"], second["chain_id"]);
        assert_eq!(load_verified(&path).unwrap().len(), 1);
    }

    #[test]
    fn init_honours_the_hash_algorithm() {
        let dir = tempfile::tempdir().unwrap();
        let path = ledger_in(&dir);

        let mut args = init_args(&path, false);
        args.hash = HashAlgorithm::Blake3;
        let summary = init(&args).unwrap();

        assert_eq!(summary["algorithm"], "blake3");
        assert_eq!(load_verified(&path).unwrap().algorithm(), HashAlgorithm::Blake3);
    }

    #[test]
    fn append_rejects_invalid_json_without_touching_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = ledger_in(&dir);
        init(&init_args(&path, false)).unwrap();
        let before = std::fs::read(&path).unwrap();

        assert!(append_to(&path, "{not json").is_err());
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn append_then_show_returns_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = ledger_in(&dir);
        init(&init_args(&path, false)).unwrap();

        let record = append_to(&path, r#"{"event":"login"}"#).unwrap();
        assert_eq!(record["index"], 1);

        let shown = show(&ShowArgs {
            file: path.clone(),
            index: Some(1),
        })
        .unwrap();
        assert_eq!(shown, record);

        let all = show(&ShowArgs {
            file: path.clone(),
            index: None,
        })
        .unwrap();
        assert_eq!(all.as_array().unwrap().len(), 2);

        assert!(show(&ShowArgs {
            file: path,
            index: Some(9),
        })
        .is_err());
    }

    #[test]
    fn seal_rewrites_only_on_the_first_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = ledger_in(&dir);
        init(&init_args(&path, false)).unwrap();
        append_to(&path, r#"{"a":1}"#).unwrap();

        let first = seal(&file_args(&path)).unwrap();
        assert_eq!(first["outcome"], "sealed");
        assert_eq!(first["length"], 2);

        // Re-encode compactly; a rewrite would turn it back into pretty JSON.
        let compact = serde_json::to_vec(&ChainSnapshot::load(&path).unwrap()).unwrap();
        std::fs::write(&path, &compact).unwrap();

        let second = seal(&file_args(&path)).unwrap();
        assert_eq!(second["outcome"], "already_sealed");
        assert_eq!(std::fs::read(&path).unwrap(), compact);

        assert!(append_to(&path, r#"{"b":2}"#).is_err());
        assert_eq!(load_verified(&path).unwrap().len(), 2);
    }

    #[test]
    fn verify_passes_a_clean_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = ledger_in(&dir);
        init(&init_args(&path, false)).unwrap();
        append_to(&path, r#"{"a":1}"#).unwrap();

        let report = verify(&file_args(&path)).unwrap();
        assert!(report.valid);
        assert_eq!(report.checked, 2);
        assert!(ensure_valid(&path, &report).is_ok());
    }

    #[test]
    fn verify_reports_and_fails_on_a_tampered_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = ledger_in(&dir);
        init(&init_args(&path, false)).unwrap();
        append_to(&path, r#"{"amount":10}"#).unwrap();
        append_to(&path, r#"{"amount":20}"#).unwrap();

        let mut snapshot = ChainSnapshot::load(&path).unwrap();
        snapshot.records[1].payload = serde_json::json!({"amount": 10_000});
        snapshot.save(&path).unwrap();

        let report = verify(&file_args(&path)).unwrap();
        assert!(!report.valid);
        assert_eq!(report.first_invalid_index(), Some(1));
        assert!(matches!(
            report.failure.as_ref().unwrap().reason,
            FailureReason::HashMismatch { .. }
        ));

        let err = ensure_valid(&path, &report).unwrap_err();
        assert!(err.to_string().contains("record 1"));

        // Commands that need a trustworthy chain refuse the file outright.
        assert!(append_to(&path, r#"{"amount":30}"#).is_err());
        assert!(seal(&file_args(&path)).is_err());
    }

    #[test]
    fn commands_fail_cleanly_on_a_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = ledger_in(&dir);

        let err = verify(&file_args(&path)).unwrap_err();
        assert!(err.to_string().contains("failed to read ledger"));
        assert!(seal(&file_args(&path)).is_err());
    }
}
