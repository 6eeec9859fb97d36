//! End-to-end tests for the ledger lifecycle.
//!
//! These walk a chain through creation, appends, sealing, persistence and
//! tampering using only the public API. Each test owns its chain and, where
//! files are involved, its own temporary directory.

use serde_json::json;

use sealchain_ledger::{
    Chain, ChainConfig, ChainSnapshot, FailureReason, HashAlgorithm, LedgerError, SealOutcome,
    SharedChain,
};

// ---------------------------------------------------------------------------
// 1. Creation
// ---------------------------------------------------------------------------

#[test]
fn fresh_chain_holds_exactly_one_genesis_record() {
    let chain = Chain::new();
    let records = chain.records();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].index, 0);
    assert_eq!(records[0].previous_hash, "0".repeat(64));
    assert!(!chain.is_sealed());
    assert!(chain.verify_integrity().valid);
}

#[test]
fn two_chains_never_share_a_genesis_hash() {
    let a = Chain::new();
    let b = Chain::new();
    assert_ne!(a.id(), b.id());
    assert_ne!(a.genesis().hash, b.genesis().hash);
}

// ---------------------------------------------------------------------------
// 2. Append / seal scenario
// ---------------------------------------------------------------------------

#[test]
fn append_seal_reject_scenario() {
    let mut chain = Chain::new();
    chain.append(json!({"a": 1})).unwrap();
    chain.append(json!({"b": 2})).unwrap();

    assert!(chain.verify_integrity().valid);
    assert_eq!(chain.len(), 3);

    assert_eq!(chain.seal(), SealOutcome::Sealed);
    let err = chain.append(json!({"c": 3})).unwrap_err();
    assert!(matches!(err, LedgerError::AlreadySealed { .. }));
    assert!(err.to_string().contains("sealed"));

    assert_eq!(chain.len(), 3);
    assert!(chain.verify_integrity().valid);
}

#[test]
fn seal_twice_reports_already_sealed() {
    let mut chain = Chain::new();
    assert_eq!(chain.seal(), SealOutcome::Sealed);
    assert_eq!(chain.seal(), SealOutcome::AlreadySealed);
    assert!(chain.is_sealed());
}

#[test]
fn many_appends_stay_valid_for_every_algorithm() {
    for algorithm in HashAlgorithm::ALL {
        let mut chain = Chain::with_config(ChainConfig::default().with_hash_algorithm(algorithm));
        for i in 0..100 {
            chain
                .append(json!({"seq": i, "tags": ["x", "y"], "nested": {"z": i * 2}}))
                .unwrap();
            assert!(chain.verify_integrity().valid);
        }
        assert_eq!(chain.len(), 101);
    }
}

// ---------------------------------------------------------------------------
// 3. Tamper detection through snapshots
// ---------------------------------------------------------------------------

#[test]
fn tampered_payload_in_snapshot_is_reported_at_its_index() {
    let mut chain = Chain::new();
    for i in 0..5 {
        chain.append(json!({"n": i})).unwrap();
    }
    let mut snapshot = chain.snapshot();
    snapshot.records[3].payload = json!({"n": "forged"});

    let restored = Chain::from_snapshot_unchecked(snapshot).unwrap();
    let report = restored.verify_integrity();
    assert!(!report.valid);
    assert_eq!(report.first_invalid_index(), Some(3));
    assert_eq!(report.checked, 3);

    // Verification is a pure read: asking again gives the same answer.
    assert_eq!(restored.verify_integrity(), report);
}

#[test]
fn tampered_hash_in_snapshot_is_reported_at_its_index() {
    let mut chain = Chain::new();
    chain.append(json!("one")).unwrap();
    chain.append(json!("two")).unwrap();

    let mut snapshot = chain.snapshot();
    snapshot.records[1].hash = "f".repeat(64);

    let restored = Chain::from_snapshot_unchecked(snapshot).unwrap();
    let failure = restored.verify_integrity().failure.unwrap();
    assert_eq!(failure.index, 1);
    assert!(matches!(failure.reason, FailureReason::HashMismatch { .. }));
}

#[test]
fn checked_restore_refuses_corrupt_snapshot() {
    let mut chain = Chain::new();
    chain.append(json!("one")).unwrap();
    let mut snapshot = chain.snapshot();
    snapshot.records[1].timestamp += 1;

    let err = Chain::from_snapshot(snapshot).unwrap_err();
    match err {
        LedgerError::IntegrityViolation(failure) => assert_eq!(failure.index, 1),
        other => panic!("unexpected error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// 4. Persistence
// ---------------------------------------------------------------------------

#[test]
fn sealed_chain_survives_a_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let mut chain = Chain::with_config(ChainConfig::default().with_hash_algorithm(HashAlgorithm::Sha512));
    chain.append(json!({"a": 1})).unwrap();
    chain.seal();
    chain.snapshot().save(&path).unwrap();

    let mut restored = Chain::from_snapshot(ChainSnapshot::load(&path).unwrap()).unwrap();
    assert_eq!(restored.id(), chain.id());
    assert_eq!(restored.algorithm(), HashAlgorithm::Sha512);
    assert_eq!(restored.records(), chain.records());
    assert!(restored.is_sealed());
    assert!(restored.append(json!("late")).is_err());
}

#[test]
fn reopened_open_chain_keeps_extending_the_same_links() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let mut chain = Chain::new();
    chain.append(json!("before")).unwrap();
    chain.snapshot().save(&path).unwrap();

    let mut reopened = Chain::from_snapshot(ChainSnapshot::load(&path).unwrap()).unwrap();
    let tip_hash = reopened.tip().hash.clone();
    let record = reopened.append(json!("after")).unwrap();
    assert_eq!(record.index, 2);
    assert_eq!(record.previous_hash, tip_hash);
    assert!(reopened.verify_integrity().valid);
}

// ---------------------------------------------------------------------------
// 5. Explicit injection of a shared chain
// ---------------------------------------------------------------------------

/// A collaborator that receives the chain it writes to instead of reaching
/// for a global.
struct AuditTrail {
    chain: SharedChain,
}

impl AuditTrail {
    fn record(&self, action: &str) -> bool {
        self.chain.append(json!({"action": action})).is_ok()
    }
}

#[test]
fn collaborators_share_the_injected_chain() {
    let chain = SharedChain::default();
    let first = AuditTrail {
        chain: chain.clone(),
    };
    let second = AuditTrail {
        chain: chain.clone(),
    };

    assert!(first.record("login"));
    assert!(second.record("logout"));
    assert_eq!(chain.len(), 3);

    chain.seal();
    assert!(!first.record("late"));
    assert_eq!(chain.len(), 3);
    assert!(chain.verify_integrity().valid);
}
