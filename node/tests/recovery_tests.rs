use rootledger_kernel::collab::{FixedClock, OwnerOnly};
use rootledger_kernel::event::Notification;
use rootledger_kernel::state::registry::DistributionMetadata;
use rootledger_kernel::types::{Commitment, DistributionId, Principal, SeriesKey, Timestamp};
use rootledger_node::config::NodeConfig;
use rootledger_node::engine::Engine;
use rootledger_node::errors::EngineError;
use rootledger_persistence::fixtures::{generate_ledger_scenario, FIXTURE_DEFAULT_EPOCH};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn open(cfg: &NodeConfig) -> Result<Engine, EngineError> {
    Engine::with_collaborators(cfg, Arc::new(FixedClock::new(Timestamp(10_000_000))), Box::new(OwnerOnly))
}

fn fixture_cfg(log: &Path, snapshot: &Path) -> NodeConfig {
    NodeConfig {
        default_epoch_length: FIXTURE_DEFAULT_EPOCH,
        event_log_path: Some(log.to_path_buf()),
        snapshot_path: Some(snapshot.to_path_buf()),
        ..NodeConfig::default()
    }
}

#[test]
fn test_recovers_fixture_with_and_without_snapshot() {
    let dir = tempdir().unwrap();
    let paths = generate_ledger_scenario(dir.path()).unwrap();

    let with_snapshot = open(&fixture_cfg(&paths.log, &paths.snapshot)).unwrap();
    assert_eq!(with_snapshot.state_hash(), paths.final_state_hash);
    assert_eq!(with_snapshot.committed_height(), paths.event_count);

    fs::remove_file(&paths.snapshot).unwrap();
    let without = open(&fixture_cfg(&paths.log, &paths.snapshot)).unwrap();
    assert_eq!(without.state_hash(), paths.final_state_hash);
}

#[test]
fn test_recovered_engine_continues_sequence() {
    let dir = tempdir().unwrap();
    let paths = generate_ledger_scenario(dir.path()).unwrap();
    let cfg = fixture_cfg(&paths.log, &paths.snapshot);

    let mut engine = open(&cfg).unwrap();
    let receipt = engine
        .publish(
            DistributionId(0),
            &Principal::new("treasury"),
            Commitment::digest(b"treasury-3"),
            Timestamp(259_200),
        )
        .unwrap();
    assert_eq!(receipt.height, paths.event_count + 1);
    let hash = engine.state_hash();
    drop(engine);

    let reopened = open(&cfg).unwrap();
    assert_eq!(reopened.state_hash(), hash);
    assert_eq!(
        reopened.latest(SeriesKey::Distribution(DistributionId(0))).unwrap(),
        Commitment::digest(b"treasury-3")
    );
}

#[test]
fn test_torn_tail_fails_closed() {
    let dir = tempdir().unwrap();
    let paths = generate_ledger_scenario(dir.path()).unwrap();

    let mut file = OpenOptions::new().append(true).open(&paths.log).unwrap();
    file.write_all(&[0x01, 0x02, 0x03]).unwrap();
    drop(file);

    assert!(open(&fixture_cfg(&paths.log, &paths.snapshot)).is_err());
}

#[test]
fn test_stale_snapshot_ahead_of_log_is_ignored() {
    let dir = tempdir().unwrap();
    let cfg = NodeConfig {
        default_epoch_length: 60,
        event_log_path: Some(dir.path().join("a.log")),
        snapshot_path: Some(dir.path().join("a.snap")),
        ..NodeConfig::default()
    };

    {
        let mut engine = open(&cfg).unwrap();
        engine
            .create_distribution(Principal::new("alice"), 60, DistributionMetadata::new("a", ""))
            .unwrap();
        engine.save_snapshot().unwrap();
    }

    // A fresh log paired with the old snapshot.
    fs::remove_file(dir.path().join("a.log")).unwrap();
    drop(open(&cfg).unwrap());
    let engine = open(&cfg).unwrap();
    assert_eq!(engine.registry().distribution_count(), 0);
    assert_eq!(engine.committed_height(), 1);
}

#[test]
fn test_snapshot_from_replaced_log_is_ignored() {
    let dir = tempdir().unwrap();
    let cfg = NodeConfig {
        default_epoch_length: 60,
        event_log_path: Some(dir.path().join("a.log")),
        snapshot_path: Some(dir.path().join("a.snap")),
        ..NodeConfig::default()
    };
    let alice = Principal::new("alice");
    let bob = Principal::new("bob");

    {
        let mut engine = open(&cfg).unwrap();
        let id = engine
            .create_distribution(alice.clone(), 60, DistributionMetadata::new("a", ""))
            .unwrap();
        engine.publish(id, &alice, Commitment::digest(b"A1"), Timestamp(60)).unwrap();
        engine.save_snapshot().unwrap();
    }

    // A new history long enough to cover the old snapshot, and continuous
    // with it from event 4 on.
    fs::remove_file(dir.path().join("a.log")).unwrap();
    let expected = {
        let mut engine = open(&cfg).unwrap();
        let id = engine
            .create_distribution(bob.clone(), 60, DistributionMetadata::new("b", ""))
            .unwrap();
        for (i, label) in [b"B1", b"B2", b"B3"].iter().enumerate() {
            engine
                .publish(id, &bob, Commitment::digest(*label), Timestamp(60 * (i as u64 + 1)))
                .unwrap();
        }
        engine.state_hash()
    };

    let engine = open(&cfg).unwrap();
    assert_eq!(engine.state_hash(), expected);
    let dist = engine.distribution(DistributionId(0)).unwrap();
    assert_eq!(dist.owner(), &bob);
    assert_eq!(
        engine.at(SeriesKey::Distribution(DistributionId(0)), Timestamp(0)).unwrap(),
        Commitment::digest(b"B1")
    );
}

#[test]
fn test_observer_sees_each_commit_once() {
    let mut engine = open(&NodeConfig::default()).unwrap();
    let mut rx = engine.subscribe();
    let alice = Principal::new("alice");

    let id = engine
        .create_distribution(alice.clone(), 86_400, DistributionMetadata::new("daily", ""))
        .unwrap();
    engine
        .publish(id, &alice, Commitment::digest(b"r"), Timestamp(86_400))
        .unwrap();
    assert!(engine
        .publish(id, &alice, Commitment::digest(b"r"), Timestamp(86_400))
        .is_err());

    assert!(matches!(rx.try_recv().unwrap(), Notification::DistributionCreated { .. }));
    match rx.try_recv().unwrap() {
        Notification::RootPublished { distribution, root, end_timestamp } => {
            assert_eq!(distribution, Some(id));
            assert_eq!(root, Commitment::digest(b"r"));
            assert_eq!(end_timestamp, Timestamp(86_400));
        }
        other => panic!("unexpected notification {:?}", other),
    }
    assert!(rx.try_recv().is_err());
}
