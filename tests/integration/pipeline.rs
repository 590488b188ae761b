//! End-to-end: run driver → aggregation → ranking → snapshot.

use anomaly_sweep::config::{DetectionConfig, DetectionSettings};
use anomaly_sweep::report;
use anomaly_sweep::runner::RunDriver;
use anomaly_sweep::storage;
use anomaly_sweep::types::{DictionaryMode, SweepError};

use crate::mock_engine::{MockRoutine, PassScript};

fn base_config() -> DetectionConfig {
    DetectionConfig::from_settings(&DetectionSettings::default(), 3)
}

#[tokio::test]
async fn test_three_pass_scenario_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let routine = MockRoutine::new(
        dir.path(),
        vec![
            PassScript::Records(vec![("A", 1.0), ("B", 2.0)]),
            PassScript::Records(vec![("A", 2.0), ("B", 2.0), ("C", 5.0)]),
            PassScript::Records(vec![("A", 3.0)]),
        ],
    );
    let log = routine.log();
    let engine = routine.into_engine();

    let driver = RunDriver::new(&engine, base_config());
    let mut console = Vec::new();
    let outcome = driver.run(3, &mut console).await.unwrap();

    // Handoff files are consumed.
    for path in &log.lock().unwrap().announced {
        assert!(!path.exists(), "{} should have been deleted", path.display());
    }
    assert_eq!(
        log.lock().unwrap().modes,
        vec![DictionaryMode::Build, DictionaryMode::Load, DictionaryMode::Load]
    );

    let snapshot = storage::snapshot_path(&dir.path().join("automation_data"), "dictionaries/feature_dict.npy");
    let shown = report::report(&outcome.table, 2, &snapshot, &mut console).unwrap();

    let symbols: Vec<_> = shown.iter().map(|e| e.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["A", "B"]);
    assert!((shown[0].mean_score - 2.0).abs() < 1e-9);
    assert!((shown[1].mean_score - 2.0).abs() < 1e-9);

    let text = String::from_utf8(console).unwrap();
    assert!(text.starts_with("Iteration 1:\nDownloading...\nDone\nIteration 2: Done\nIteration 3: Done\n"));
    assert!(text.contains("Symbol: A\nAvg. Anomaly Score: 2.000\n"));
    assert!(!text.contains("Symbol: C"));
    assert!(text.ends_with("----------------------\n"));

    // Snapshot keeps everything, including the extra per-pass fields.
    let saved = storage::load_snapshot(&snapshot).unwrap().unwrap();
    assert_eq!(saved.len(), 3);
    let c = saved.get("C").unwrap();
    assert_eq!(c.len(), 1);
    assert_eq!(c[0].extra["Pass"], 2);
}

#[tokio::test]
async fn test_silent_passes_contribute_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let routine = MockRoutine::new(
        dir.path(),
        vec![
            PassScript::Silent,
            PassScript::Records(vec![("X", -1.0)]),
            PassScript::Silent,
            PassScript::Records(vec![("X", -3.0)]),
        ],
    );
    let log = routine.log();
    let engine = routine.into_engine();

    let outcome = RunDriver::new(&engine, base_config())
        .run(4, &mut Vec::new())
        .await
        .unwrap();

    assert_eq!(outcome.empty_passes, 2);
    assert_eq!(outcome.table.get("X").unwrap().len(), 2);
    // The switch to the cached dictionary does not depend on pass 1 producing results.
    assert_eq!(log.lock().unwrap().modes[1], DictionaryMode::Load);

    let ranked = report::rank(&outcome.table);
    assert_eq!(ranked.len(), 1);
    assert!((ranked[0].mean_score + 2.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_phantom_result_file_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let routine = MockRoutine::new(
        dir.path(),
        vec![
            PassScript::Records(vec![("A", 1.0)]),
            PassScript::Phantom,
            PassScript::Records(vec![("A", 1.0)]),
        ],
    );
    let log = routine.log();
    let engine = routine.into_engine();

    let err = RunDriver::new(&engine, base_config())
        .run(3, &mut Vec::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SweepError>(),
        Some(SweepError::ArtifactMissing { .. })
    ));
    assert_eq!(log.lock().unwrap().modes.len(), 2);
}

#[tokio::test]
async fn test_routine_failure_aborts_without_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let routine = MockRoutine::new(
        dir.path(),
        vec![
            PassScript::Records(vec![("A", 1.0)]),
            PassScript::Records(vec![("A", 2.0)]),
            PassScript::Fail("yahoo_finance rate limited"),
        ],
    );
    let engine = routine.into_engine();

    let result = RunDriver::new(&engine, base_config())
        .run(5, &mut Vec::new())
        .await;

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("rate limited"));
    assert!(err.to_string().contains("pass 3 of 5"));
}
