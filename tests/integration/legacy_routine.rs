//! Child-process adapter against a scripted stand-in for the legacy routine.

#![cfg(unix)]

use std::path::Path;

use anomaly_sweep::config::{DetectionConfig, DetectionSettings};
use anomaly_sweep::engine::command::CommandEngine;
use anomaly_sweep::engine::DetectionEngine;
use anomaly_sweep::report;
use anomaly_sweep::runner::RunDriver;
use anomaly_sweep::types::DictionaryMode;

/// A shell routine that honours the dictionary flags: it refuses to load a
/// dictionary that was never saved, and scores instruments from the pass
/// counter kept in the working directory.
const ROUTINE: &str = r#"
save=0; load=0; dict=""
while [ $# -gt 0 ]; do
  case "$1" in
    --is_save_dictionary) save="$2"; shift ;;
    --is_load_from_dictionary) load="$2"; shift ;;
    --data_dictionary_path) dict="$2"; shift ;;
  esac
  shift
done
if [ "$load" = "1" ] && [ ! -f "$dict" ]; then
  echo "dictionary $dict missing" >&2
  exit 2
fi
if [ "$save" = "1" ]; then
  mkdir -p "$(dirname "$dict")"; echo cached > "$dict"
fi
n=$(cat counter 2>/dev/null || echo 0); n=$((n + 1)); echo $n > counter
printf '[{"Symbol":"SPY","Anomaly Score":-0.%s},{"Symbol":"QQQ","Anomaly Score":0.%s}]\n' "$n" "$n" > "result_$n.json"
echo "Downloading..."
echo "Results stored successfully in $(pwd)/result_$n.json"
"#;

fn engine(dir: &Path) -> CommandEngine {
    CommandEngine::new(&[
        "sh".to_string(),
        "-c".to_string(),
        ROUTINE.to_string(),
        "detection_engine".to_string(),
    ])
    .unwrap()
    .with_working_dir(dir)
}

fn base_config() -> DetectionConfig {
    let settings = DetectionSettings {
        data_dictionary_path: "dictionaries/feature_dict.npy".to_string(),
        ..DetectionSettings::default()
    };
    DetectionConfig::from_settings(&settings, 2)
}

#[tokio::test]
async fn test_dictionary_built_once_then_reused() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());

    let outcome = RunDriver::new(&engine, base_config())
        .run(3, &mut Vec::new())
        .await
        .unwrap();

    assert!(dir.path().join("dictionaries/feature_dict.npy").exists());
    assert!(!dir.path().join("result_1.json").exists());

    let ranked = report::rank(&outcome.table);
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].symbol, "SPY");
    assert!((ranked[0].mean_score + 0.2).abs() < 1e-9);
    assert_eq!(ranked[1].symbol, "QQQ");
}

#[tokio::test]
async fn test_routine_exit_failure_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());

    // Loading without a saved dictionary makes the routine exit non-zero.
    let config = base_config().with_mode(DictionaryMode::Load);
    let err = engine.find_anomalies(&config).await.unwrap_err();
    assert!(format!("{err:#}").contains("missing"));
}
