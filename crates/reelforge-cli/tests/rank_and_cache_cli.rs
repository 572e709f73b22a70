//! Integration tests for `rank` and `cache` — the two command families that never need the
//! embedder/vector store/generator, so they run against the real `reelforge` binary without a
//! Candle model or generator endpoint on hand.

mod common;

use common::reelforge_cmd;
use predicates::prelude::*;

#[test]
fn rank_against_an_empty_catalog_with_no_presets_file_reports_preset_not_found() {
    let catalog_dir = tempfile::tempdir().unwrap();
    let presets_file = catalog_dir.path().join("presets.json");

    reelforge_cmd()
        .arg("--catalog-dir")
        .arg(catalog_dir.path())
        .arg("--presets-file")
        .arg(&presets_file)
        .arg("rank")
        .arg("--preset")
        .arg("cozy-night-in")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cozy-night-in"));
}

#[test]
fn rank_against_a_saved_preset_with_an_empty_catalog_ranks_zero_candidates() {
    let catalog_dir = tempfile::tempdir().unwrap();
    let presets_file = catalog_dir.path().join("presets.json");
    std::fs::write(
        &presets_file,
        serde_json::json!([
            {
                "id": "cozy-night-in",
                "name": "Cozy night in",
                "config": { "criteria": [] }
            }
        ])
        .to_string(),
    )
    .unwrap();

    reelforge_cmd()
        .arg("--catalog-dir")
        .arg(catalog_dir.path())
        .arg("--presets-file")
        .arg(&presets_file)
        .arg("rank")
        .arg("--preset")
        .arg("cozy-night-in")
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"candidates_considered\": 0"));
}

#[test]
fn cache_metrics_on_a_fresh_engine_reports_zero_everything() {
    let catalog_dir = tempfile::tempdir().unwrap();

    reelforge_cmd()
        .arg("--catalog-dir")
        .arg(catalog_dir.path())
        .arg("cache")
        .arg("metrics")
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"entries\": 0"))
        .stdout(predicate::str::contains("\"hits\": 0"));
}

#[test]
fn cache_clear_on_a_fresh_engine_succeeds_without_touching_a_model() {
    let catalog_dir = tempfile::tempdir().unwrap();

    reelforge_cmd()
        .arg("--catalog-dir")
        .arg(catalog_dir.path())
        .arg("cache")
        .arg("clear")
        .assert()
        .success();
}
