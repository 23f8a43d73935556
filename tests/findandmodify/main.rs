//! findAndModify suites
//!
//! The memory suites drive every scenario table through two identical
//! in-memory engines. The live suites (feature `live`) drive every family
//! against the deployments named by `doccompat.toml` or the environment.

#[path = "../common/mod.rs"]
mod common;

use doccompat::findandmodify;
use doccompat::FailureKind;
use doccompat_memory::{MemoryEngine, MemoryProvisioner, Quirks};

use common::{init_tracing, memory_runner, run_family};

#[tokio::test]
async fn simple_family_passes_on_identical_engines() {
    let runner = memory_runner();
    let report = run_family(&runner, "Simple", findandmodify::simple()).await;
    report.assert_passed();
    assert_eq!(report.passed_count(), findandmodify::simple().len());
}

#[tokio::test]
async fn remove_family_passes_on_identical_engines() {
    let runner = memory_runner();
    let report = run_family(&runner, "Remove", findandmodify::remove()).await;
    report.assert_passed();

    let remove = report.scenario("Remove").unwrap();
    assert!(remove.subtests.iter().any(|s| s.non_empty));
    assert!(remove
        .subtests
        .iter()
        .all(|s| s.collection == format!("Remove-Remove_{}", s.provider)));
}

#[tokio::test]
async fn every_family_passes_on_identical_engines() {
    let runner = memory_runner();
    let mut failed = Vec::new();
    for (family, table) in findandmodify::families() {
        let expected = table.len();
        let report = run_family(&runner, family, table).await;
        assert_eq!(report.scenarios.len(), expected, "{}", family);
        if !report.is_success() {
            failed.push(report.summary());
        }
    }
    assert!(failed.is_empty(), "{}", failed.join("\n"));
    assert_eq!(runner.provisioner().target().open_cursors(), 0);
    assert_eq!(runner.provisioner().compat().open_cursors(), 0);
}

#[tokio::test]
async fn regex_id_upsert_is_rejected_on_both_sides() {
    let runner = memory_runner();
    let mut errors = findandmodify::errors();
    errors.retain(|name, _| name == "InvalidID");
    let report = run_family(&runner, "Errors", errors).await;
    report.assert_passed();

    let subtest = report.scenario("InvalidID").unwrap().subtest("Int32s").unwrap();
    assert!(!subtest.non_empty);
    assert!(subtest.logs.iter().any(|l| l.starts_with("Target error:")));
    assert!(subtest.logs.iter().any(|l| l.starts_with("Compat error:")));
}

#[tokio::test]
async fn every_cursor_is_released_after_a_family() {
    let runner = memory_runner();
    run_family(&runner, "Simple", findandmodify::simple()).await.assert_passed();
    assert_eq!(runner.provisioner().target().open_cursors(), 0);
    assert_eq!(runner.provisioner().compat().open_cursors(), 0);
}

#[tokio::test]
async fn widening_compat_fails_int32_replacement() {
    init_tracing();
    let provisioner = MemoryProvisioner::new(
        MemoryEngine::new("target"),
        MemoryEngine::with_quirks(
            "compat",
            Quirks {
                widen_int32: true,
                ..Quirks::default()
            },
        ),
    );
    let runner = findandmodify::runner(provisioner, &doccompat::HarnessConfig::default());
    let report = run_family(&runner, "Simple", findandmodify::simple()).await;

    assert!(!report.is_success());
    let scenario = report.scenario("NewIntNonZero").unwrap();
    assert!(!scenario.passed());
    assert!(scenario.subtests.iter().any(|s| s
        .failures
        .iter()
        .any(|f| f.kind == FailureKind::DocumentsMismatch)));
    assert!(report.scenario("EmptyQueryRemove").unwrap().passed());
    assert!(report.summary().contains("FAIL Simple/NewIntNonZero"));
}

#[cfg(feature = "live")]
mod live {
    use std::path::Path;

    use doccompat::mongo::MongoProvisioner;
    use doccompat::{findandmodify, HarnessConfig, CONFIG_FILE_NAME};

    use super::common::{init_tracing, run_family};

    #[tokio::test]
    async fn every_family_matches_the_target() {
        init_tracing();
        let config = HarnessConfig::from_env().unwrap();
        if !config.live_configured() {
            HarnessConfig::write_default_if_missing(Path::new(CONFIG_FILE_NAME)).unwrap();
            tracing::warn!(
                config = CONFIG_FILE_NAME,
                "target_uri and compat_uri are not set; skipping live suites"
            );
            return;
        }
        let provisioner = MongoProvisioner::connect(&config).await.unwrap();
        let runner = findandmodify::runner(provisioner, &config);

        let mut failed = Vec::new();
        for (family, table) in findandmodify::families() {
            let report = run_family(&runner, family, table).await;
            if !report.is_success() {
                failed.push(report.summary());
            }
        }
        assert!(failed.is_empty(), "{}", failed.join("\n"));
    }
}
