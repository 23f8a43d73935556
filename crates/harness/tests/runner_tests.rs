//! End-to-end runner tests over two in-memory engines.

mod common;

use std::time::Duration;

use bson::doc;
use doccompat_core::{table, Outcome, Scenario};
use doccompat_harness::{Context, FailureKind, KnownFailurePolicy, RunOptions};
use doccompat_memory::Quirks;

use common::{registry, runner, runner_with};

const FAMILY: &str = "FindAndModify";

fn int_providers() -> doccompat_core::ProviderRegistry {
    registry(vec![
        ("Int32s", vec![doc! { "_id": "int32", "v": 42_i32 }]),
        ("Int64s", vec![doc! { "_id": "int64", "v": 11_i64 }]),
        ("Strings", vec![doc! { "_id": "string", "v": "foo" }]),
    ])
}

// ============================================================================
// Reference behaviour on identical engines
// ============================================================================

#[tokio::test]
async fn round_trip_int64_leaves_both_sides_equal() {
    let runner = runner(Quirks::default(), int_providers());
    let scenarios = table([(
        "SetInt64",
        Scenario::new(doc! {
            "query": { "_id": "int64" },
            "update": { "$set": { "v": 43_i64 } },
        })
        .providers(["Int64s"]),
    )]);

    let report = runner.run(&Context::background(), FAMILY, scenarios).await;
    report.assert_passed();

    let subtest = report.scenario("SetInt64").unwrap().subtest("Int64s").unwrap();
    assert_eq!(subtest.outcome, Outcome::Match);
    assert!(subtest.non_empty);
    assert!(subtest.logs.iter().any(|l| l.starts_with("Compat IDs:")));
    assert!(subtest.logs.iter().any(|l| l.starts_with("Target IDs:")));

    let collection = "FindAndModify-SetInt64_Int64s";
    let expected = vec![doc! { "_id": "int64", "v": 43_i64 }];
    assert_eq!(runner.provisioner().target().documents(collection), expected);
    assert_eq!(runner.provisioner().compat().documents(collection), expected);
}

#[tokio::test]
async fn upsert_of_missing_document_inserts_on_both_sides() {
    let runner = runner(
        Quirks::default(),
        registry(vec![("Doubles", vec![doc! { "_id": "double", "v": 42.13 }])]),
    );
    let scenarios = table([(
        "UpsertNoSuchDoc",
        Scenario::new(doc! {
            "query": { "_id": "no-such-doc" },
            "update": { "$set": { "v": 43.13 } },
            "upsert": true,
            "new": true,
        }),
    )]);

    let report = runner.run(&Context::background(), FAMILY, scenarios).await;
    report.assert_passed();

    let inserted = doc! { "_id": "no-such-doc", "v": 43.13 };
    let collection = "FindAndModify-UpsertNoSuchDoc_Doubles";
    assert!(runner.provisioner().target().documents(collection).contains(&inserted));
    assert!(runner.provisioner().compat().documents(collection).contains(&inserted));
}

#[tokio::test]
async fn conflicting_operators_are_rejected_identically() {
    let runner = runner(Quirks::default(), int_providers());
    let scenarios = table([(
        "Conflict",
        Scenario::new(doc! { "update": { "$set": { "v": 4 }, "$inc": { "v": 4 } } }).expect_none(),
    )]);

    let report = runner.run(&Context::background(), FAMILY, scenarios).await;
    report.assert_passed();

    let scenario = report.scenario("Conflict").unwrap();
    assert_eq!(scenario.subtests.len(), 3);
    for subtest in &scenario.subtests {
        assert!(!subtest.non_empty);
        assert!(subtest.logs.iter().any(|l| l.starts_with("Target error:")));
        assert!(subtest.logs.iter().any(|l| l.starts_with("Compat error:")));
    }
    assert_eq!(
        runner.provisioner().target().documents("FindAndModify-Conflict_Int32s"),
        vec![doc! { "_id": "int32", "v": 42_i32 }]
    );
}

#[tokio::test]
async fn nothing_matched_or_stored_fails_results_expectation() {
    let runner = runner(Quirks::default(), registry(vec![("Empty", vec![])]));
    let scenarios = table([(
        "NoMatch",
        Scenario::new(doc! { "query": { "_id": "missing" }, "update": { "$set": { "v": 1 } } }),
    )]);

    let report = runner.run(&Context::background(), FAMILY, scenarios).await;
    let scenario = report.scenario("NoMatch").unwrap();
    assert!(!scenario.verdict.is_pass());
    assert!(scenario.subtests.iter().all(|s| s.passed() && !s.non_empty));
    assert_eq!(report.failed().len(), 1);
}

// ============================================================================
// Divergent target
// ============================================================================

fn set_int32() -> Scenario {
    Scenario::new(doc! { "query": { "_id": "int32" }, "update": { "$set": { "v": 43_i32 } } })
}

fn widening() -> Quirks {
    Quirks {
        widen_int32: true,
        ..Quirks::default()
    }
}

#[tokio::test]
async fn widened_int32_is_a_documents_mismatch() {
    let runner = runner(widening(), int_providers());
    let scenarios = table([("SetInt32", set_int32().providers(["Int32s"]))]);

    let report = runner.run(&Context::background(), FAMILY, scenarios).await;
    assert!(!report.is_success());

    let subtest = report.scenario("SetInt32").unwrap().subtest("Int32s").unwrap();
    assert_eq!(subtest.outcome, Outcome::DocumentsMismatch);
    assert_eq!(subtest.failures.len(), 1);
    assert_eq!(subtest.failures[0].kind, FailureKind::DocumentsMismatch);
    assert!(report.summary().contains("DocumentsMismatch"));
}

#[tokio::test]
async fn gate_tolerates_only_listed_providers() {
    let runner = runner(widening(), int_providers());
    let scenarios = table([
        (
            "GatedOnInt32s",
            set_int32()
                .providers(["Int32s", "Strings"])
                .fails_for("https://tracker.example/int32-widening", ["Int32s"]),
        ),
        (
            "GatedOnStrings",
            set_int32()
                .providers(["Int32s", "Strings"])
                .fails_for("https://tracker.example/other", ["Strings"]),
        ),
    ]);

    let report = runner.run(&Context::background(), FAMILY, scenarios).await;

    let gated = report.scenario("GatedOnInt32s").unwrap();
    assert!(gated.passed());
    let int32s = gated.subtest("Int32s").unwrap();
    assert!(int32s.gated());
    assert!(int32s.failures.is_empty());
    assert_eq!(int32s.expected_failures.len(), 1);
    assert_eq!(
        int32s.expected_failures[0].reference,
        "https://tracker.example/int32-widening"
    );
    assert!(!gated.subtest("Strings").unwrap().gated());

    let misgated = report.scenario("GatedOnStrings").unwrap();
    assert!(!misgated.passed());
    let int32s = misgated.subtest("Int32s").unwrap();
    assert!(!int32s.gated());
    assert_eq!(int32s.failures[0].kind, FailureKind::DocumentsMismatch);
}

#[tokio::test]
async fn known_failure_never_excuses_produce_none() {
    let runner = runner(Quirks::default(), int_providers());
    let scenarios = table([(
        "MustBeNoop",
        set_int32().expect_none().fails("https://tracker.example/noop"),
    )]);

    let report = runner.run(&Context::background(), FAMILY, scenarios).await;
    let scenario = report.scenario("MustBeNoop").unwrap();
    assert_eq!(
        scenario.verdict,
        doccompat_core::Verdict::Fail {
            reason: "expected empty results".to_string()
        }
    );
    assert!(!report.is_success());
}

#[tokio::test]
async fn failing_target_is_an_error_mismatch() {
    let broken = Quirks {
        fail_commands: true,
        ..Quirks::default()
    };
    let runner = runner(broken, int_providers());
    let scenarios = table([("SetInt32", set_int32().providers(["Int32s"]))]);

    let report = runner.run(&Context::background(), FAMILY, scenarios).await;
    let subtest = report.scenario("SetInt32").unwrap().subtest("Int32s").unwrap();
    assert_eq!(subtest.outcome, Outcome::ErrorMismatch);
    // compat returned the pre-image
    assert!(subtest.non_empty);
    let kinds: Vec<FailureKind> = subtest.failures.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![FailureKind::ErrorMismatch, FailureKind::DocumentsMismatch]);
}

#[tokio::test]
async fn failing_compat_is_a_hard_failure() {
    let broken = Quirks {
        fail_commands: true,
        ..Quirks::default()
    };
    let runner = runner_with(Quirks::default(), broken, int_providers(), RunOptions::default());
    let scenarios = table([(
        "SetInt32",
        set_int32()
            .providers(["Int32s"])
            .fails_for("https://tracker.example/unrelated", ["Int32s"]),
    )]);

    let report = runner.run(&Context::background(), FAMILY, scenarios).await;
    let subtest = report.scenario("SetInt32").unwrap().subtest("Int32s").unwrap();
    // Gated, so the compat failure is downgraded along with everything else.
    assert!(subtest.passed());
    assert_eq!(
        subtest.expected_failures[0].failure.kind,
        FailureKind::CompatError
    );
}

#[tokio::test]
async fn gated_compat_failure_cannot_hide_a_target_write() {
    let broken = Quirks {
        fail_commands: true,
        ..Quirks::default()
    };
    let runner = runner_with(Quirks::default(), broken, int_providers(), RunOptions::default());
    let scenarios = table([(
        "MustBeRejected",
        Scenario::new(doc! {
            "query": { "_id": "int32" },
            "update": { "$set": { "v": 43_i32 } },
            "new": true,
        })
        .providers(["Int32s"])
        .expect_none()
        .fails("https://tracker.example/compat-outage"),
    )]);

    let report = runner.run(&Context::background(), FAMILY, scenarios).await;
    let scenario = report.scenario("MustBeRejected").unwrap();
    let subtest = scenario.subtest("Int32s").unwrap();
    assert!(subtest.gated());
    assert!(subtest.non_empty);
    assert_eq!(
        scenario.verdict,
        doccompat_core::Verdict::Fail {
            reason: "expected empty results".to_string()
        }
    );
    assert!(!report.is_success());
    assert_eq!(
        runner.provisioner().target().documents("FindAndModify-MustBeRejected_Int32s"),
        vec![doc! { "_id": "int32", "v": 43_i32 }]
    );
}

// ============================================================================
// Policies, options, setup errors
// ============================================================================

#[tokio::test]
async fn strict_policy_flags_stale_gate() {
    let scenarios = || {
        table([(
            "Fixed",
            set_int32()
                .providers(["Int32s"])
                .fails("https://tracker.example/fixed"),
        )])
    };

    let tolerant = runner(Quirks::default(), int_providers());
    tolerant
        .run(&Context::background(), FAMILY, scenarios())
        .await
        .assert_passed();

    let strict = runner_with(
        Quirks::default(),
        Quirks::default(),
        int_providers(),
        RunOptions {
            known_failures: KnownFailurePolicy::Strict,
            ..RunOptions::default()
        },
    );
    let report = strict.run(&Context::background(), FAMILY, scenarios()).await;
    let subtest = report.scenario("Fixed").unwrap().subtest("Int32s").unwrap();
    assert_eq!(subtest.failures.len(), 1);
    assert_eq!(subtest.failures[0].kind, FailureKind::UnexpectedPass);
    assert!(subtest.failures[0].message.contains("expected failure did not occur"));
}

#[tokio::test]
async fn unknown_provider_aborts_only_its_scenario() {
    let runner = runner(Quirks::default(), int_providers());
    let scenarios = table([
        ("Broken", set_int32().providers(["Int128s"])),
        ("Fine", set_int32().providers(["Int32s"])),
    ]);

    let report = runner.run(&Context::background(), FAMILY, scenarios).await;
    let broken = report.scenario("Broken").unwrap();
    assert!(broken.error.as_deref().unwrap().contains("Int128s"));
    assert!(broken.subtests.is_empty());
    assert!(report.scenario("Fine").unwrap().passed());
}

#[tokio::test]
async fn invalid_scenario_is_rejected_before_provisioning() {
    let runner = runner(Quirks::default(), int_providers());
    let scenarios = table([(
        "NamesCollection",
        Scenario::new(doc! { "findAndModify": "elsewhere", "remove": true }),
    )]);

    let report = runner.run(&Context::background(), FAMILY, scenarios).await;
    assert!(report.scenario("NamesCollection").unwrap().error.is_some());
    assert!(runner.provisioner().target().collection_names().is_empty());
}

#[tokio::test]
async fn bounded_parallelism_runs_every_scenario() {
    let runner = runner_with(
        Quirks::default(),
        Quirks::default(),
        int_providers(),
        RunOptions {
            parallelism: 1,
            ..RunOptions::default()
        },
    );
    let scenarios = table((0..5).map(|i| {
        (
            format!("Remove{}", i),
            Scenario::new(doc! { "query": { "_id": "int32" }, "remove": true })
                .providers(["Int32s"]),
        )
    }));

    let report = runner.run(&Context::background(), FAMILY, scenarios).await;
    report.assert_passed();
    let names: Vec<&str> = report.scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Remove0", "Remove1", "Remove2", "Remove3", "Remove4"]);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn timeout_releases_cursors() {
    let slow = Quirks {
        cursor_latency: Some(Duration::from_secs(10)),
        ..Quirks::default()
    };
    let runner = runner_with(
        slow.clone(),
        slow,
        int_providers(),
        RunOptions {
            timeout: Some(Duration::from_millis(200)),
            ..RunOptions::default()
        },
    );
    let scenarios = table([("SetInt32", set_int32().providers(["Int32s"]))]);

    let report = runner.run(&Context::background(), FAMILY, scenarios).await;
    let subtest = report.scenario("SetInt32").unwrap().subtest("Int32s").unwrap();
    assert!(subtest.failures.iter().any(|f| f.kind == FailureKind::Interrupted));
    assert_eq!(runner.provisioner().target().open_cursors(), 0);
    assert_eq!(runner.provisioner().compat().open_cursors(), 0);
}

#[tokio::test]
async fn cancellation_stops_slow_commands() {
    let slow = Quirks {
        command_latency: Some(Duration::from_secs(10)),
        ..Quirks::default()
    };
    let runner = runner_with(slow.clone(), slow, int_providers(), RunOptions::default());
    let (ctx, handle) = Context::cancellable();
    let scenarios = table([("SetInt32", set_int32().providers(["Int32s"]))]);

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.cancel();
    });
    let report = runner.run(&ctx, FAMILY, scenarios).await;
    canceller.await.unwrap();

    let subtest = report.scenario("SetInt32").unwrap().subtest("Int32s").unwrap();
    assert_eq!(subtest.failures[0].kind, FailureKind::Interrupted);
    assert!(subtest.failures[0].message.contains("cancelled"));
}
