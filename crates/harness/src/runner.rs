//! Scenario runner
//!
//! `run` consumes one scenario table. Every scenario becomes a task on a
//! `JoinSet`; every collection pair of a scenario becomes a sub-test task on
//! that scenario's own `JoinSet`. Sub-tests hand their report back through
//! the join handle, so nothing is shared between tasks.
//!
//! Per scenario:
//! 1. validate and resolve providers
//! 2. provision `<family>-<scenario>_<provider>` pairs (finishes before any read)
//! 3. run one gated or ungated sub-test per pair
//! 4. classify the per-pair non-empty flags against the expectation

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::Instrument;

use doccompat_core::{
    classify, provider_from_collection, Collection, CollectionPair, Expectation,
    FixtureProvisioner, ProviderRegistry, Scenario, ScenarioTable,
};

use crate::config::{HarnessConfig, KnownFailurePolicy};
use crate::context::Context;
use crate::executor::DualExecutor;
use crate::report::{RunReport, ScenarioReport, SubtestReport};
use crate::reporter::{
    should_gate, Failure, FailureKind, FailureReporter, KnownFailureReporter, Recorder,
};

/// Runner tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Per-scenario timeout
    pub timeout: Option<Duration>,
    /// Maximum concurrently running scenarios; 0 means unbounded
    pub parallelism: usize,
    /// Handling of gated sub-tests that pass
    pub known_failures: KnownFailurePolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions::from(&HarnessConfig::default())
    }
}

impl From<&HarnessConfig> for RunOptions {
    fn from(config: &HarnessConfig) -> Self {
        Self {
            timeout: config.timeout(),
            parallelism: config.parallelism,
            known_failures: config.known_failures,
        }
    }
}

/// Drives scenario tables against a fixture provisioner.
pub struct ScenarioRunner<P: FixtureProvisioner> {
    provisioner: Arc<P>,
    registry: Arc<ProviderRegistry>,
    operation: Arc<str>,
    options: RunOptions,
}

impl<P: FixtureProvisioner> ScenarioRunner<P> {
    /// Runner sending `operation` commands through `provisioner`'s collections.
    pub fn new(provisioner: P, registry: ProviderRegistry, operation: &str) -> Self {
        Self {
            provisioner: Arc::new(provisioner),
            registry: Arc::new(registry),
            operation: Arc::from(operation),
            options: RunOptions::default(),
        }
    }

    /// Replace the run options.
    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// The provisioner.
    pub fn provisioner(&self) -> &P {
        &self.provisioner
    }

    /// The run options.
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run every scenario of `table` concurrently under `ctx`.
    ///
    /// Never fails: setup errors, mismatches and panics all end up in the
    /// report.
    pub async fn run(&self, ctx: &Context, family: &str, table: ScenarioTable) -> RunReport {
        let semaphore = (self.options.parallelism > 0)
            .then(|| Arc::new(Semaphore::new(self.options.parallelism)));
        let mut expected: Vec<(String, Expectation)> = Vec::with_capacity(table.len());
        let mut set = JoinSet::new();

        for (name, scenario) in table {
            expected.push((name.clone(), scenario.expectation()));
            let task = ScenarioTask {
                provisioner: Arc::clone(&self.provisioner),
                registry: Arc::clone(&self.registry),
                operation: Arc::clone(&self.operation),
                options: self.options.clone(),
                ctx: ctx.clone(),
                family: family.to_string(),
                name: name.clone(),
                scenario: Arc::new(scenario),
            };
            let semaphore = semaphore.clone();
            let span = tracing::info_span!("scenario", family = %family, scenario = %name);
            set.spawn(
                async move {
                    let _permit = match semaphore {
                        Some(s) => s.acquire_owned().await.ok(),
                        None => None,
                    };
                    let (family, name, expectation) =
                        (task.family.clone(), task.name.clone(), task.scenario.expectation());
                    match isolated(task.run().in_current_span()).await {
                        Ok(report) => report,
                        Err(panic) => ScenarioReport::aborted(
                            &family,
                            &name,
                            expectation,
                            format!("scenario panicked: {}", panic),
                        ),
                    }
                }
                .instrument(span),
            );
        }

        let mut scenarios = Vec::with_capacity(expected.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(report) => scenarios.push(report),
                Err(e) => {
                    tracing::error!(family = %family, error = %e, "Scenario task did not complete")
                }
            }
        }
        for (name, expectation) in expected {
            if !scenarios.iter().any(|s| s.name == name) {
                scenarios.push(ScenarioReport::aborted(
                    family,
                    &name,
                    expectation,
                    "scenario task did not complete".to_string(),
                ));
            }
        }
        scenarios.sort_by(|a, b| a.name.cmp(&b.name));

        let report = RunReport {
            family: family.to_string(),
            scenarios,
        };
        tracing::info!(
            family = %family,
            scenarios = report.scenarios.len(),
            passed = report.passed_count(),
            "Run finished"
        );
        report
    }
}

struct ScenarioTask<P> {
    provisioner: Arc<P>,
    registry: Arc<ProviderRegistry>,
    operation: Arc<str>,
    options: RunOptions,
    ctx: Context,
    family: String,
    name: String,
    scenario: Arc<Scenario>,
}

impl<P: FixtureProvisioner> ScenarioTask<P> {
    async fn run(self) -> ScenarioReport {
        let expectation = self.scenario.expectation();
        let abort = |error: String| {
            tracing::error!(error = %error, "Scenario aborted");
            ScenarioReport::aborted(&self.family, &self.name, expectation, error)
        };

        if let Err(e) = self.scenario.validate(&self.name, &self.operation) {
            return abort(e.to_string());
        }
        let providers = match self.registry.resolve(self.scenario.provider_names()) {
            Ok(providers) => providers,
            Err(e) => return abort(e.to_string()),
        };

        let ctx = match self.options.timeout {
            Some(timeout) => self.ctx.with_timeout(timeout),
            None => self.ctx.clone(),
        };
        let base = format!("{}-{}", self.family, self.name);
        let pairs = match ctx.run(self.provisioner.provision(&base, &providers)).await {
            Ok(pairs) => pairs,
            Err(e) => return abort(format!("provisioning failed: {}", e)),
        };
        tracing::debug!(base = %base, collections = pairs.len(), "Provisioned collections");

        let mut labels = Vec::with_capacity(pairs.len());
        let mut set = JoinSet::new();
        for (index, pair) in pairs.into_iter().enumerate() {
            let collection = pair.target.name().to_string();
            let provider = provider_from_collection(&collection).to_string();
            let span =
                tracing::info_span!("subtest", provider = %provider, collection = %collection);
            let subtest = Subtest {
                ctx: ctx.clone(),
                operation: Arc::clone(&self.operation),
                scenario: Arc::clone(&self.scenario),
                policy: self.options.known_failures,
                provider: provider.clone(),
                collection: collection.clone(),
                pair,
            };
            labels.push((provider, collection));
            set.spawn(
                async move { (index, isolated(subtest.run().in_current_span()).await) }
                    .instrument(span),
            );
        }

        let mut slots: Vec<Option<SubtestReport>> = (0..labels.len()).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => {
                    let (provider, collection) = &labels[index];
                    slots[index] = Some(result.unwrap_or_else(|panic| {
                        tracing::error!(provider = %provider, panic = %panic, "Sub-test panicked");
                        SubtestReport::panicked(provider.clone(), collection.clone(), panic)
                    }));
                }
                Err(e) => tracing::error!(error = %e, "Sub-test task did not complete"),
            }
        }
        let subtests: Vec<SubtestReport> = slots
            .into_iter()
            .zip(labels)
            .map(|(slot, (provider, collection))| {
                slot.unwrap_or_else(|| {
                    SubtestReport::panicked(
                        provider,
                        collection,
                        "sub-test task did not complete".to_string(),
                    )
                })
            })
            .collect();

        let flags: Vec<bool> = subtests.iter().map(|s| s.non_empty).collect();
        let verdict = classify(expectation, &flags, self.scenario.known_failure().is_some());
        if verdict.is_pass() {
            if expectation == Expectation::MustProduceResults {
                let gated_empty = subtests.iter().filter(|s| s.gated() && !s.non_empty).count();
                if gated_empty > 0 {
                    tracing::debug!(
                        gated_empty,
                        "Results requirement met while gated providers produced nothing"
                    );
                }
            }
            tracing::info!(verdict = %verdict, "Scenario classified");
        } else {
            tracing::error!(verdict = %verdict, "Scenario classified");
        }

        ScenarioReport {
            family: self.family.clone(),
            name: self.name.clone(),
            expectation,
            verdict,
            error: None,
            subtests,
        }
    }
}

struct Subtest<C> {
    ctx: Context,
    operation: Arc<str>,
    scenario: Arc<Scenario>,
    policy: KnownFailurePolicy,
    provider: String,
    collection: String,
    pair: CollectionPair<C>,
}

impl<C: Collection> Subtest<C> {
    async fn run(self) -> SubtestReport {
        let recorder = Recorder::new();
        let reference = if should_gate(&self.scenario, &self.provider) {
            self.scenario.known_failure().map(|kf| kf.reference().to_string())
        } else {
            None
        };

        let execution = {
            let gate;
            let reporter: &dyn FailureReporter = match &reference {
                Some(reference) => {
                    gate = KnownFailureReporter::new(&recorder, reference);
                    &gate
                }
                None => &recorder,
            };
            DualExecutor::new(&self.ctx, &self.operation)
                .execute(self.scenario.command(), &self.pair, reporter)
                .await
        };

        if let Some(reference) = &reference {
            if self.policy == KnownFailurePolicy::Strict && recorder.expected_count() == 0 {
                recorder.fail(Failure::new(
                    FailureKind::UnexpectedPass,
                    format!("expected failure did not occur ({})", reference),
                ));
            }
        }

        SubtestReport::new(
            self.provider,
            self.collection,
            execution.outcome,
            execution.non_empty,
            reference,
            recorder.finish(),
        )
    }
}

/// Aborts the task when dropped.
struct TaskGuard<T>(JoinHandle<T>);

impl<T> Drop for TaskGuard<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl<T> Future for TaskGuard<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

/// Run `fut` on its own task so a panic comes back as `Err(message)`.
async fn isolated<F>(fut: F) -> Result<F::Output, String>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    TaskGuard(tokio::spawn(fut)).await.map_err(panic_message)
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
