//! Dual executor
//!
//! Runs one command template against one target/compat collection pair and
//! compares in two stages:
//! 1. the command response, or the command error structurally
//! 2. the full collection contents re-read in `_id` order
//!
//! Stage 2 always runs, including after a command error, so partially
//! applied writes show up. Transport and decode errors never compare equal;
//! they are reported as [`FailureKind::Transport`]. All findings go to the sub-test's
//! [`FailureReporter`]; nothing here panics.

use bson::{Bson, Document};

use doccompat_core::{
    build_command, collect_ids, diff_documents, diff_sequences, documents_equal, errors_equal,
    format_ids, sequence_equal, BackendError, BackendResult, Collection, CollectionPair, Difference,
    Outcome,
};

use crate::context::Context;
use crate::cursor::find_all;
use crate::reporter::{Failure, FailureKind, FailureReporter};

/// What one pair observed.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// First mismatching stage, or `Match`
    pub outcome: Outcome,
    /// A command reply carried a result, or the command succeeded on both
    /// systems and either collection holds documents
    pub non_empty: bool,
    /// Command error from the target, if any
    pub target_error: Option<BackendError>,
    /// Command error from compat, if any
    pub compat_error: Option<BackendError>,
}

/// Issues one command against both collections of a pair.
#[derive(Debug, Clone, Copy)]
pub struct DualExecutor<'a> {
    ctx: &'a Context,
    operation: &'a str,
}

impl<'a> DualExecutor<'a> {
    /// Executor for `operation` (the command name, e.g. `findAndModify`).
    pub fn new(ctx: &'a Context, operation: &'a str) -> Self {
        Self { ctx, operation }
    }

    /// Run `template` against `pair` and report every mismatch.
    pub async fn execute<C: Collection>(
        &self,
        template: &Document,
        pair: &CollectionPair<C>,
        reporter: &dyn FailureReporter,
    ) -> Execution {
        let target = pair.target.as_ref();
        let compat = pair.compat.as_ref();
        let target_command = build_command(self.operation, target.name(), template);
        let compat_command = build_command(self.operation, compat.name(), template);

        let (target_reply, compat_reply) = tokio::join!(
            self.ctx.run(target.run_command(target_command)),
            self.ctx.run(compat.run_command(compat_command)),
        );

        let mut execution = Execution {
            outcome: Outcome::Match,
            non_empty: false,
            target_error: target_reply.as_ref().err().cloned(),
            compat_error: compat_reply.as_ref().err().cloned(),
        };

        let mut responded = false;
        match (&target_reply, &compat_reply) {
            (Err(e), _) | (_, Err(e)) if e.is_interrupted() => {
                return interrupted(execution, e, reporter);
            }
            (target, compat) if !server_verdict(target) || !server_verdict(compat) => {
                if let Err(e) = target {
                    reporter.log(format!("Target error: {}", e));
                }
                if let Err(e) = compat {
                    reporter.log(format!("Compat error: {}", e));
                }
                execution.outcome = Outcome::ErrorMismatch;
                execution.non_empty = reply_non_empty(target) || reply_non_empty(compat);
                reporter.fail(Failure::new(
                    FailureKind::Transport,
                    format!(
                        "command did not reach a server verdict\ncompat: {}\ntarget: {}",
                        describe(compat),
                        describe(target)
                    ),
                ));
            }
            (Err(target_err), compat) => {
                reporter.log(format!("Target error: {}", target_err));
                match compat {
                    Err(compat_err) => {
                        reporter.log(format!("Compat error: {}", compat_err));
                        if !errors_equal(compat_err, target_err) {
                            execution.outcome = Outcome::ErrorMismatch;
                            reporter.fail(Failure::new(
                                FailureKind::ErrorMismatch,
                                format!(
                                    "errors differ\ncompat: {}\ntarget: {}",
                                    compat_err, target_err
                                ),
                            ));
                        }
                    }
                    Ok(compat_doc) => {
                        execution.outcome = Outcome::ErrorMismatch;
                        execution.non_empty = response_non_empty(compat_doc);
                        reporter.fail(Failure::new(
                            FailureKind::ErrorMismatch,
                            format!(
                                "target failed but compat succeeded\ncompat: {}\ntarget: {}",
                                compat_doc, target_err
                            ),
                        ));
                    }
                }
            }
            (Ok(target_doc), Err(compat_err)) => {
                reporter.log(format!("Compat error: {}", compat_err));
                execution.outcome = Outcome::ErrorMismatch;
                execution.non_empty = response_non_empty(target_doc);
                reporter.fail(Failure::new(
                    FailureKind::CompatError,
                    format!(
                        "compat failed but target succeeded\ncompat: {}\ntarget: {}",
                        compat_err, target_doc
                    ),
                ));
            }
            (Ok(target_doc), Ok(compat_doc)) => {
                responded = true;
                execution.non_empty =
                    response_non_empty(target_doc) || response_non_empty(compat_doc);
                if !documents_equal(compat_doc, target_doc) {
                    execution.outcome = Outcome::ResponseMismatch;
                    reporter.fail(Failure::new(
                        FailureKind::ResponseMismatch,
                        mismatch_message(
                            "responses differ",
                            &compat_doc.to_string(),
                            &target_doc.to_string(),
                            &diff_documents(compat_doc, target_doc),
                        ),
                    ));
                }
            }
        }

        let (target_docs, compat_docs) =
            tokio::join!(find_all(self.ctx, target), find_all(self.ctx, compat));
        let stored_non_empty = compare_contents(&mut execution, target_docs, compat_docs, reporter);
        if responded {
            execution.non_empty |= stored_non_empty;
        }
        execution
    }
}

/// False for transport and decode failures.
fn server_verdict(reply: &BackendResult<Document>) -> bool {
    match reply {
        Ok(_) => true,
        Err(e) => e.as_command().is_some(),
    }
}

fn reply_non_empty(reply: &BackendResult<Document>) -> bool {
    reply.as_ref().map_or(false, response_non_empty)
}

fn describe(reply: &BackendResult<Document>) -> String {
    match reply {
        Ok(doc) => doc.to_string(),
        Err(e) => e.to_string(),
    }
}

fn interrupted(
    mut execution: Execution,
    err: &BackendError,
    reporter: &dyn FailureReporter,
) -> Execution {
    execution.outcome = Outcome::ErrorMismatch;
    reporter.fail(Failure::new(FailureKind::Interrupted, err.to_string()));
    execution
}

/// Stage 2. Returns whether either side holds any document.
fn compare_contents(
    execution: &mut Execution,
    target: BackendResult<Vec<Document>>,
    compat: BackendResult<Vec<Document>>,
    reporter: &dyn FailureReporter,
) -> bool {
    match (target, compat) {
        (Ok(target), Ok(compat)) => {
            reporter.log(format!("Compat IDs: {}", format_ids(&collect_ids(&compat))));
            reporter.log(format!("Target IDs: {}", format_ids(&collect_ids(&target))));
            if !sequence_equal(&compat, &target) {
                execution.outcome = execution.outcome.or(Outcome::DocumentsMismatch);
                reporter.fail(Failure::new(
                    FailureKind::DocumentsMismatch,
                    mismatch_message(
                        "documents differ",
                        &render(&compat),
                        &render(&target),
                        &diff_sequences(&compat, &target),
                    ),
                ));
            }
            !target.is_empty() || !compat.is_empty()
        }
        (Err(target_err), Ok(_)) => {
            reporter.log(format!("Target error: {}", target_err));
            execution.outcome = execution.outcome.or(Outcome::DocumentsMismatch);
            reporter.fail(Failure::new(
                FailureKind::ReadError,
                format!("reading target documents failed: {}", target_err),
            ));
            false
        }
        (Ok(_), Err(compat_err)) => {
            reporter.log(format!("Compat error: {}", compat_err));
            execution.outcome = execution.outcome.or(Outcome::DocumentsMismatch);
            reporter.fail(Failure::new(
                FailureKind::CompatError,
                format!("reading compat documents failed: {}", compat_err),
            ));
            false
        }
        (Err(target_err), Err(compat_err)) => {
            reporter.log(format!("Target error: {}", target_err));
            reporter.log(format!("Compat error: {}", compat_err));
            execution.outcome = execution.outcome.or(Outcome::DocumentsMismatch);
            let kind = if target_err.is_interrupted() || compat_err.is_interrupted() {
                FailureKind::Interrupted
            } else {
                FailureKind::ReadError
            };
            reporter.fail(Failure::new(
                kind,
                format!("reading documents failed\ncompat: {}\ntarget: {}", compat_err, target_err),
            ));
            false
        }
    }
}

/// True when a command reply carries a result.
///
/// A `findAndModify` reply is non-empty when its `value` is present and not
/// null. Other replies count as non-empty when they carry any field besides
/// `ok`.
pub fn response_non_empty(reply: &Document) -> bool {
    match reply.get("value") {
        Some(value) => !matches!(value, Bson::Null),
        None => reply.keys().any(|k| k != "ok"),
    }
}

fn render(docs: &[Document]) -> String {
    let parts: Vec<String> = docs.iter().map(|d| d.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

fn mismatch_message(what: &str, compat: &str, target: &str, diffs: &[Difference]) -> String {
    let mut message = format!("{}\ncompat: {}\ntarget: {}", what, compat, target);
    for diff in diffs {
        message.push_str("\n  ");
        message.push_str(&diff.to_string());
    }
    message
}
