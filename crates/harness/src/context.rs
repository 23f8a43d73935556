//! Cancellation and deadlines for backend calls
//!
//! A [`Context`] is cheap to clone and is handed to every sub-test. Every
//! backend future goes through [`Context::run`], which drops the future
//! (aborting the call) as soon as the context is cancelled or its deadline
//! passes.

use std::future::Future;
use std::time::Duration;

use doccompat_core::{BackendError, BackendResult};
use tokio::sync::watch;
use tokio::time::Instant;

/// Cancellation signal plus an optional deadline.
#[derive(Debug, Clone)]
pub struct Context {
    cancel: watch::Receiver<bool>,
    deadline: Option<Instant>,
}

/// Cancels every [`Context`] derived from the one it was created with.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self {
            cancel: rx,
            deadline: None,
        }
    }

    /// A fresh cancellable context.
    pub fn cancellable() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                cancel: rx,
                deadline: None,
            },
            CancelHandle { tx },
        )
    }

    /// Derive a context that also expires after `timeout`.
    ///
    /// An earlier existing deadline is kept.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context that also expires at `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing <= deadline => existing,
            _ => deadline,
        };
        Self {
            cancel: self.cancel.clone(),
            deadline: Some(deadline),
        }
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once the context was cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// The error this context currently fails with, if it is done.
    pub fn err(&self) -> Option<BackendError> {
        if self.is_cancelled() {
            Some(BackendError::Cancelled)
        } else if self.deadline.map_or(false, |d| Instant::now() >= d) {
            Some(BackendError::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Resolves when the context is cancelled. Never resolves for a
    /// context whose handle was dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.cancel.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Drive `fut` to completion unless the context finishes first.
    ///
    /// # Errors
    ///
    /// `BackendError::Cancelled` or `BackendError::DeadlineExceeded` when the
    /// context finished first, otherwise whatever `fut` returned.
    pub async fn run<F, T>(&self, fut: F) -> BackendResult<T>
    where
        F: Future<Output = BackendResult<T>>,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(BackendError::Cancelled),
            _ = expired => Err(BackendError::DeadlineExceeded),
            result = fut => result,
        }
    }
}
