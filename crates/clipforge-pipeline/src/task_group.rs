//! Bounded task group: run many units of work under a concurrency ceiling.
//!
//! Every unit is spawned onto the tokio runtime immediately but must acquire
//! a semaphore slot before it starts, so at most `ceiling` units run at any
//! instant. Units receive the group's [`CancellationToken`]; a unit that has
//! not yet acquired a slot when the token fires is skipped without running.
//!
//! In [`GroupMode::FailFast`] the first failing unit cancels the token. In
//! [`GroupMode::CollectAll`] failures are recorded and siblings carry on.

use std::future::Future;
use std::sync::Arc;

use clipforge_core::{Error, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Failure discipline for a [`BoundedTaskGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMode {
    /// The first error cancels every unit that has not started and signals
    /// running units; [`BoundedTaskGroup::join`] returns that error.
    FailFast,
    /// Errors never affect siblings; `join` returns every outcome.
    CollectAll,
}

/// What happened to one submitted unit.
#[derive(Debug)]
pub enum UnitOutcome<T> {
    Succeeded(T),
    Failed(Error),
    /// Cancelled before it acquired a slot, or it observed cancellation and
    /// returned [`Error::Cancelled`].
    Skipped,
}

impl<T> UnitOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// Runs units of work with at most `ceiling` in flight.
///
/// # Example
///
/// ```no_run
/// use clipforge_pipeline::{BoundedTaskGroup, GroupMode};
///
/// # async fn example() -> clipforge_core::Result<()> {
/// let mut group = BoundedTaskGroup::new(2, GroupMode::CollectAll);
/// for i in 0..10u32 {
///     group.spawn(move |_cancel| async move { Ok(i * 2) });
/// }
/// let outcomes = group.join().await?;
/// assert_eq!(outcomes.len(), 10);
/// # Ok(())
/// # }
/// ```
pub struct BoundedTaskGroup<T> {
    mode: GroupMode,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    tasks: JoinSet<(usize, UnitOutcome<T>)>,
    submitted: usize,
}

impl<T: Send + 'static> BoundedTaskGroup<T> {
    /// Create a group with its own cancellation root.
    ///
    /// A ceiling of zero is treated as one.
    pub fn new(ceiling: usize, mode: GroupMode) -> Self {
        Self::with_token(ceiling, mode, CancellationToken::new())
    }

    /// Create a group cancelled whenever `parent` is.
    ///
    /// Cancelling the group never cancels the parent.
    pub fn with_parent(ceiling: usize, mode: GroupMode, parent: &CancellationToken) -> Self {
        Self::with_token(ceiling, mode, parent.child_token())
    }

    fn with_token(ceiling: usize, mode: GroupMode, cancel: CancellationToken) -> Self {
        Self {
            mode,
            semaphore: Arc::new(Semaphore::new(ceiling.max(1))),
            cancel,
            tasks: JoinSet::new(),
            submitted: 0,
        }
    }

    /// Number of units submitted so far.
    pub fn len(&self) -> usize {
        self.submitted
    }

    pub fn is_empty(&self) -> bool {
        self.submitted == 0
    }

    /// The token handed to every unit.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Submit a unit. It starts once a slot is free.
    pub fn spawn<F, Fut>(&mut self, unit: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let index = self.submitted;
        self.submitted += 1;

        let semaphore = self.semaphore.clone();
        let cancel = self.cancel.clone();
        let mode = self.mode;

        self.tasks.spawn(async move {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => return (index, UnitOutcome::Skipped),
                permit = semaphore.acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_closed) => return (index, UnitOutcome::Skipped),
                },
            };

            let result = unit(cancel.clone()).await;
            drop(permit);

            let outcome = match result {
                Ok(value) => UnitOutcome::Succeeded(value),
                Err(Error::Cancelled) => UnitOutcome::Skipped,
                Err(e) => {
                    if mode == GroupMode::FailFast && !cancel.is_cancelled() {
                        tracing::debug!("Unit {index} failed; cancelling group: {e}");
                        cancel.cancel();
                    }
                    UnitOutcome::Failed(e)
                }
            };
            (index, outcome)
        });
    }

    /// Signal cancellation to every unit.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for every submitted unit to finish or be skipped.
    ///
    /// Outcomes are returned in submission order regardless of completion
    /// order. A panicking unit re-raises its panic here.
    ///
    /// # Errors
    ///
    /// In [`GroupMode::FailFast`], the error of the first unit to fail (in
    /// completion order). [`GroupMode::CollectAll`] never returns `Err`.
    pub async fn join(mut self) -> Result<Vec<UnitOutcome<T>>> {
        let mut slots: Vec<Option<UnitOutcome<T>>> = Vec::with_capacity(self.submitted);
        slots.resize_with(self.submitted, || None);
        let mut first_failure: Option<usize> = None;

        while let Some(joined) = self.tasks.join_next().await {
            let (index, outcome) = match joined {
                Ok(pair) => pair,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => return Err(Error::Internal(format!("task group unit aborted: {e}"))),
            };
            if outcome.is_failure() && first_failure.is_none() {
                first_failure = Some(index);
            }
            slots[index] = Some(outcome);
        }

        let mut outcomes: Vec<UnitOutcome<T>> = slots
            .into_iter()
            .map(|slot| slot.unwrap_or(UnitOutcome::Skipped))
            .collect();

        if self.mode == GroupMode::FailFast {
            if let Some(index) = first_failure {
                if let UnitOutcome::Failed(e) =
                    std::mem::replace(&mut outcomes[index], UnitOutcome::Skipped)
                {
                    return Err(e);
                }
            }
        }

        Ok(outcomes)
    }
}
