use crate::error::PoolError;
use crate::semaphore::Semaphore;

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

/// Shared slot through which a worker hands a task's outcome to its handle.
///
/// `deliver` stores the outcome before posting the semaphore, so a waiter
/// that returns from `wait` always observes the stored value.
pub(crate) struct CompletionSlot<R: Send + 'static> {
  outcome: Mutex<Option<Result<R, PoolError>>>,
  ready: Semaphore,
}

impl<R: Send + 'static> CompletionSlot<R> {
  pub(crate) fn new() -> Self {
    Self {
      outcome: Mutex::new(None),
      ready: Semaphore::new(0),
    }
  }

  /// Stores the outcome, then signals readiness. Called exactly once per
  /// task, by the worker that executed it.
  pub(crate) fn deliver(&self, outcome: Result<R, PoolError>) {
    *self.outcome.lock() = Some(outcome);
    self.ready.post();
  }

  /// Blocks until an outcome has been delivered, then moves it out.
  pub(crate) fn take(&self) -> Result<R, PoolError> {
    self.ready.wait();
    match self.outcome.lock().take() {
      Some(outcome) => outcome,
      None => Err(PoolError::ResultUnavailable),
    }
  }
}

/// A handle to a task accepted by the pool.
///
/// Allows awaiting the task's outcome from the submitting thread.
pub struct TaskHandle<R: Send + 'static> {
  pub(crate) task_id: u64,
  pub(crate) completion: Arc<CompletionSlot<R>>,
}

impl<R: Send + 'static> TaskHandle<R> {
  /// Returns the unique ID of this task.
  pub fn id(&self) -> u64 {
    self.task_id
  }

  /// Blocks the calling thread until the task has run, then returns its
  /// outcome. Consumes the handle; the value is moved out to the caller.
  ///
  /// # Errors
  /// Returns `PoolError::TaskPanicked` if the workload panicked while
  /// executing.
  pub fn wait_result(self) -> Result<R, PoolError> {
    let outcome = self.completion.take();
    if matches!(outcome, Err(PoolError::ResultUnavailable)) {
      // The slot was signalled ready but held no value. The store-then-post
      // ordering in `deliver` rules this out for well-behaved workers.
      warn!(task_id = %self.task_id, "Completion slot was empty after the ready signal.");
    }
    outcome
  }
}
