use crate::error::PoolError;
use crate::handle::CompletionSlot;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use tracing::{error, trace};

/// The type of workload that the pool executes: a one-shot closure producing
/// a value of type `R`. It must be `Send` and `'static`.
pub type TaskToExecute<R> = Box<dyn FnOnce() -> R + Send + 'static>;

/// Internal representation of a task managed by the pool.
///
/// The completion slot is shared with the `TaskHandle` returned at
/// submission; both sides may outlive the queue entry.
pub(crate) struct ManagedTaskInternal<R: Send + 'static> {
  pub(crate) task_id: u64,
  pub(crate) work: TaskToExecute<R>,
  pub(crate) completion: Arc<CompletionSlot<R>>,
}

impl<R: Send + 'static> ManagedTaskInternal<R> {
  /// Runs the workload and delivers its outcome to the paired handle.
  ///
  /// A panicking workload is caught and delivered as
  /// `Err(PoolError::TaskPanicked)` so the executing worker survives.
  pub(crate) fn execute(self) {
    let task_id = self.task_id;
    let outcome = match std::panic::catch_unwind(AssertUnwindSafe(self.work)) {
      Ok(value) => {
        trace!(%task_id, "Task executed successfully.");
        Ok(value)
      }
      Err(_panic_payload) => {
        error!(%task_id, "Task panicked during execution.");
        Err(PoolError::TaskPanicked)
      }
    };
    self.completion.deliver(outcome);
  }
}
