use thiserror::Error;

/// Errors that can occur within the `thread_orchestra` pool.
#[derive(Error, Debug, PartialEq)]
pub enum PoolError {
  #[error("Task queue stayed full for the whole submission wait window, task rejected")]
  QueueFull,

  #[error("Pool is not running, cannot accept new tasks")]
  NotRunning,

  #[error("Submitted workload panicked during execution")]
  TaskPanicked,

  #[error("Failed to spawn a worker thread: {0}")]
  WorkerSpawn(String),

  #[error("Task result was not available when the handle was signalled")]
  ResultUnavailable,
}
