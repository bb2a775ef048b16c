use std::fmt;
use std::io;
use std::thread::{self, JoinHandle};

use tracing::trace;

/// A single pool worker: a named OS thread running the pool's dispatch loop.
///
/// The pool keeps one `Worker` per live thread in an identity-keyed registry.
/// A worker that leaves its dispatch loop removes its own entry before the
/// thread returns, dropping the handle and detaching the thread; registry
/// emptiness doubles as the drained signal at shutdown.
pub(crate) struct Worker {
  id: u64,
  thread: JoinHandle<()>,
}

impl fmt::Debug for Worker {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Worker")
      .field("id", &self.id)
      .field("thread", &self.thread.thread().name())
      .finish()
  }
}

impl Worker {
  /// Spawns the dispatch thread and wraps it with its pool-issued identity.
  ///
  /// The caller must hold the pool lock across this call and the registry
  /// insert that follows it: the new thread's first action is to take that
  /// same lock, so it cannot observe a registry without its own entry.
  pub(crate) fn spawn<F>(id: u64, pool_name: &str, dispatch: F) -> io::Result<Self>
  where
    F: FnOnce(u64) + Send + 'static,
  {
    let thread = thread::Builder::new()
      .name(format!("{pool_name}-worker-{id}"))
      .spawn(move || dispatch(id))?;
    trace!(pool_name, worker_id = id, "Spawned worker thread.");
    Ok(Self { id, thread })
  }

  /// Returns the stable identity issued by the pool.
  pub(crate) fn id(&self) -> u64 {
    self.id
  }
}
