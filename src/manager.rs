use crate::error::PoolError;
use crate::handle::{CompletionSlot, TaskHandle};
use crate::task::{ManagedTaskInternal, TaskToExecute};
use crate::worker::Worker;

use std::collections::{HashMap, VecDeque};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, trace, warn};

/// How long `submit` waits for queue headroom before rejecting a task.
const SUBMIT_WAIT: Duration = Duration::from_secs(1);
/// How often a cached-mode worker wakes from an empty queue to reconsider
/// whether it should keep existing.
const IDLE_POLL: Duration = Duration::from_secs(1);
/// How long a cached-mode worker above the initial baseline may stay idle
/// before it retires itself.
const MAX_IDLE: Duration = Duration::from_secs(5);

const DEFAULT_QUEUE_CAPACITY: usize = 1024;
const DEFAULT_MAX_WORKERS: usize = 16;

/// Defines how the pool manages its worker set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolMode {
  /// Worker count is fixed at the value passed to `start` for the pool's
  /// entire lifetime.
  Fixed,
  /// Worker count grows reactively under load up to a configured ceiling
  /// and shrinks back to the initial baseline after sustained idleness.
  Cached,
}

/// Everything guarded by the pool's single shared lock. The task queue, the
/// worker registry and both counters are only ever mutated while holding it.
struct PoolState<R: Send + 'static> {
  queue: VecDeque<ManagedTaskInternal<R>>,
  workers: HashMap<u64, Worker>,
  idle_workers: usize,
  initial_workers: usize,
  queue_capacity: usize,
  max_workers: usize,
  mode: PoolMode,
  running: bool,
}

struct PoolShared<R: Send + 'static> {
  pool_name: Arc<String>,
  state: Mutex<PoolState<R>>,
  /// Producers wait here for queue headroom.
  not_full: Condvar,
  /// Consumers wait here for work; doubles as the shutdown wake signal.
  not_empty: Condvar,
  /// Shutdown waits here for the registry to empty.
  drained: Condvar,
  /// Mirror of the registry size, written only under the state lock.
  /// Lock-free readers see an eventually-consistent diagnostic snapshot.
  worker_count: AtomicUsize,
  next_worker_id: AtomicU64,
  next_task_id: AtomicU64,
}

/// A pool of OS threads executing blocking workloads that produce values of
/// type `R`.
///
/// The pool is constructed stopped; configure it, then call [`start`]. Tasks
/// are submitted as boxed closures and paired with a [`TaskHandle`] the
/// submitter can block on. Dropping the manager shuts the pool down and
/// waits for every worker to retire.
///
/// [`start`]: ThreadPoolManager::start
/// [`TaskHandle`]: crate::TaskHandle
pub struct ThreadPoolManager<R: Send + 'static> {
  shared: Arc<PoolShared<R>>,
}

impl<R: Send + 'static> ThreadPoolManager<R> {
  /// Creates a stopped pool with default thresholds: `Fixed` mode, a
  /// 1024-slot task queue and a 16-worker ceiling for `Cached` mode.
  pub fn new(pool_name: &str) -> Self {
    Self {
      shared: Arc::new(PoolShared {
        pool_name: Arc::new(pool_name.to_string()),
        state: Mutex::new(PoolState {
          queue: VecDeque::new(),
          workers: HashMap::new(),
          idle_workers: 0,
          initial_workers: 0,
          queue_capacity: DEFAULT_QUEUE_CAPACITY,
          max_workers: DEFAULT_MAX_WORKERS,
          mode: PoolMode::Fixed,
          running: false,
        }),
        not_full: Condvar::new(),
        not_empty: Condvar::new(),
        drained: Condvar::new(),
        worker_count: AtomicUsize::new(0),
        next_worker_id: AtomicU64::new(0),
        next_task_id: AtomicU64::new(0),
      }),
    }
  }

  /// The platform's available parallelism, the conventional argument to
  /// [`start`] when the caller has no better number.
  ///
  /// [`start`]: ThreadPoolManager::start
  pub fn default_worker_count() -> usize {
    thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
  }

  pub fn name(&self) -> &str {
    &self.shared.pool_name
  }

  /// Current number of live workers. Lock-free snapshot; may briefly lag
  /// behind the registry while workers are being added or retired.
  pub fn worker_count(&self) -> usize {
    self.shared.worker_count.load(AtomicOrdering::Relaxed)
  }

  /// Returns the current number of tasks in the pending queue.
  pub fn queued_task_count(&self) -> usize {
    self.shared.state.lock().queue.len()
  }

  pub fn is_running(&self) -> bool {
    self.shared.state.lock().running
  }

  /// Sets the worker-set mode. Effective only before `start`; ignored with
  /// a warning once the pool is running.
  pub fn set_mode(&self, mode: PoolMode) {
    let mut state = self.shared.state.lock();
    if state.running {
      warn!(pool_name = %self.shared.pool_name, "Set mode: pool is already running, ignoring.");
      return;
    }
    state.mode = mode;
  }

  /// Sets the task queue capacity. Effective only before `start`. The value
  /// is accepted unvalidated.
  pub fn set_queue_capacity(&self, capacity: usize) {
    let mut state = self.shared.state.lock();
    if state.running {
      warn!(pool_name = %self.shared.pool_name, "Set queue capacity: pool is already running, ignoring.");
      return;
    }
    state.queue_capacity = capacity;
  }

  /// Sets the worker-count ceiling for `Cached` mode. Effective only before
  /// `start`, and ignored for the lifetime of a `Fixed`-mode pool.
  pub fn set_max_workers(&self, max_workers: usize) {
    let mut state = self.shared.state.lock();
    if state.running || state.mode == PoolMode::Fixed {
      warn!(pool_name = %self.shared.pool_name, "Set max workers: pool is running or in fixed mode, ignoring.");
      return;
    }
    state.max_workers = max_workers;
  }

  /// Launches the pool with `initial_workers` dispatch threads and
  /// transitions it to running. Calling `start` on a running pool is a
  /// no-op.
  ///
  /// # Errors
  /// Returns `PoolError::WorkerSpawn` if the OS refuses a thread; workers
  /// spawned before the failure stay up and are reclaimed by `shutdown`.
  pub fn start(&self, initial_workers: usize) -> Result<(), PoolError> {
    let initial_workers = initial_workers.max(1);
    let mut state = self.shared.state.lock();
    if state.running {
      warn!(pool_name = %self.shared.pool_name, "Start: pool is already running, ignoring.");
      return Ok(());
    }
    state.running = true;
    state.initial_workers = initial_workers;

    for _ in 0..initial_workers {
      PoolShared::spawn_worker(&self.shared, &mut state)?;
    }

    info!(
      pool_name = %self.shared.pool_name,
      workers = initial_workers,
      mode = ?state.mode,
      queue_capacity = state.queue_capacity,
      "Pool started."
    );
    Ok(())
  }

  /// Submits a workload for execution, returning a handle the caller can
  /// block on for the produced value.
  ///
  /// Waits a bounded window for queue headroom; overload is answered with a
  /// fast rejection, never by blocking the submitter indefinitely. In
  /// `Cached` mode a submission that finds more pending tasks than idle
  /// workers grows the pool by exactly one worker, up to the ceiling.
  ///
  /// # Errors
  /// `PoolError::NotRunning` if the pool was not started or shutdown has
  /// begun; `PoolError::QueueFull` if the queue stayed full for the whole
  /// wait window.
  pub fn submit(&self, work: TaskToExecute<R>) -> Result<TaskHandle<R>, PoolError> {
    let task_id = self.shared.next_task_id.fetch_add(1, AtomicOrdering::Relaxed);
    let mut state = self.shared.state.lock();

    if !state.running {
      warn!(pool_name = %self.shared.pool_name, "Submit: pool is not running, rejecting task.");
      return Err(PoolError::NotRunning);
    }

    let deadline = Instant::now() + SUBMIT_WAIT;
    while state.queue.len() >= state.queue_capacity {
      if self.shared.not_full.wait_until(&mut state, deadline).timed_out() {
        warn!(
          pool_name = %self.shared.pool_name,
          %task_id,
          capacity = state.queue_capacity,
          "Submit: task queue stayed full, rejecting task."
        );
        return Err(PoolError::QueueFull);
      }
      if !state.running {
        warn!(pool_name = %self.shared.pool_name, %task_id, "Submit: pool shut down while waiting for queue headroom.");
        return Err(PoolError::NotRunning);
      }
    }

    let completion = Arc::new(CompletionSlot::new());
    state.queue.push_back(ManagedTaskInternal {
      task_id,
      work,
      completion: completion.clone(),
    });
    self.shared.not_empty.notify_all();
    debug!(
      pool_name = %self.shared.pool_name,
      %task_id,
      queued = state.queue.len(),
      "Task enqueued."
    );

    // Reactive growth: one extra worker per overload-detected submission.
    if state.mode == PoolMode::Cached
      && state.queue.len() > state.idle_workers
      && state.workers.len() < state.max_workers
    {
      if let Err(e) = PoolShared::spawn_worker(&self.shared, &mut state) {
        // The task is already queued, so the submission stands; the pool
        // just stays at its current size.
        warn!(pool_name = %self.shared.pool_name, error = %e, "Submit: failed to grow pool.");
      }
    }

    Ok(TaskHandle { task_id, completion })
  }

  /// Stops the pool and blocks until every worker has deregistered itself.
  ///
  /// Tasks still queued when shutdown begins are drained by the surviving
  /// workers before they retire; new submissions are rejected with
  /// `NotRunning`. Idempotent.
  pub fn shutdown(&self) {
    let mut state = self.shared.state.lock();
    if !state.running && state.workers.is_empty() {
      trace!(pool_name = %self.shared.pool_name, "Shutdown: pool already stopped.");
      return;
    }
    state.running = false;
    info!(
      pool_name = %self.shared.pool_name,
      queued = state.queue.len(),
      workers = state.workers.len(),
      "Pool shutting down."
    );
    debug!(pool_name = %self.shared.pool_name, registry = ?state.workers, "Workers awaiting retirement.");

    self.shared.not_empty.notify_all();
    while !state.workers.is_empty() {
      self.shared.drained.wait(&mut state);
    }

    info!(pool_name = %self.shared.pool_name, "Pool shutdown complete, all workers retired.");
  }
}

impl<R: Send + 'static> PoolShared<R> {
  /// Creates, registers and launches one worker. Caller holds the lock; the
  /// new thread blocks on that same lock until the caller releases it, so
  /// the registry insert always wins the race against self-removal.
  fn spawn_worker(shared: &Arc<Self>, state: &mut PoolState<R>) -> Result<(), PoolError> {
    let id = shared.next_worker_id.fetch_add(1, AtomicOrdering::Relaxed);
    let loop_shared = shared.clone();
    let worker = Worker::spawn(id, &shared.pool_name, move |worker_id| {
      Self::run_dispatch_loop(loop_shared, worker_id);
    })
    .map_err(|e| PoolError::WorkerSpawn(e.to_string()))?;

    state.workers.insert(worker.id(), worker);
    state.idle_workers += 1;
    shared.worker_count.store(state.workers.len(), AtomicOrdering::Relaxed);
    Ok(())
  }

  /// Removes this worker's registry entry and signals the drain condition.
  /// Caller holds the lock and has already accounted the worker as idle.
  fn retire(&self, state: &mut PoolState<R>, worker_id: u64, reason: &str) {
    state.idle_workers -= 1;
    state.workers.remove(&worker_id);
    self.worker_count.store(state.workers.len(), AtomicOrdering::Relaxed);
    self.drained.notify_all();
    info!(
      pool_name = %self.pool_name,
      worker_id,
      reason,
      remaining = state.workers.len(),
      "Worker retired."
    );
  }

  /// The consumer side: one instance per worker thread, runs until the
  /// worker retires itself.
  fn run_dispatch_loop(shared: Arc<Self>, worker_id: u64) {
    trace!(pool_name = %shared.pool_name, worker_id, "Dispatch loop started.");
    let mut last_active = Instant::now();

    loop {
      let task = {
        let mut state = shared.state.lock();

        while state.queue.is_empty() {
          if !state.running {
            shared.retire(&mut state, worker_id, "shutdown");
            return;
          }

          match state.mode {
            PoolMode::Cached => {
              let timed_out = shared.not_empty.wait_for(&mut state, IDLE_POLL).timed_out();
              // Only workers above the original baseline retire on
              // idleness, and only after a sustained quiet spell.
              if timed_out
                && last_active.elapsed() >= MAX_IDLE
                && state.workers.len() > state.initial_workers
              {
                shared.retire(&mut state, worker_id, "idle");
                return;
              }
            }
            PoolMode::Fixed => {
              shared.not_empty.wait(&mut state);
            }
          }
        }

        state.idle_workers -= 1;
        let task = state.queue.pop_front();
        if !state.queue.is_empty() {
          // Let other idle workers join a burst drain.
          shared.not_empty.notify_all();
        }
        shared.not_full.notify_all();
        task
      };

      // Execution happens strictly outside the lock; a slow workload must
      // never serialize producers and consumers behind it.
      if let Some(task) = task {
        trace!(pool_name = %shared.pool_name, worker_id, task_id = task.task_id, "Dispatching task.");
        task.execute();
      }
      last_active = Instant::now();
      shared.state.lock().idle_workers += 1;
    }
  }
}

impl<R: Send + 'static> Drop for ThreadPoolManager<R> {
  fn drop(&mut self) {
    // Blocks until the registry is empty so no worker thread outlives the
    // manager. No-op if `shutdown` was already called.
    self.shutdown();
  }
}
