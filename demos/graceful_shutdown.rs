use thread_orchestra::{TaskHandle, ThreadPoolManager};

use std::thread;
use std::time::Duration;

use tracing::info;

fn work_task_fn(id: usize, duration_s: u64) -> String {
  info!("Task {} starting (will run for {}s)", id, duration_s);
  thread::sleep(Duration::from_secs(duration_s));
  let result = format!("Task {} finished after {}s", id, duration_s);
  info!("{}", result);
  result
}

fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_target(false)
    .init();
  info!("--- Graceful Shutdown Example ---");

  let pool = ThreadPoolManager::<String>::new("graceful_shutdown_pool");
  pool.start(2).expect("Pool failed to start");

  let mut handles: Vec<TaskHandle<String>> = Vec::new();

  // Submit 5 tasks, each takes 2 seconds.
  // With 2 workers:
  // Tasks 0, 1 start.
  // Tasks 2, 3, 4 are queued.
  for i in 0..5 {
    match pool.submit(Box::new(move || work_task_fn(i, 2))) {
      Ok(handle) => {
        info!("Submitted task {} (handle id {})", i, handle.id());
        handles.push(handle);
      }
      Err(e) => tracing::error!("Failed to submit task {}: {:?}", i, e),
    }
  }

  info!(
    "All 5 tasks submitted. Queue size: {}, Workers: {}",
    pool.queued_task_count(),
    pool.worker_count()
  );

  thread::sleep(Duration::from_millis(100)); // Let some tasks start
  info!("Calling pool.shutdown()...");
  // Shutdown rejects new submissions but drains the queued tasks before
  // the workers retire, so it blocks until all five have run.
  pool.shutdown();
  info!("Shutdown returned. Workers: {}", pool.worker_count());

  for handle in handles {
    let task_id = handle.id();
    match handle.wait_result() {
      Ok(result) => info!("Result for task {}: {}", task_id, result),
      Err(e) => info!("Error for task {}: {:?}", task_id, e),
    }
  }

  info!("--- Graceful Shutdown Example End ---");
}
