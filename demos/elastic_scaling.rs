use thread_orchestra::{PoolMode, TaskToExecute, ThreadPoolManager};

use std::thread;
use std::time::Duration;

use tracing::info;

fn summation_task(begin: u64, end: u64) -> TaskToExecute<u64> {
  Box::new(move || {
    info!("Summing {}..={}", begin, end);
    thread::sleep(Duration::from_secs(2));
    (begin..=end).sum()
  })
}

fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_target(false)
    .init();

  info!("--- Elastic Scaling Example ---");

  let pool = ThreadPoolManager::<u64>::new("elastic_pool");
  pool.set_mode(PoolMode::Cached);

  let initial = ThreadPoolManager::<u64>::default_worker_count();
  pool.start(initial).expect("Pool failed to start");
  info!("Started cached pool with {} workers (ceiling 16).", initial);

  // A burst of nine slow summations, enough to outpace the idle workers
  // and trigger reactive growth.
  let ranges: [(u64, u64); 9] = [
    (1, 100),
    (101, 200),
    (201, 300),
    (301, 400),
    (201, 300),
    (301, 400),
    (201, 300),
    (301, 400),
    (301, 400),
  ];
  let mut handles: Vec<_> = ranges
    .iter()
    .map(|&(begin, end)| pool.submit(summation_task(begin, end)).expect("submit failed"))
    .collect();

  info!("Worker count after the burst: {}", pool.worker_count());

  let first_four: u64 = handles
    .drain(..4)
    .map(|handle| handle.wait_result().expect("task failed"))
    .sum();
  info!("Sum over the first four ranges: {}", first_four); // 80300

  for handle in handles {
    handle.wait_result().expect("task failed");
  }

  info!("All tasks done. Worker count: {}", pool.worker_count());
  info!("Sleeping past the idle reclaim threshold...");
  thread::sleep(Duration::from_secs(7));
  info!("Worker count after the idle spell: {}", pool.worker_count());

  pool.shutdown();
  info!("--- Elastic Scaling Example End ---");
}
