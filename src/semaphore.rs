use parking_lot::{Condvar, Mutex};

/// A counting semaphore built on a mutex and a condition variable.
///
/// `wait` blocks until at least one permit is available, then consumes it.
/// `post` adds a permit and wakes every waiter. Permits accumulate, so a
/// `post` that happens before the matching `wait` is never lost. The pool
/// uses one of these per task as a one-shot completion signal.
pub(crate) struct Semaphore {
  permits: Mutex<usize>,
  available: Condvar,
}

impl Semaphore {
  pub(crate) fn new(permits: usize) -> Self {
    Self {
      permits: Mutex::new(permits),
      available: Condvar::new(),
    }
  }

  /// Blocks the calling thread until a permit is available, then takes it.
  pub(crate) fn wait(&self) {
    let mut permits = self.permits.lock();
    while *permits == 0 {
      self.available.wait(&mut permits);
    }
    *permits -= 1;
  }

  /// Releases one permit and wakes all waiters.
  pub(crate) fn post(&self) {
    let mut permits = self.permits.lock();
    *permits += 1;
    self.available.notify_all();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;
  use std::thread;
  use std::time::Duration;

  #[test]
  fn test_posted_permits_accumulate() {
    let sem = Semaphore::new(0);
    sem.post();
    sem.post();

    // Both waits must succeed without blocking.
    sem.wait();
    sem.wait();
  }

  #[test]
  fn test_initial_permits_are_consumable() {
    let sem = Semaphore::new(2);
    sem.wait();
    sem.wait();
  }

  #[test]
  fn test_wait_blocks_until_post() {
    let sem = Arc::new(Semaphore::new(0));
    let waiter_sem = sem.clone();

    let waiter = thread::spawn(move || {
      waiter_sem.wait();
    });

    // Give the waiter time to block, then release it.
    thread::sleep(Duration::from_millis(50));
    assert!(!waiter.is_finished());

    sem.post();
    waiter.join().expect("waiter thread panicked");
  }

  #[test]
  fn test_one_post_wakes_exactly_one_waiter() {
    let sem = Arc::new(Semaphore::new(0));
    let waiters: Vec<_> = (0..2)
      .map(|_| {
        let sem = sem.clone();
        thread::spawn(move || sem.wait())
      })
      .collect();

    thread::sleep(Duration::from_millis(50));
    sem.post();
    thread::sleep(Duration::from_millis(50));

    let finished = waiters.iter().filter(|w| w.is_finished()).count();
    assert_eq!(finished, 1);

    sem.post();
    for waiter in waiters {
      waiter.join().expect("waiter thread panicked");
    }
  }
}
