use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::time::Instant;

use log::warn;

/// A cooperative time limit.
///
/// Nothing is interrupted: work checks [`Deadline::passed`] before starting
/// something new.
#[derive(Debug)]
pub struct Deadline {
  limit: Option<(Instant, Duration)>,
  announced: AtomicBool,
}

impl Deadline {
  /// Starts the clock now. `None` never expires.
  #[must_use]
  pub fn new(timeout: Option<Duration>) -> Self {
    Self { limit: timeout.map(|t| (Instant::now(), t)), announced: AtomicBool::new(false) }
  }

  /// If the time is up. The first time this sees it, it logs a warning.
  pub fn passed(&self) -> bool {
    match self.limit {
      Some((start, limit)) if start.elapsed() >= limit => {
        if !self.announced.swap(true, Ordering::Relaxed) {
          warn!("Timed out after {limit:?}, using the best result so far");
        }
        true
      }
      _ => false,
    }
  }
}

#[test]
fn test_deadline() {
  assert!(!Deadline::new(None).passed());
  assert!(Deadline::new(Some(Duration::ZERO)).passed());
  assert!(!Deadline::new(Some(Duration::from_secs(3600))).passed());
}
