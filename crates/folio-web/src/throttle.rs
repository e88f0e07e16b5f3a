//! Brute-force protection for the login forms.
//!
//! Failed attempts are counted per client address inside a fixed window that
//! starts at the first failure. Once the count reaches the limit, every
//! attempt from that address is refused until the window runs out, even one
//! with the right password.

use std::{
  collections::HashMap,
  sync::{Mutex, PoisonError},
  time::{Duration, Instant},
};

pub const WINDOW: Duration = Duration::from_secs(15 * 60);
pub const MAX_ATTEMPTS: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
  Allowed,
  Locked,
}

/// Attempt accounting shared by both login gates.
///
/// [`MemoryLimiter`] keeps state in-process; a multi-process deployment
/// would put the counters somewhere shared.
pub trait AttemptLimiter: Send + Sync {
  /// Whether `addr` may attempt a login right now.
  fn check(&self, addr: &str) -> Verdict;

  fn record_failure(&self, addr: &str);

  /// Forget all failures for `addr` after a successful login.
  fn clear(&self, addr: &str);
}

#[derive(Debug, Clone, Copy)]
struct Attempts {
  count: u32,
  first: Instant,
}

pub struct MemoryLimiter {
  window:   Duration,
  limit:    u32,
  attempts: Mutex<HashMap<String, Attempts>>,
}

impl Default for MemoryLimiter {
  fn default() -> Self { Self::new(WINDOW, MAX_ATTEMPTS) }
}

impl MemoryLimiter {
  pub fn new(window: Duration, limit: u32) -> Self {
    Self { window, limit, attempts: Mutex::new(HashMap::new()) }
  }

  pub fn check_at(&self, addr: &str, now: Instant) -> Verdict {
    let attempts = self.attempts.lock().unwrap_or_else(PoisonError::into_inner);
    match attempts.get(addr) {
      Some(a) if now.duration_since(a.first) <= self.window && a.count >= self.limit => {
        Verdict::Locked
      }
      _ => Verdict::Allowed,
    }
  }

  pub fn record_failure_at(&self, addr: &str, now: Instant) {
    let mut attempts = self.attempts.lock().unwrap_or_else(PoisonError::into_inner);
    let row = attempts
      .entry(addr.to_owned())
      .or_insert(Attempts { count: 0, first: now });
    if now.duration_since(row.first) > self.window {
      *row = Attempts { count: 0, first: now };
    }
    row.count += 1;

    if row.count == self.limit {
      tracing::warn!(addr, "login attempts locked out");
    }
  }

  /// Failures currently counted against `addr`.
  pub fn failures(&self, addr: &str) -> u32 {
    self
      .attempts
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .get(addr)
      .map_or(0, |a| a.count)
  }
}

impl AttemptLimiter for MemoryLimiter {
  fn check(&self, addr: &str) -> Verdict { self.check_at(addr, Instant::now()) }

  fn record_failure(&self, addr: &str) { self.record_failure_at(addr, Instant::now()) }

  fn clear(&self, addr: &str) {
    self
      .attempts
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(addr);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const ADDR: &str = "203.0.113.9";

  fn fail(limiter: &MemoryLimiter, n: u32, now: Instant) {
    for _ in 0..n {
      limiter.record_failure_at(ADDR, now);
    }
  }

  #[test]
  fn locks_at_the_limit() {
    let limiter = MemoryLimiter::default();
    let t0 = Instant::now();
    fail(&limiter, MAX_ATTEMPTS - 1, t0);
    assert_eq!(limiter.check_at(ADDR, t0), Verdict::Allowed);

    fail(&limiter, 1, t0);
    assert_eq!(limiter.check_at(ADDR, t0), Verdict::Locked);
    assert_eq!(limiter.check_at("198.51.100.1", t0), Verdict::Allowed);
  }

  #[test]
  fn lock_expires_with_the_window() {
    let limiter = MemoryLimiter::default();
    let t0 = Instant::now();
    fail(&limiter, MAX_ATTEMPTS, t0);

    assert_eq!(limiter.check_at(ADDR, t0 + WINDOW), Verdict::Locked);
    let later = t0 + WINDOW + Duration::from_secs(1);
    assert_eq!(limiter.check_at(ADDR, later), Verdict::Allowed);

    // The next failure starts a fresh window.
    limiter.record_failure_at(ADDR, later);
    assert_eq!(limiter.failures(ADDR), 1);
  }

  #[test]
  fn clear_resets_the_count() {
    let limiter = MemoryLimiter::default();
    let t0 = Instant::now();
    fail(&limiter, MAX_ATTEMPTS - 1, t0);
    limiter.clear(ADDR);
    assert_eq!(limiter.failures(ADDR), 0);

    fail(&limiter, MAX_ATTEMPTS - 1, t0);
    assert_eq!(limiter.check_at(ADDR, t0), Verdict::Allowed);
  }
}
