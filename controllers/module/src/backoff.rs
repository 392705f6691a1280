//! # Fibonacci Backoff
//!
//! Error requeue delays for Modules whose sync failed. Delays grow along the
//! Fibonacci sequence in minutes (1m, 1m, 2m, 3m, 5m, 8m, 10m with the default
//! bounds) and are tracked per Module so one failing Module does not slow
//! down the others.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Fibonacci backoff calculator, in minutes
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min_minutes: u64,
    prev_minutes: u64,
    current_minutes: u64,
    max_minutes: u64,
}

impl FibonacciBackoff {
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            min_minutes,
            prev_minutes: 0,
            current_minutes: min_minutes,
            max_minutes,
        }
    }

    /// Current delay; advances the sequence, capped at `max_minutes`
    pub fn next_backoff(&mut self) -> Duration {
        let delay = Duration::from_secs(self.current_minutes * 60);

        let next_minutes = self.prev_minutes + self.current_minutes;
        self.prev_minutes = self.current_minutes;
        self.current_minutes = next_minutes.min(self.max_minutes);

        delay
    }

    pub fn reset(&mut self) {
        self.prev_minutes = 0;
        self.current_minutes = self.min_minutes;
    }
}

#[derive(Debug)]
struct ModuleBackoff {
    backoff: FibonacciBackoff,
    error_count: u32,
}

/// Per-Module backoff state, keyed by `namespace/name`
#[derive(Debug)]
pub struct BackoffStates {
    min_minutes: u64,
    max_minutes: u64,
    states: Mutex<HashMap<String, ModuleBackoff>>,
}

impl BackoffStates {
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            min_minutes,
            max_minutes,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Record one more error for `key` and return the delay before retrying
    ///
    /// Returns (delay, consecutive error count)
    pub fn record_error(&self, key: &str) -> (Duration, u32) {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        let state = states.entry(key.to_string()).or_insert_with(|| ModuleBackoff {
            backoff: FibonacciBackoff::new(self.min_minutes, self.max_minutes),
            error_count: 0,
        });
        state.error_count += 1;
        (state.backoff.next_backoff(), state.error_count)
    }

    /// Forget the error history of `key` (on successful reconciliation)
    pub fn reset(&self, key: &str) {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    pub fn error_count(&self, key: &str) -> u32 {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map_or(0, |s| s.error_count)
    }
}
