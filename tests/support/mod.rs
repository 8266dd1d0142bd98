//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};
use std::time::SystemTime;

use gamebus::GameEvent;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Route `tracing` output to the test harness. Filter with `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthChanged {
    pub current: i32,
    pub max: i32,
    pub at: SystemTime,
}

impl HealthChanged {
    pub fn new(current: i32, max: i32) -> Self {
        Self {
            current,
            max,
            at: SystemTime::now(),
        }
    }
}

impl GameEvent for HealthChanged {
    const KIND: &'static str = "HealthChanged";

    fn timestamp(&self) -> SystemTime {
        self.at
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelUp {
    pub level: u32,
    pub at: SystemTime,
}

impl LevelUp {
    pub fn new(level: u32) -> Self {
        Self {
            level,
            at: SystemTime::now(),
        }
    }
}

impl GameEvent for LevelUp {
    const KIND: &'static str = "LevelUp";

    fn timestamp(&self) -> SystemTime {
        self.at
    }
}

/// Collects values handed to it from any thread.
#[derive(Debug)]
pub struct Recorder<T> {
    seen: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            seen: Arc::clone(&self.seen),
        }
    }
}

impl<T: Clone> Recorder<T> {
    pub fn new() -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn push(&self, value: T) {
        self.seen.lock().unwrap().push(value);
    }

    pub fn values(&self) -> Vec<T> {
        self.seen.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}
