//! Common test utilities for integration tests
//!
//! This module provides shared functionality used across multiple test files.

#![allow(dead_code)] // Not every test binary uses every helper

pub mod fixtures;

use std::time::{Duration, Instant};

/// Polls `done` until it holds or `timeout` passes
pub async fn wait_until(timeout: Duration, done: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while !done() {
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    true
}

/// Gives listeners and spawned reloads a moment to do anything unexpected
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
