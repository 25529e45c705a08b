//! Public API for the core module.
//!
//! This module provides the stable public API for host-side concerns:
//! - Configuration loading and channel specs
//! - Statistics tracking
//!
//! Internal implementation details are not exposed through this API.

// Core types
pub use super::config::SyncConfig;
pub use super::stats::SyncStatistics;

// Configuration
pub use super::config::resolve_channel_capacity;
pub use super::config::{CHANNEL_CAPACITY_ENV, DEFAULT_CHANNEL_CAPACITY, DEFAULT_SCHEMA, DEFAULT_STUDENT_ROLE};
