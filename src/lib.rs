//! # exam-sync
//!
//! `exam-sync` keeps examination-platform dashboards consistent with backend
//! changes. A [`sync::SyncCoordinator`] subscribes to change channels for
//! exams, submissions and student profiles while a viewer is signed in, and
//! turns every change notification into the matching dashboard reloads.
//!
//! ## Core Features
//!
//! - **Per-viewer subscriptions**: one channel per collection, torn down when
//!   the viewer signs out or the coordinator is dropped.
//! - **Pluggable transport**: the real-time backend is a trait object; an
//!   in-memory implementation drives tests and the `exam-sync replay` tool.
//! - **Fire-and-forget reloads**: reloads are spawned, never awaited or
//!   deduplicated.
//!
//! There is deliberately no retry or reconnection: a subscription that fails
//! to open, or a channel the backend closes, stays down until the next viewer
//! change.
//!
//! ## Example
//!
//! ```rust,no_run
//! use exam_sync::core::SyncConfig;
//! use exam_sync::realtime::{ChangeNotification, Collection, EventKind, MemoryTransport};
//! use exam_sync::sync::{ReloadCallbacks, SyncCoordinator, ViewerIdentity};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let transport = Arc::new(MemoryTransport::default());
//!     let callbacks = ReloadCallbacks::from_fn(|kind| async move {
//!         println!("reload {kind}");
//!         Ok(())
//!     });
//!
//!     let mut coordinator =
//!         SyncCoordinator::new(transport.clone(), callbacks, &SyncConfig::default());
//!     coordinator.activate(ViewerIdentity::new("teacher-1")).await;
//!
//!     transport
//!         .publish(&ChangeNotification::for_collection(Collection::Exams, EventKind::Insert))
//!         .await;
//!
//!     coordinator.deactivate().await;
//! }
//! ```

pub mod commands;
pub mod core;
pub mod realtime;
pub mod sync;
