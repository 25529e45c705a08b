//! Test fixtures and builders

use exam_sync::core::SyncConfig;
use exam_sync::realtime::{ChangeNotification, Collection, EventKind, MemoryTransport};
use exam_sync::sync::{ReloadCallbacks, ReloadKind, SyncCoordinator, ViewerIdentity};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::wait_until;

pub const WAIT: Duration = Duration::from_secs(2);

/// Counts how often each reload callback has been invoked
#[derive(Clone, Default)]
pub struct CountingReloads {
    counts: Arc<Mutex<BTreeMap<ReloadKind, u64>>>,
}

impl CountingReloads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callbacks(&self) -> ReloadCallbacks {
        let counts = Arc::clone(&self.counts);
        ReloadCallbacks::from_fn(move |kind| {
            let counts = Arc::clone(&counts);
            async move {
                *counts.lock().unwrap().entry(kind).or_insert(0) += 1;
                Ok(())
            }
        })
    }

    pub fn count(&self, kind: ReloadKind) -> u64 {
        self.counts.lock().unwrap().get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.lock().unwrap().values().sum()
    }
}

/// A coordinator wired to an in-memory transport and counting callbacks
pub struct Harness {
    pub transport: Arc<MemoryTransport>,
    pub reloads: CountingReloads,
    pub coordinator: SyncCoordinator,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(&SyncConfig::default())
    }

    pub fn with_config(config: &SyncConfig) -> Self {
        let transport = Arc::new(MemoryTransport::new(config.channel_capacity));
        let reloads = CountingReloads::new();
        let coordinator = SyncCoordinator::new(transport.clone(), reloads.callbacks(), config);
        Self {
            transport,
            reloads,
            coordinator,
        }
    }

    pub async fn activate(&mut self, viewer: &str) {
        self.coordinator.activate(ViewerIdentity::new(viewer)).await;
    }

    /// Publishes and waits until the reloads it should trigger have all run
    pub async fn publish_and_wait(&self, notification: &ChangeNotification) -> usize {
        let before = self.reloads.total();
        let delivered = self.transport.publish(notification).await;
        let expected = before + 2 * delivered as u64;
        assert!(
            wait_until(WAIT, || self.reloads.total() >= expected).await,
            "reloads did not arrive in time"
        );
        delivered
    }
}

pub fn exam_inserted() -> ChangeNotification {
    ChangeNotification::for_collection(Collection::Exams, EventKind::Insert)
        .with_new(json!({"id": 7, "title": "Midterm"}))
}

pub fn submission_updated() -> ChangeNotification {
    ChangeNotification::for_collection(Collection::StudentExams, EventKind::Update)
        .with_new(json!({"id": 3, "exam_id": 7, "status": "submitted"}))
}

pub fn profile_changed(role: &str) -> ChangeNotification {
    ChangeNotification::for_collection(Collection::Profiles, EventKind::Update)
        .with_new(json!({"id": "u-1", "role": role}))
}
