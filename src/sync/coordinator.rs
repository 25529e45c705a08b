//! Bridges backend change notifications to dashboard reloads.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::callbacks::ReloadCallbacks;
use super::subscription::SubscriptionHandle;
use crate::core::{SyncConfig, SyncStatistics};
use crate::realtime::{Collection, RealtimeTransport};

/// The signed-in user whose dashboard is being kept fresh
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewerIdentity(String);

impl ViewerIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keeps one subscription per collection alive while a viewer is set.
///
/// Failed subscriptions are logged and left alone: there is no retry or
/// reconnection, and a channel the transport closes stays closed until the
/// next viewer change.
pub struct SyncCoordinator {
    transport: Arc<dyn RealtimeTransport>,
    callbacks: ReloadCallbacks,
    config: SyncConfig,
    stats: Arc<SyncStatistics>,
    viewer: Option<ViewerIdentity>,
    handles: BTreeMap<Collection, SubscriptionHandle>,
}

impl SyncCoordinator {
    pub fn new(
        transport: Arc<dyn RealtimeTransport>,
        callbacks: ReloadCallbacks,
        config: &SyncConfig,
    ) -> Self {
        Self {
            transport,
            callbacks,
            config: config.clone(),
            stats: Arc::new(SyncStatistics::new()),
            viewer: None,
            handles: BTreeMap::new(),
        }
    }

    /// Switches to `viewer`. Any existing subscriptions are released first;
    /// `None` leaves the coordinator idle. Setting the current viewer again is
    /// a no-op.
    pub async fn set_viewer(&mut self, viewer: Option<ViewerIdentity>) {
        if viewer == self.viewer {
            return;
        }

        self.release_all().await;
        self.viewer = viewer;

        if let Some(viewer) = &self.viewer {
            info!(%viewer, "activating realtime sync");
            self.subscribe_all().await;
        }
    }

    pub async fn activate(&mut self, viewer: ViewerIdentity) {
        self.set_viewer(Some(viewer)).await;
    }

    pub async fn deactivate(&mut self) {
        self.set_viewer(None).await;
    }

    pub fn viewer(&self) -> Option<&ViewerIdentity> {
        self.viewer.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.viewer.is_some()
    }

    /// Collections with a live subscription, in declaration order
    pub fn active_collections(&self) -> Vec<Collection> {
        self.handles.keys().copied().collect()
    }

    pub fn stats(&self) -> Arc<SyncStatistics> {
        Arc::clone(&self.stats)
    }

    async fn subscribe_all(&mut self) {
        for collection in Collection::ALL {
            if let Some(previous) = self.handles.remove(&collection) {
                previous.release().await;
            }

            let spec = self.config.channel_spec(collection);
            match SubscriptionHandle::open(
                collection,
                &spec,
                Arc::clone(&self.transport),
                self.callbacks.clone(),
                Arc::clone(&self.stats),
            )
            .await
            {
                Ok(handle) => {
                    self.handles.insert(collection, handle);
                }
                Err(e) => {
                    self.stats.record_failure();
                    warn!(%collection, channel = %spec, error = %e, "subscription failed");
                }
            }
        }
    }

    async fn release_all(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        debug!(count = self.handles.len(), "releasing subscriptions");
        let handles = std::mem::take(&mut self.handles);
        for (_, handle) in handles {
            handle.release().await;
        }
    }
}
