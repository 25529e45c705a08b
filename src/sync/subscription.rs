//! One live subscription: an open transport channel plus the task draining it.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::callbacks::{reloads_for, ReloadCallbacks};
use crate::core::SyncStatistics;
use crate::realtime::{ChangeNotification, ChannelId, ChannelSpec, Collection, RealtimeTransport};

/// Owns a channel on the transport for one collection. Dropping the handle
/// tears the subscription down; [`SubscriptionHandle::release`] does the same
/// and also waits for the listener to finish.
pub struct SubscriptionHandle {
    collection: Collection,
    channel_id: ChannelId,
    transport: Arc<dyn RealtimeTransport>,
    stats: Arc<SyncStatistics>,
    stop_tx: watch::Sender<bool>,
    listener: Option<JoinHandle<()>>,
    released: bool,
}

impl SubscriptionHandle {
    /// Opens the channel described by `spec` and starts forwarding its
    /// notifications to `callbacks`
    pub async fn open(
        collection: Collection,
        spec: &ChannelSpec,
        transport: Arc<dyn RealtimeTransport>,
        callbacks: ReloadCallbacks,
        stats: Arc<SyncStatistics>,
    ) -> Result<Self> {
        let stream = transport.open_channel(spec).await?;
        stats.record_opened();

        let (stop_tx, stop_rx) = watch::channel(false);
        let listener = tokio::spawn(listen(
            collection,
            stream.receiver,
            stop_rx,
            callbacks,
            Arc::clone(&stats),
        ));

        debug!(%collection, channel_id = stream.id, "subscribed");
        Ok(Self {
            collection,
            channel_id: stream.id,
            transport,
            stats,
            stop_tx,
            listener: Some(listener),
            released: false,
        })
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// Stops delivery and waits for the listener to exit. Once this returns no
    /// further reload is started for this collection.
    pub async fn release(mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(listener) = self.listener.take() {
            if let Err(e) = listener.await {
                if e.is_panic() {
                    warn!(collection = %self.collection, "listener panicked before release");
                }
            }
        }
        self.release_now();
    }

    fn release_now(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let _ = self.stop_tx.send(true);
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        self.transport.release_channel(self.channel_id);
        self.stats.record_released();
        debug!(collection = %self.collection, channel_id = self.channel_id, "unsubscribed");
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.release_now();
    }
}

async fn listen(
    collection: Collection,
    mut receiver: mpsc::Receiver<ChangeNotification>,
    mut stop_rx: watch::Receiver<bool>,
    callbacks: ReloadCallbacks,
    stats: Arc<SyncStatistics>,
) {
    loop {
        tokio::select! {
            biased;
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            received = receiver.recv() => match received {
                Some(notification) => dispatch(collection, &notification, &callbacks, &stats),
                None => {
                    // Closed by the transport. Nothing reconnects it.
                    warn!(%collection, "change channel closed by transport");
                    break;
                }
            },
        }
    }
}

/// Fires the collection's reloads without waiting on them
fn dispatch(
    collection: Collection,
    notification: &ChangeNotification,
    callbacks: &ReloadCallbacks,
    stats: &SyncStatistics,
) {
    stats.record_notification(collection);
    debug!(%collection, event = %notification.event, "change notification received");

    for kind in reloads_for(collection) {
        stats.record_reload(kind);
        let reload = callbacks.invoke(kind);
        tokio::spawn(async move {
            if let Err(e) = reload.await {
                warn!(reload = %kind, error = %e, "reload failed");
            }
        });
    }
}
