//! In-process transport: a registry of bounded channels fed by `publish`.
//!
//! Stands in for the hosted real-time service in tests, the replay command
//! and benchmarks. Filtering happens here, as it does server-side.

use anyhow::{bail, Result};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::notification::ChangeNotification;
use super::transport::{ChannelId, ChannelSpec, ChannelStream, RealtimeTransport};

struct MemoryChannel {
    spec: ChannelSpec,
    tx: mpsc::Sender<ChangeNotification>,
}

pub struct MemoryTransport {
    channels: DashMap<ChannelId, MemoryChannel>,
    rejected_tables: DashSet<String>,
    next_id: AtomicU64,
    capacity: usize,
}

impl MemoryTransport {
    /// Creates a transport whose channels buffer up to `capacity` notifications each
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            rejected_tables: DashSet::new(),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    /// Makes every later `open_channel` for `table` fail
    pub fn reject_table(&self, table: &str) {
        self.rejected_tables.insert(table.to_string());
    }

    pub fn accept_table(&self, table: &str) {
        self.rejected_tables.remove(table);
    }

    /// Delivers a notification to every open channel that accepts it.
    /// Returns the number of channels it reached.
    pub async fn publish(&self, notification: &ChangeNotification) -> usize {
        // Clone the senders out so no map guard is held across an await
        let targets: Vec<(ChannelId, mpsc::Sender<ChangeNotification>)> = self
            .channels
            .iter()
            .filter(|entry| entry.spec.accepts(notification))
            .map(|entry| (*entry.key(), entry.tx.clone()))
            .collect();

        let mut delivered = 0;
        for (id, tx) in targets {
            if tx.send(notification.clone()).await.is_ok() {
                delivered += 1;
            } else {
                trace!(channel_id = id, "receiver gone, notification dropped");
            }
        }
        debug!(
            table = %notification.table,
            event = %notification.event,
            delivered,
            "notification published"
        );
        delivered
    }

    pub fn open_channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn open_channels_for(&self, table: &str) -> usize {
        self.channels
            .iter()
            .filter(|entry| entry.spec.table == table)
            .count()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new(crate::core::config::DEFAULT_CHANNEL_CAPACITY)
    }
}

#[async_trait]
impl RealtimeTransport for MemoryTransport {
    async fn open_channel(&self, spec: &ChannelSpec) -> Result<ChannelStream> {
        if self.rejected_tables.contains(&spec.table) {
            bail!("subscription to '{}' was rejected", spec.table);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, receiver) = mpsc::channel(self.capacity);
        self.channels.insert(
            id,
            MemoryChannel {
                spec: spec.clone(),
                tx,
            },
        );
        debug!(channel_id = id, channel = %spec, "channel opened");
        Ok(ChannelStream { id, receiver })
    }

    fn release_channel(&self, id: ChannelId) {
        if self.channels.remove(&id).is_some() {
            debug!(channel_id = id, "channel released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::{EventKind, RowFilter};
    use serde_json::json;

    fn spec(table: &str, filter: Option<RowFilter>) -> ChannelSpec {
        ChannelSpec {
            name: format!("{table}-changes"),
            schema: "public".to_string(),
            table: table.to_string(),
            filter,
        }
    }

    #[tokio::test]
    async fn test_publish_routes_by_table() {
        let transport = MemoryTransport::new(8);
        let mut exams = transport.open_channel(&spec("exams", None)).await.unwrap();
        let mut profiles = transport.open_channel(&spec("profiles", None)).await.unwrap();

        let delivered = transport
            .publish(&ChangeNotification::new("exams", EventKind::Insert))
            .await;
        assert_eq!(delivered, 1);
        assert_eq!(exams.receiver.recv().await.unwrap().table, "exams");
        assert!(profiles.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_applies_row_filter() {
        let transport = MemoryTransport::new(8);
        let filter = Some(RowFilter::eq("role", "student"));
        let mut stream = transport.open_channel(&spec("profiles", filter)).await.unwrap();

        let teacher = ChangeNotification::new("profiles", EventKind::Update)
            .with_new(json!({"role": "teacher"}));
        assert_eq!(transport.publish(&teacher).await, 0);

        let student = ChangeNotification::new("profiles", EventKind::Update)
            .with_new(json!({"role": "student"}));
        assert_eq!(transport.publish(&student).await, 1);
        assert_eq!(stream.receiver.recv().await.unwrap(), student);
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_not_delivered() {
        let transport = MemoryTransport::new(8);
        let _stream = transport.open_channel(&spec("exams", None)).await.unwrap();
        let other = ChangeNotification::new("exams", EventKind::Insert).with_schema("audit");
        assert_eq!(transport.publish(&other).await, 0);
    }

    #[tokio::test]
    async fn test_release_closes_channel() {
        let transport = MemoryTransport::new(8);
        let mut stream = transport.open_channel(&spec("exams", None)).await.unwrap();
        assert_eq!(transport.open_channel_count(), 1);

        transport.release_channel(stream.id);
        transport.release_channel(stream.id);
        assert_eq!(transport.open_channel_count(), 0);
        assert!(stream.receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_rejected_table_fails_to_open() {
        let transport = MemoryTransport::new(8);
        transport.reject_table("exams");
        assert!(transport.open_channel(&spec("exams", None)).await.is_err());
        assert_eq!(transport.open_channels_for("exams"), 0);

        transport.accept_table("exams");
        assert!(transport.open_channel(&spec("exams", None)).await.is_ok());
    }
}
