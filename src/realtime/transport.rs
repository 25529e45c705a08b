//! The seam between the coordinator and the backend's real-time service

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;

use super::filter::RowFilter;
use super::notification::ChangeNotification;

/// Identifier the transport assigns to an open channel
pub type ChannelId = u64;

/// What a channel listens to: one table, optionally narrowed by a row filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub name: String,
    pub schema: String,
    pub table: String,
    pub filter: Option<RowFilter>,
}

impl ChannelSpec {
    /// Whether a notification belongs on this channel
    pub fn accepts(&self, notification: &ChangeNotification) -> bool {
        if notification.schema != self.schema || notification.table != self.table {
            return false;
        }
        self.filter
            .as_ref()
            .map_or(true, |filter| filter.matches(notification.record()))
    }
}

impl fmt::Display for ChannelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}.{}", self.name, self.schema, self.table)?;
        if let Some(filter) = &self.filter {
            write!(f, " where {filter}")?;
        }
        f.write_str(")")
    }
}

/// Receiving end of an open channel. `None` from the receiver means the
/// transport closed the channel.
#[derive(Debug)]
pub struct ChannelStream {
    pub id: ChannelId,
    pub receiver: mpsc::Receiver<ChangeNotification>,
}

/// A backend capable of opening filtered change channels, delivering
/// notifications on them, and releasing them.
///
/// Connection management, authentication and the wire protocol are the
/// implementation's business. Nothing above this trait retries.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn open_channel(&self, spec: &ChannelSpec) -> Result<ChannelStream>;

    /// Stops delivery on a channel. Unknown ids are ignored.
    fn release_channel(&self, id: ChannelId);
}
