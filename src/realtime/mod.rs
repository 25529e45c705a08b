//! Real-time change channels: notification types, row filters, and the
//! transport abstraction the coordinator subscribes through.

pub mod filter;
pub mod memory;
pub mod notification;
pub mod transport;

pub use filter::{FilterOp, RowFilter};
pub use memory::MemoryTransport;
pub use notification::{ChangeNotification, Collection, EventKind};
pub use transport::{ChannelId, ChannelSpec, ChannelStream, RealtimeTransport};
