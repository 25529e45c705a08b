//! Real-time sync coordinator and its subscriptions.

pub mod callbacks;
pub mod coordinator;
pub mod subscription;

pub use callbacks::{reload_fn, reloads_for, ReloadCallbacks, ReloadFn, ReloadKind};
pub use coordinator::{SyncCoordinator, ViewerIdentity};
pub use subscription::SubscriptionHandle;
