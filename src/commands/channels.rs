//! Channels command implementation
//!
//! Prints the channel each collection subscribes through, as resolved from
//! the active configuration.

use crate::core::SyncConfig;
use crate::realtime::Collection;
use crate::sync::reloads_for;

/// Renders one line per collection: channel, table filter, and triggered reloads
pub fn render_channels(config: &SyncConfig) -> Vec<String> {
    let width = Collection::ALL
        .iter()
        .map(|c| c.table().len())
        .max()
        .unwrap_or(0);

    Collection::ALL
        .iter()
        .map(|collection| {
            let spec = config.channel_spec(*collection);
            let reloads = reloads_for(*collection)
                .iter()
                .map(|kind| kind.label())
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "{:<width$}  {}  →  {}",
                collection.table(),
                spec,
                reloads,
                width = width
            )
        })
        .collect()
}

/// Handles the channels command
pub fn handle_channels_command(config: &SyncConfig) {
    println!("📡 Realtime channels (schema '{}')\n", config.schema);
    for line in render_channels(config) {
        println!("   {line}");
    }
}
