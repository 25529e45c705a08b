//! Configuration constants and settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::realtime::{ChannelSpec, Collection, RowFilter};

// Backend defaults
pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_STUDENT_ROLE: &str = "student";
pub const ROLE_COLUMN: &str = "role";

// Per-channel notification buffer
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
pub const CHANNEL_CAPACITY_ENV: &str = "EXAM_SYNC_CHANNEL_CAPACITY";

// Config file location under the platform config dir
pub const CONFIG_DIR_NAME: &str = "exam-sync";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Host-side settings for the sync layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Database schema the tracked tables live in
    pub schema: String,
    /// Role value the roster channel is filtered to
    pub student_role: String,
    /// Notifications buffered per channel before the transport waits
    pub channel_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            schema: DEFAULT_SCHEMA.to_string(),
            student_role: DEFAULT_STUDENT_ROLE.to_string(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl SyncConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: SyncConfig = toml::from_str(raw).context("invalid sync config")?;
        config.channel_capacity = config.channel_capacity.max(1);
        Ok(config)
    }

    /// Loads the config file.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// tried and a missing file falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::read_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::read_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("in {}", path.display()))
    }

    /// `<config dir>/exam-sync/config.toml`, when the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Applies the command line and environment on top of the file values
    pub fn with_overrides(mut self, channel_capacity: Option<usize>) -> Self {
        self.channel_capacity = resolve_channel_capacity(channel_capacity, self.channel_capacity);
        self
    }

    /// The channel each collection is subscribed through
    pub fn channel_spec(&self, collection: Collection) -> ChannelSpec {
        let (name, filter) = match collection {
            Collection::Exams => ("exams-changes", None),
            Collection::StudentExams => ("student-exams-changes", None),
            Collection::Profiles => (
                "profiles-changes",
                Some(RowFilter::eq(ROLE_COLUMN, self.student_role.clone())),
            ),
        };
        ChannelSpec {
            name: name.to_string(),
            schema: self.schema.clone(),
            table: collection.table().to_string(),
            filter,
        }
    }
}

/// Determines the per-channel buffer size
///
/// Priority order:
/// 1. --channel-capacity flag
/// 2. EXAM_SYNC_CHANNEL_CAPACITY env var
/// 3. config file value (or the built-in default)
pub fn resolve_channel_capacity(flag: Option<usize>, file_value: usize) -> usize {
    let env_value = std::env::var(CHANNEL_CAPACITY_ENV).ok();
    pick_channel_capacity(flag, env_value.as_deref(), file_value)
}

fn pick_channel_capacity(flag: Option<usize>, env_value: Option<&str>, file_value: usize) -> usize {
    if let Some(n) = flag {
        return n.max(1);
    }

    if let Some(raw) = env_value {
        match raw.trim().parse::<usize>() {
            Ok(n) if n > 0 => return n,
            _ => tracing::warn!(
                value = raw,
                "ignoring invalid {CHANNEL_CAPACITY_ENV}, expected a positive integer"
            ),
        }
    }

    file_value.max(1)
}
