//! Replay command implementation
//!
//! Drives a coordinator from a JSON-lines script of viewer changes and change
//! notifications, published through the in-memory transport, and reports
//! which reloads fired.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::core::{SyncConfig, SyncStatistics};
use crate::realtime::{ChangeNotification, MemoryTransport, RealtimeTransport};
use crate::sync::{ReloadCallbacks, ReloadKind, SyncCoordinator, ViewerIdentity};

const PROGRESS_TEMPLATE: &str = "{prefix:.bold} [{bar:30}] {pos}/{len} {wide_msg}";
const PROGRESS_CHARS: &str = "##-";

// Upper bound on waiting for listeners and spawned reloads to catch up
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// One line of a replay script
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Sign a viewer in (`id`) or out (`null`)
    Viewer { id: Option<String> },
    Notify { notification: ChangeNotification },
    Wait { millis: u64 },
}

/// Parses a script, skipping blank lines and `#` comments
pub fn parse_script(raw: &str) -> Result<Vec<ScriptStep>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(idx, line)| {
            serde_json::from_str(line.trim())
                .with_context(|| format!("invalid script step on line {}", idx + 1))
        })
        .collect()
}

pub struct ReplayOptions {
    pub viewer: Option<String>,
    pub config: SyncConfig,
    pub quiet: bool,
}

/// Outcome of a replay
#[derive(Debug)]
pub struct ReplaySummary {
    pub steps: usize,
    pub published: usize,
    pub delivered: usize,
    /// Reload callbacks that ran to completion, per kind
    pub completed_reloads: BTreeMap<ReloadKind, u64>,
    pub stats: Arc<SyncStatistics>,
    pub open_channels_after: usize,
    pub duration: Duration,
}

impl ReplaySummary {
    pub fn completed(&self, kind: ReloadKind) -> u64 {
        self.completed_reloads.get(&kind).copied().unwrap_or(0)
    }
}

/// Tallies finished reloads so the replay can wait for them
#[derive(Default)]
struct ReloadTally {
    counts: [AtomicU64; 4],
}

impl ReloadTally {
    fn slot(kind: ReloadKind) -> usize {
        match kind {
            ReloadKind::Exams => 0,
            ReloadKind::StudentExams => 1,
            ReloadKind::DashboardStats => 2,
            ReloadKind::AllStudents => 3,
        }
    }

    fn record(&self, kind: ReloadKind) {
        self.counts[Self::slot(kind)].fetch_add(1, Ordering::Relaxed);
    }

    fn get(&self, kind: ReloadKind) -> u64 {
        self.counts[Self::slot(kind)].load(Ordering::Relaxed)
    }

    fn total(&self) -> u64 {
        ReloadKind::ALL.iter().map(|k| self.get(*k)).sum()
    }
}

/// Handles the replay command for a script file
pub async fn handle_replay_command(script: &Path, options: ReplayOptions) -> Result<ReplaySummary> {
    let raw = std::fs::read_to_string(script)
        .with_context(|| format!("failed to read script {}", script.display()))?;
    let steps = parse_script(&raw)?;
    let quiet = options.quiet;

    let summary = replay_steps(&steps, options).await?;

    if !quiet {
        println!("\n{}", summary.stats.generate_summary(summary.duration));
        println!(
            "✅ {} {} replayed • {} published • {} delivered",
            summary.steps,
            if summary.steps == 1 { "step" } else { "steps" },
            summary.published,
            summary.delivered
        );
    }
    Ok(summary)
}

/// Runs already-parsed steps against a fresh in-memory transport
pub async fn replay_steps(steps: &[ScriptStep], options: ReplayOptions) -> Result<ReplaySummary> {
    let start_time = Instant::now();
    let transport = Arc::new(MemoryTransport::new(options.config.channel_capacity));
    let tally = Arc::new(ReloadTally::default());

    let recorder = Arc::clone(&tally);
    let callbacks = ReloadCallbacks::from_fn(move |kind| {
        let recorder = Arc::clone(&recorder);
        async move {
            info!(reload = %kind, "reload");
            recorder.record(kind);
            Ok(())
        }
    });

    let shared: Arc<dyn RealtimeTransport> = transport.clone();
    let mut coordinator = SyncCoordinator::new(shared, callbacks, &options.config);
    let stats = coordinator.stats();

    let progress = create_progress_bar(steps.len(), options.quiet)?;

    if let Some(id) = options.viewer {
        coordinator.activate(ViewerIdentity::new(id)).await;
    }

    let mut published = 0;
    let mut delivered = 0;
    for step in steps {
        match step {
            ScriptStep::Viewer { id } => {
                progress.set_message(match id {
                    Some(id) => format!("viewer {id}"),
                    None => "viewer signed out".to_string(),
                });
                coordinator
                    .set_viewer(id.clone().map(ViewerIdentity::new))
                    .await;
            }
            ScriptStep::Notify { notification } => {
                progress.set_message(format!("{} {}", notification.event, notification.table));
                let target = stats.total_notifications();
                let reached = transport.publish(notification).await;
                published += 1;
                delivered += reached;
                // Let listeners drain before the next step can tear them down
                wait_until(|| stats.total_notifications() >= target + reached as u64).await;
            }
            ScriptStep::Wait { millis } => {
                progress.set_message(format!("waiting {millis}ms"));
                tokio::time::sleep(Duration::from_millis(*millis)).await;
            }
        }
        progress.inc(1);
    }

    if !wait_until(|| tally.total() >= stats.total_reloads()).await {
        warn!(
            dispatched = stats.total_reloads(),
            completed = tally.total(),
            "reloads still in flight after settle timeout"
        );
    }
    progress.finish_and_clear();

    drop(coordinator);

    let completed_reloads = ReloadKind::ALL
        .iter()
        .map(|kind| (*kind, tally.get(*kind)))
        .collect();

    Ok(ReplaySummary {
        steps: steps.len(),
        published,
        delivered,
        completed_reloads,
        stats,
        open_channels_after: transport.open_channel_count(),
        duration: start_time.elapsed(),
    })
}

/// Polls `done` until it holds or the settle timeout passes
async fn wait_until(done: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + SETTLE_TIMEOUT;
    while !done() {
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    true
}

fn create_progress_bar(len: usize, quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(PROGRESS_TEMPLATE)?
            .progress_chars(PROGRESS_CHARS),
    );
    pb.set_prefix("🔄 replay");
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script_skips_comments_and_blank_lines() {
        let raw = r#"
# sign in
{"step":"viewer","id":"teacher-1"}

{"step":"notify","notification":{"table":"exams","event":"INSERT"}}
{"step":"wait","millis":5}
{"step":"viewer","id":null}
"#;
        let steps = parse_script(raw).unwrap();
        assert_eq!(steps.len(), 4);
        assert!(matches!(&steps[0], ScriptStep::Viewer { id: Some(id) } if id == "teacher-1"));
        assert!(matches!(&steps[1], ScriptStep::Notify { notification } if notification.table == "exams"));
        assert!(matches!(steps[2], ScriptStep::Wait { millis: 5 }));
        assert!(matches!(steps[3], ScriptStep::Viewer { id: None }));
    }

    #[test]
    fn test_parse_script_reports_line_number() {
        let raw = "{\"step\":\"viewer\",\"id\":\"a\"}\n{\"step\":\"explode\"}\n";
        let err = parse_script(raw).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
