//! Statistics tracking for subscriptions, notifications and reloads

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::realtime::Collection;
use crate::sync::ReloadKind;

/// Counters shared between the coordinator and its listener tasks
///
/// Atomic throughout so listeners can record without locking.
#[derive(Debug, Default)]
pub struct SyncStatistics {
    pub exams_notifications: AtomicU64,
    pub student_exams_notifications: AtomicU64,
    pub profiles_notifications: AtomicU64,

    pub exams_reloads: AtomicU64,
    pub student_exams_reloads: AtomicU64,
    pub dashboard_stats_reloads: AtomicU64,
    pub all_students_reloads: AtomicU64,

    pub subscriptions_opened: AtomicU64,
    pub subscriptions_released: AtomicU64,
    pub subscription_failures: AtomicU64,
}

impl SyncStatistics {
    /// Creates a new statistics tracker with all counters initialized to zero
    pub fn new() -> Self {
        Self::default()
    }

    fn notification_counter(&self, collection: Collection) -> &AtomicU64 {
        match collection {
            Collection::Exams => &self.exams_notifications,
            Collection::StudentExams => &self.student_exams_notifications,
            Collection::Profiles => &self.profiles_notifications,
        }
    }

    fn reload_counter(&self, kind: ReloadKind) -> &AtomicU64 {
        match kind {
            ReloadKind::Exams => &self.exams_reloads,
            ReloadKind::StudentExams => &self.student_exams_reloads,
            ReloadKind::DashboardStats => &self.dashboard_stats_reloads,
            ReloadKind::AllStudents => &self.all_students_reloads,
        }
    }

    pub fn record_notification(&self, collection: Collection) {
        self.notification_counter(collection)
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reload(&self, kind: ReloadKind) {
        self.reload_counter(kind).fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_opened(&self) {
        self.subscriptions_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_released(&self) {
        self.subscriptions_released.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.subscription_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn notifications(&self, collection: Collection) -> u64 {
        self.notification_counter(collection).load(Ordering::Relaxed)
    }

    pub fn reloads(&self, kind: ReloadKind) -> u64 {
        self.reload_counter(kind).load(Ordering::Relaxed)
    }

    pub fn total_notifications(&self) -> u64 {
        Collection::ALL.iter().map(|c| self.notifications(*c)).sum()
    }

    pub fn total_reloads(&self) -> u64 {
        ReloadKind::ALL.iter().map(|k| self.reloads(*k)).sum()
    }

    /// Subscriptions opened and not yet released
    pub fn active_subscriptions(&self) -> u64 {
        self.subscriptions_opened
            .load(Ordering::Relaxed)
            .saturating_sub(self.subscriptions_released.load(Ordering::Relaxed))
    }

    /// Generates a summary string of the run
    pub fn generate_summary(&self, duration: Duration) -> String {
        let mut lines = Vec::new();

        let notifications = self.total_notifications();
        let notification_word = if notifications == 1 {
            "notification"
        } else {
            "notifications"
        };
        lines.push(format!(
            "📨 {notifications} {notification_word} in {:.1}s",
            duration.as_secs_f64()
        ));
        for collection in Collection::ALL {
            let count = self.notifications(collection);
            if count > 0 {
                lines.push(format!("   {:<15} {count}", collection.table()));
            }
        }

        lines.push(format!("🔄 {} reloads dispatched", self.total_reloads()));
        for kind in ReloadKind::ALL {
            let count = self.reloads(kind);
            if count > 0 {
                lines.push(format!("   {:<15} {count}", kind.label()));
            }
        }

        let failures = self.subscription_failures.load(Ordering::Relaxed);
        let mut subscriptions = format!(
            "🔌 {} opened • {} released",
            self.subscriptions_opened.load(Ordering::Relaxed),
            self.subscriptions_released.load(Ordering::Relaxed)
        );
        if failures > 0 {
            subscriptions.push_str(&format!(" • {failures} failed"));
        }
        lines.push(subscriptions);

        lines.join("\n")
    }
}
