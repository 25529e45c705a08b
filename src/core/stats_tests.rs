//! Unit tests for SyncStatistics
//! These are in a separate file to keep stats.rs clean

#[cfg(test)]
mod tests {
    use crate::core::SyncStatistics;
    use crate::realtime::Collection;
    use crate::sync::ReloadKind;
    use std::time::Duration;

    #[test]
    fn test_sync_statistics_initialization() {
        let stats = SyncStatistics::new();
        assert_eq!(stats.total_notifications(), 0);
        assert_eq!(stats.total_reloads(), 0);
        assert_eq!(stats.active_subscriptions(), 0);
    }

    #[test]
    fn test_record_notification_per_collection() {
        let stats = SyncStatistics::new();
        stats.record_notification(Collection::Exams);
        stats.record_notification(Collection::Exams);
        stats.record_notification(Collection::Profiles);
        assert_eq!(stats.notifications(Collection::Exams), 2);
        assert_eq!(stats.notifications(Collection::StudentExams), 0);
        assert_eq!(stats.notifications(Collection::Profiles), 1);
        assert_eq!(stats.total_notifications(), 3);
    }

    #[test]
    fn test_record_reload_per_kind() {
        let stats = SyncStatistics::new();
        stats.record_reload(ReloadKind::DashboardStats);
        stats.record_reload(ReloadKind::AllStudents);
        stats.record_reload(ReloadKind::DashboardStats);
        assert_eq!(stats.reloads(ReloadKind::DashboardStats), 2);
        assert_eq!(stats.reloads(ReloadKind::AllStudents), 1);
        assert_eq!(stats.total_reloads(), 3);
    }

    #[test]
    fn test_active_subscriptions() {
        let stats = SyncStatistics::new();
        for _ in 0..3 {
            stats.record_opened();
        }
        stats.record_released();
        assert_eq!(stats.active_subscriptions(), 2);
    }

    #[test]
    fn test_summary_lists_only_nonzero_rows() {
        let stats = SyncStatistics::new();
        stats.record_notification(Collection::StudentExams);
        stats.record_reload(ReloadKind::StudentExams);
        stats.record_reload(ReloadKind::DashboardStats);
        stats.record_opened();
        stats.record_failure();

        let summary = stats.generate_summary(Duration::from_millis(1500));
        assert!(summary.contains("1 notification in 1.5s"));
        assert!(summary.contains("student_exams"));
        assert!(!summary.contains("profiles"));
        assert!(summary.contains("2 reloads dispatched"));
        assert!(summary.contains("dashboard stats"));
        assert!(summary.contains("1 failed"));
    }
}
