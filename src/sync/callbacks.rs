//! Reload callbacks supplied by the hosting dashboard view

use anyhow::Result;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::realtime::Collection;

/// A zero-argument async refresh of one cached dashboard view
pub type ReloadFn = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Wraps an async closure as a [`ReloadFn`]
pub fn reload_fn<F, Fut>(f: F) -> ReloadFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReloadKind {
    Exams,
    StudentExams,
    DashboardStats,
    AllStudents,
}

impl ReloadKind {
    pub const ALL: [ReloadKind; 4] = [
        ReloadKind::Exams,
        ReloadKind::StudentExams,
        ReloadKind::DashboardStats,
        ReloadKind::AllStudents,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ReloadKind::Exams => "exams",
            ReloadKind::StudentExams => "student exams",
            ReloadKind::DashboardStats => "dashboard stats",
            ReloadKind::AllStudents => "all students",
        }
    }
}

impl fmt::Display for ReloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reloads triggered by a change on `collection`. Every change also refreshes
/// the aggregate dashboard statistics.
pub fn reloads_for(collection: Collection) -> [ReloadKind; 2] {
    let primary = match collection {
        Collection::Exams => ReloadKind::Exams,
        Collection::StudentExams => ReloadKind::StudentExams,
        Collection::Profiles => ReloadKind::AllStudents,
    };
    [primary, ReloadKind::DashboardStats]
}

/// The four refresh operations a dashboard hands to the coordinator.
///
/// Each one fully replaces its own cached view, so invocations may overlap.
#[derive(Clone)]
pub struct ReloadCallbacks {
    exams: ReloadFn,
    student_exams: ReloadFn,
    dashboard_stats: ReloadFn,
    all_students: ReloadFn,
}

impl ReloadCallbacks {
    pub fn new(
        exams: ReloadFn,
        student_exams: ReloadFn,
        dashboard_stats: ReloadFn,
        all_students: ReloadFn,
    ) -> Self {
        Self {
            exams,
            student_exams,
            dashboard_stats,
            all_students,
        }
    }

    /// Builds all four callbacks from one closure that receives the kind
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(ReloadKind) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let f = Arc::new(f);
        let make = |kind: ReloadKind| {
            let f = Arc::clone(&f);
            reload_fn(move || f(kind))
        };
        Self::new(
            make(ReloadKind::Exams),
            make(ReloadKind::StudentExams),
            make(ReloadKind::DashboardStats),
            make(ReloadKind::AllStudents),
        )
    }

    pub fn get(&self, kind: ReloadKind) -> &ReloadFn {
        match kind {
            ReloadKind::Exams => &self.exams,
            ReloadKind::StudentExams => &self.student_exams,
            ReloadKind::DashboardStats => &self.dashboard_stats,
            ReloadKind::AllStudents => &self.all_students,
        }
    }

    pub fn invoke(&self, kind: ReloadKind) -> BoxFuture<'static, Result<()>> {
        (self.get(kind))()
    }
}

impl fmt::Debug for ReloadCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReloadCallbacks").finish_non_exhaustive()
    }
}
