//! Change notifications emitted by the backend's real-time service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Logical record collections the dashboards track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Exams,
    StudentExams,
    Profiles,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Exams,
        Collection::StudentExams,
        Collection::Profiles,
    ];

    /// Backend table backing this collection
    pub fn table(self) -> &'static str {
        match self {
            Collection::Exams => "exams",
            Collection::StudentExams => "student_exams",
            Collection::Profiles => "profiles",
        }
    }

    pub fn from_table(table: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.table() == table)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Insert => "INSERT",
            EventKind::Update => "UPDATE",
            EventKind::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// A single insert/update/delete on a backend table.
///
/// The coordinator only looks at which channel delivered it; the payload is
/// kept so transports can evaluate row filters against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeNotification {
    #[serde(default = "default_schema")]
    pub schema: String,
    pub table: String,
    pub event: EventKind,
    #[serde(default = "Utc::now")]
    pub commit_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub new: Value,
    #[serde(default)]
    pub old: Value,
}

fn default_schema() -> String {
    crate::core::config::DEFAULT_SCHEMA.to_string()
}

impl ChangeNotification {
    pub fn new(table: impl Into<String>, event: EventKind) -> Self {
        Self {
            schema: default_schema(),
            table: table.into(),
            event,
            commit_timestamp: Utc::now(),
            new: Value::Null,
            old: Value::Null,
        }
    }

    /// Shorthand for a notification on one of the tracked collections
    pub fn for_collection(collection: Collection, event: EventKind) -> Self {
        Self::new(collection.table(), event)
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn with_new(mut self, record: Value) -> Self {
        self.new = record;
        self
    }

    pub fn with_old(mut self, record: Value) -> Self {
        self.old = record;
        self
    }

    /// The row a filter applies to: the old row for deletes, the new row otherwise
    pub fn record(&self) -> &Value {
        match self.event {
            EventKind::Delete => &self.old,
            EventKind::Insert | EventKind::Update => &self.new,
        }
    }

    pub fn collection(&self) -> Option<Collection> {
        Collection::from_table(&self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_table_lookup() {
        for collection in Collection::ALL {
            assert_eq!(Collection::from_table(collection.table()), Some(collection));
        }
        assert_eq!(Collection::from_table("grades"), None);
        assert_eq!(Collection::StudentExams.to_string(), "student_exams");
    }

    #[test]
    fn test_parse_minimal_notification() {
        let raw = r#"{"table":"exams","event":"INSERT"}"#;
        let notification: ChangeNotification = serde_json::from_str(raw).unwrap();
        assert_eq!(notification.schema, "public");
        assert_eq!(notification.event, EventKind::Insert);
        assert_eq!(notification.collection(), Some(Collection::Exams));
        assert!(notification.new.is_null());
    }

    #[test]
    fn test_record_uses_old_row_for_deletes() {
        let notification = ChangeNotification::for_collection(Collection::Profiles, EventKind::Delete)
            .with_old(json!({"role": "student"}))
            .with_new(json!({"role": "teacher"}));
        assert_eq!(notification.record()["role"], "student");

        let update = ChangeNotification::for_collection(Collection::Profiles, EventKind::Update)
            .with_new(json!({"role": "teacher"}));
        assert_eq!(update.record()["role"], "teacher");
    }
}
