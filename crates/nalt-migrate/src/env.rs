use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// Source of the values a migration step generates.
pub trait MigrationEnv: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn new_document_id(&self) -> Uuid;

    /// `now()` as an RFC 3339 UTC timestamp with second precision.
    fn timestamp(&self) -> String {
        self.now().to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Wall clock and random version 4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl MigrationEnv for SystemEnv {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn new_document_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Fixed clock and identifier, for reproducible output.
#[derive(Debug, Clone, Copy)]
pub struct FixedEnv {
    pub now: DateTime<Utc>,
    pub document_id: Uuid,
}

impl MigrationEnv for FixedEnv {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn new_document_id(&self) -> Uuid {
        self.document_id
    }
}
