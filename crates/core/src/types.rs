/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Identifier of a persisted guest memory.
pub type MemoryId = DbId;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
