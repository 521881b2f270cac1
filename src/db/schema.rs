//! Database schema

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS fitness_records (
    user_id TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

/// Single-statement upsert so each write replaces the payload atomically
pub const UPSERT_RECORD: &str = "
INSERT INTO fitness_records (user_id, data, created_at, updated_at)
VALUES (?1, ?2, ?3, ?3)
ON CONFLICT(user_id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
";

pub const SELECT_RECORD: &str = "SELECT data FROM fitness_records WHERE user_id = ?1";
