//! SQLite schema definitions.

/// Current schema version for migrations.
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema for the mastery database.
pub const SCHEMA: &str = r#"
-- Words under review after being missed in normal play
CREATE TABLE IF NOT EXISTS mastery_records (
    pair_id TEXT PRIMARY KEY,
    translation TEXT NOT NULL,
    success_count INTEGER NOT NULL DEFAULT 0 CHECK (success_count >= 0),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_mastery_updated ON mastery_records(updated_at);
"#;

/// Record the schema version if not yet present.
pub const INIT_SCHEMA_VERSION: &str = r#"
INSERT OR IGNORE INTO schema_version (version) VALUES (1);
"#;
