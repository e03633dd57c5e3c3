//! Database schema definitions

/// SQL to create all tables
pub const CREATE_TABLES: &str = r#"
-- Per-member property blobs, independent of any leaderboard
CREATE TABLE IF NOT EXISTS user_properties (
    service_id TEXT NOT NULL,
    member_id TEXT NOT NULL,
    properties TEXT NOT NULL,
    updated_at INTEGER DEFAULT (strftime('%s', 'now')),
    PRIMARY KEY (service_id, member_id)
);

-- ========== INDEXES ==========

CREATE INDEX IF NOT EXISTS idx_properties_service ON user_properties(service_id)
"#;
