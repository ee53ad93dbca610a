pub const SCHEMA: &str = r#"
-- posts table, keyed by the platform-native post id
CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY,
    handle TEXT NOT NULL,
    content TEXT NOT NULL,
    category TEXT NOT NULL,
    matched_keyword TEXT,
    created_at TEXT NOT NULL,
    collected_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_posts_category ON posts(category);
CREATE INDEX IF NOT EXISTS idx_posts_handle ON posts(handle);

-- keywords table; keywords are stored normalized, so UNIQUE dedups
-- casing/spacing variants of the same ticker
CREATE TABLE IF NOT EXISTS keywords (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    keyword TEXT NOT NULL UNIQUE
);
"#;
