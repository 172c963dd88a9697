pub const SCHEMA: &str = r#"
-- chart_entries table (current snapshot only, replaced as a whole)
CREATE TABLE IF NOT EXISTS chart_entries (
    rank INTEGER PRIMARY KEY CHECK (rank > 0),
    title TEXT NOT NULL,
    artist TEXT NOT NULL,
    fetched_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chart_entries_artist ON chart_entries(artist);

-- search_terms table
CREATE TABLE IF NOT EXISTS search_terms (
    term TEXT PRIMARY KEY,
    count INTEGER NOT NULL DEFAULT 1 CHECK (count >= 1),
    first_seen TEXT NOT NULL DEFAULT (datetime('now')),
    last_seen TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_search_terms_count ON search_terms(count DESC);
"#;
