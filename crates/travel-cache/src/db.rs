use rusqlite::{Connection, Result};

/// Initialise the cache table. Safe to call on every startup (idempotent).
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS cached_generations (
            fingerprint   TEXT PRIMARY KEY,
            content       TEXT NOT NULL,
            content_hash  TEXT NOT NULL,
            ttl_secs      INTEGER NOT NULL,
            created_at    INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_cached_generations_created
            ON cached_generations(created_at);",
    )
}
