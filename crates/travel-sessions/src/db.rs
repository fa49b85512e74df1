use rusqlite::Connection;

use crate::error::Result;

/// Initialise the sessions/messages tables and their indices.
///
/// Safe to call on every startup — uses `IF NOT EXISTS` throughout.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sessions (
            session_id   TEXT PRIMARY KEY,
            user_id      TEXT NOT NULL,
            profile_id   TEXT NOT NULL,
            city_name    TEXT,
            status       TEXT NOT NULL,
            context_json TEXT NOT NULL DEFAULT '{}',
            created_at   INTEGER NOT NULL,
            updated_at   INTEGER NOT NULL,
            expires_at   INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sessions_user
            ON sessions(user_id, status);

        CREATE TABLE IF NOT EXISTS messages (
            message_id  TEXT PRIMARY KEY,
            session_id  TEXT NOT NULL,
            role        TEXT NOT NULL,
            type        TEXT NOT NULL,
            content     TEXT NOT NULL,
            timestamp   INTEGER NOT NULL,
            metadata_json TEXT,
            FOREIGN KEY(session_id) REFERENCES sessions(session_id)
        );
        CREATE INDEX IF NOT EXISTS idx_messages_session
            ON messages(session_id, timestamp);",
    )?;
    Ok(())
}
