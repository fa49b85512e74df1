use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::instrument;
use travel_core::types::now_unix;

use crate::error::{Result, SessionError};
use crate::types::{Message, Session, SessionContext, SessionStatus};

/// Thread-safe session store. Wraps a single SQLite connection in a
/// `Mutex` — session rows are write-locked at session granularity (§5),
/// which a process-wide connection mutex gives us for free at this scale.
pub struct SessionStore {
    db: Mutex<Connection>,
}

impl SessionStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Idempotent on `session_id`: a second `create` for the same id is a
    /// no-op and returns the row already on disk.
    #[instrument(skip(self, session), fields(session_id = %session.session_id))]
    pub fn create(&self, session: &Session) -> Result<Session> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT OR IGNORE INTO sessions
             (session_id, user_id, profile_id, city_name, status, context_json, created_at, updated_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, '{}', ?6, ?7, ?8)",
            params![
                session.session_id,
                session.user_id,
                session.profile_id,
                session.city_name,
                session.status.as_str(),
                session.created_at,
                session.updated_at,
                session.expires_at,
            ],
        )?;
        self.get(&session.session_id)?
            .ok_or_else(|| SessionError::NotFound { session_id: session.session_id.clone() })
    }

    #[instrument(skip(self))]
    pub fn get(&self, session_id: &str) -> Result<Option<Session>> {
        let db = self.db.lock().unwrap();
        let row = db
            .query_row(
                "SELECT session_id, user_id, profile_id, city_name, status, created_at, updated_at, expires_at
                 FROM sessions WHERE session_id = ?1",
                params![session_id],
                row_to_session,
            )
            .optional()?;
        Ok(row)
    }

    #[instrument(skip(self))]
    pub fn get_context(&self, session_id: &str) -> Result<Option<SessionContext>> {
        let db = self.db.lock().unwrap();
        let raw: Option<String> = db
            .query_row(
                "SELECT context_json FROM sessions WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw.map(|s| serde_json::from_str(&s).unwrap_or_default()))
    }

    /// Atomic append; fails with `NotActive` unless the session is active.
    /// Idempotent on `(session_id, message_id)` — re-appending an id that
    /// already exists is a no-op, not an error.
    #[instrument(skip(self, message), fields(session_id = %message.session_id, message_id = %message.message_id))]
    pub fn append_message(&self, message: &Message) -> Result<()> {
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM messages WHERE message_id = ?1",
                params![message.message_id],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            tx.commit()?;
            return Ok(());
        }

        let status: Option<String> = tx
            .query_row(
                "SELECT status FROM sessions WHERE session_id = ?1",
                params![message.session_id],
                |row| row.get(0),
            )
            .optional()?;
        let status = status.ok_or_else(|| SessionError::NotFound {
            session_id: message.session_id.clone(),
        })?;
        if SessionStatus::parse(&status) != SessionStatus::Active {
            return Err(SessionError::NotActive {
                session_id: message.session_id.clone(),
            });
        }

        let metadata_json = message
            .metadata
            .as_ref()
            .map(|m| serde_json::to_string(m).unwrap_or_default());

        tx.execute(
            "INSERT INTO messages (message_id, session_id, role, type, content, timestamp, metadata_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                message.message_id,
                message.session_id,
                message.role.as_str(),
                message.message_type.as_str(),
                message.content,
                message.timestamp,
                metadata_json,
            ],
        )?;
        tx.execute(
            "UPDATE sessions SET updated_at = ?1 WHERE session_id = ?2",
            params![message.timestamp, message.session_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Full-replace `session_context`, guarded by an optimistic check on
    /// `updated_at`. `expires_at` is only ever extended, never shortened.
    #[instrument(skip(self, context))]
    pub fn update_context(
        &self,
        session_id: &str,
        expected_updated_at: i64,
        context: &SessionContext,
        extend_expires_at: Option<i64>,
    ) -> Result<()> {
        let db = self.db.lock().unwrap();
        let now = now_unix();
        let context_json = serde_json::to_string(context).unwrap_or_default();

        let rows = if let Some(new_expiry) = extend_expires_at {
            db.execute(
                "UPDATE sessions
                 SET context_json = ?1, updated_at = ?2,
                     expires_at = MAX(expires_at, ?3)
                 WHERE session_id = ?4 AND updated_at = ?5",
                params![context_json, now, new_expiry, session_id, expected_updated_at],
            )?
        } else {
            db.execute(
                "UPDATE sessions SET context_json = ?1, updated_at = ?2
                 WHERE session_id = ?3 AND updated_at = ?4",
                params![context_json, now, session_id, expected_updated_at],
            )?
        };

        if rows == 0 {
            let exists: Option<i64> = db
                .query_row(
                    "SELECT 1 FROM sessions WHERE session_id = ?1",
                    params![session_id],
                    |row| row.get(0),
                )
                .optional()?;
            return Err(if exists.is_some() {
                SessionError::StaleUpdate {
                    session_id: session_id.to_string(),
                }
            } else {
                SessionError::NotFound {
                    session_id: session_id.to_string(),
                }
            });
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn expire(&self, session_id: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        let rows = db.execute(
            "UPDATE sessions SET status = 'expired', updated_at = ?1 WHERE session_id = ?2",
            params![now_unix(), session_id],
        )?;
        if rows == 0 {
            return Err(SessionError::NotFound {
                session_id: session_id.to_string(),
            });
        }
        Ok(())
    }

    /// Mark every active session past its `expires_at` as expired. Returns
    /// the number of rows affected.
    #[instrument(skip(self))]
    pub fn cleanup_expired(&self) -> Result<usize> {
        let db = self.db.lock().unwrap();
        let now = now_unix();
        let rows = db.execute(
            "UPDATE sessions SET status = 'expired', updated_at = ?1
             WHERE status = 'active' AND expires_at < ?1",
            params![now],
        )?;
        Ok(rows)
    }

    /// Full transcript for a session, oldest first.
    #[instrument(skip(self))]
    pub fn list_messages(&self, session_id: &str) -> Result<Vec<Message>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT message_id, session_id, role, type, content, timestamp, metadata_json
             FROM messages WHERE session_id = ?1 ORDER BY timestamp ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![session_id], row_to_message)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    #[instrument(skip(self))]
    pub fn list_active(&self, user_id: &str) -> Result<Vec<Session>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT session_id, user_id, profile_id, city_name, status, created_at, updated_at, expires_at
             FROM sessions WHERE user_id = ?1 AND status = 'active'
             ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map(params![user_id], row_to_session)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let metadata_json: Option<String> = row.get(6)?;
    Ok(Message {
        message_id: row.get(0)?,
        session_id: row.get(1)?,
        role: crate::types::MessageRole::parse(&row.get::<_, String>(2)?).unwrap_or(crate::types::MessageRole::User),
        message_type: crate::types::MessageType::parse(&row.get::<_, String>(3)?).unwrap_or(crate::types::MessageType::Response),
        content: row.get(4)?,
        timestamp: row.get(5)?,
        metadata: metadata_json.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        session_id: row.get(0)?,
        user_id: row.get(1)?,
        profile_id: row.get(2)?,
        city_name: row.get(3)?,
        status: SessionStatus::parse(&row.get::<_, String>(4)?),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        expires_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::types::{MessageRole, MessageType};

    fn store() -> SessionStore {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        SessionStore::new(conn)
    }

    fn sample_session(id: &str) -> Session {
        Session::new(id.into(), "user-1".into(), "profile-1".into(), Some("Lisbon".into()), 3600)
    }

    #[test]
    fn create_then_get_returns_created_session() {
        let store = store();
        let created = store.create(&sample_session("s1")).unwrap();
        let fetched = store.get("s1").unwrap().unwrap();
        assert_eq!(created.session_id, fetched.session_id);
        assert_eq!(fetched.status, SessionStatus::Active);
    }

    #[test]
    fn create_is_idempotent_on_session_id() {
        let store = store();
        let a = store.create(&sample_session("s2")).unwrap();
        let b = store.create(&sample_session("s2")).unwrap();
        assert_eq!(a.created_at, b.created_at);
    }

    #[test]
    fn append_message_rejects_inactive_session() {
        let store = store();
        store.create(&sample_session("s3")).unwrap();
        store.expire("s3").unwrap();

        let msg = Message {
            message_id: "m1".into(),
            session_id: "s3".into(),
            role: MessageRole::User,
            message_type: MessageType::InitialRequest,
            content: "itinerary in Lisbon".into(),
            timestamp: now_unix(),
            metadata: None,
        };
        assert!(matches!(
            store.append_message(&msg),
            Err(SessionError::NotActive { .. })
        ));
    }

    #[test]
    fn append_message_is_idempotent_on_message_id() {
        let store = store();
        store.create(&sample_session("s4")).unwrap();
        let msg = Message {
            message_id: "m1".into(),
            session_id: "s4".into(),
            role: MessageRole::User,
            message_type: MessageType::InitialRequest,
            content: "itinerary in Lisbon".into(),
            timestamp: now_unix(),
            metadata: None,
        };
        store.append_message(&msg).unwrap();
        store.append_message(&msg).unwrap();
    }

    #[test]
    fn update_context_fails_on_stale_updated_at() {
        let store = store();
        let created = store.create(&sample_session("s5")).unwrap();
        let ctx = SessionContext::default();
        store
            .update_context("s5", created.updated_at, &ctx, None)
            .unwrap();
        // Second call reuses the now-stale `created.updated_at`.
        let err = store.update_context("s5", created.updated_at, &ctx, None);
        assert!(matches!(err, Err(SessionError::StaleUpdate { .. })));
    }

    #[test]
    fn cleanup_expired_flips_status() {
        let store = store();
        let mut s = sample_session("s6");
        s.expires_at = now_unix() - 1;
        store.create(&s).unwrap();
        let n = store.cleanup_expired().unwrap();
        assert_eq!(n, 1);
        assert_eq!(store.get("s6").unwrap().unwrap().status, SessionStatus::Expired);
    }

    #[test]
    fn list_messages_returns_transcript_in_order() {
        let store = store();
        store.create(&sample_session("s9")).unwrap();
        let first = Message {
            message_id: "m1".into(),
            session_id: "s9".into(),
            role: MessageRole::User,
            message_type: MessageType::InitialRequest,
            content: "itinerary in Lisbon".into(),
            timestamp: 100,
            metadata: None,
        };
        let second = Message {
            message_id: "m2".into(),
            session_id: "s9".into(),
            role: MessageRole::Assistant,
            message_type: MessageType::Response,
            content: "here you go".into(),
            timestamp: 101,
            metadata: None,
        };
        store.append_message(&first).unwrap();
        store.append_message(&second).unwrap();

        let transcript = store.list_messages("s9").unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].message_id, "m1");
        assert_eq!(transcript[1].message_id, "m2");
    }

    #[test]
    fn list_active_excludes_expired() {
        let store = store();
        store.create(&sample_session("s7")).unwrap();
        let mut expired = sample_session("s8");
        expired.status = SessionStatus::Expired;
        store.create(&expired).unwrap();
        let active = store.list_active("user-1").unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].session_id, "s7");
    }
}
