use std::future::Future;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::OnceCell;
use tracing::instrument;
use travel_core::types::now_unix;

use crate::error::{CacheError, Result};
use crate::types::CachedGeneration;

/// Fingerprint-keyed single-flight cache for LLM generations.
///
/// At most one producer runs per fingerprint at a time: concurrent callers
/// requesting the same fingerprint share the in-flight [`OnceCell`] rather
/// than each issuing their own LLM call. Once the producer commits, later
/// callers read the committed row back from SQLite and skip the cell
/// entirely (subject to `ttl_secs`).
pub struct CacheStore {
    db: Mutex<Connection>,
    inflight: DashMap<String, Arc<OnceCell<CachedGeneration>>>,
}

impl CacheStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
            inflight: DashMap::new(),
        }
    }

    /// Return the committed generation for `fingerprint` if one exists and
    /// is still within its TTL (`ttl_secs == 0` never counts as fresh).
    #[instrument(skip(self))]
    pub fn get_committed(&self, fingerprint: &str) -> Result<Option<CachedGeneration>> {
        let db = self.db.lock().unwrap();
        let row = db
            .query_row(
                "SELECT fingerprint, content, content_hash, ttl_secs, created_at
                 FROM cached_generations WHERE fingerprint = ?1",
                params![fingerprint],
                row_to_generation,
            )
            .optional()?;
        Ok(row.filter(|g| g.is_fresh(now_unix())))
    }

    /// Single-flight: compute (or join an in-flight computation of) the
    /// generation for `fingerprint`, committing it on success.
    ///
    /// `producer` runs at most once per fingerprint per process, even
    /// across concurrently racing callers.
    pub async fn get_or_generate<F, Fut>(
        &self,
        fingerprint: &str,
        ttl_secs: u64,
        producer: F,
    ) -> Result<CachedGeneration>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<String, String>>,
    {
        if let Some(cached) = self.get_committed(fingerprint)? {
            return Ok(cached);
        }

        let cell = self
            .inflight
            .entry(fingerprint.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let result = cell
            .get_or_try_init(|| async {
                let content = producer().await.map_err(|message| CacheError::ProducerFailed {
                    fingerprint: fingerprint.to_string(),
                    message,
                })?;
                let generation = CachedGeneration::new(fingerprint, content, ttl_secs, now_unix());
                self.commit(&generation)?;
                Ok(generation)
            })
            .await
            .map(|g| g.clone());

        self.inflight.remove(fingerprint);
        result
    }

    #[instrument(skip(self, generation), fields(fingerprint = %generation.fingerprint))]
    fn commit(&self, generation: &CachedGeneration) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO cached_generations (fingerprint, content, content_hash, ttl_secs, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(fingerprint) DO UPDATE SET
                content = excluded.content,
                content_hash = excluded.content_hash,
                ttl_secs = excluded.ttl_secs,
                created_at = excluded.created_at",
            params![
                generation.fingerprint,
                generation.content,
                generation.content_hash,
                generation.ttl_secs as i64,
                generation.created_at,
            ],
        )?;
        Ok(())
    }

    /// Drop committed rows past their TTL. Entries with `ttl_secs == 0` are
    /// never read back but are still swept here to bound table growth.
    #[instrument(skip(self))]
    pub fn cleanup_expired(&self) -> Result<usize> {
        let db = self.db.lock().unwrap();
        let now = now_unix();
        let rows = db.execute(
            "DELETE FROM cached_generations WHERE created_at + ttl_secs < ?1",
            params![now],
        )?;
        Ok(rows)
    }
}

fn row_to_generation(row: &rusqlite::Row<'_>) -> rusqlite::Result<CachedGeneration> {
    Ok(CachedGeneration {
        fingerprint: row.get(0)?,
        content: row.get(1)?,
        content_hash: row.get(2)?,
        ttl_secs: row.get::<_, i64>(3)? as u64,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store() -> CacheStore {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        CacheStore::new(conn)
    }

    #[tokio::test]
    async fn get_or_generate_commits_and_reads_back() {
        let store = store();
        let gen = store
            .get_or_generate("fp1", 3600, || async { Ok("itinerary text".to_string()) })
            .await
            .unwrap();
        assert_eq!(gen.content, "itinerary text");

        let cached = store.get_committed("fp1").unwrap().unwrap();
        assert_eq!(cached.content_hash, gen.content_hash);
    }

    #[tokio::test]
    async fn zero_ttl_entries_are_not_read_back() {
        let store = store();
        store
            .get_or_generate("fp2", 0, || async { Ok("personalized".to_string()) })
            .await
            .unwrap();
        assert!(store.get_committed("fp2").unwrap().is_none());
    }

    #[tokio::test]
    async fn producer_failure_surfaces_and_clears_inflight_slot() {
        let store = store();
        let err = store
            .get_or_generate("fp3", 60, || async { Err("llm unavailable".to_string()) })
            .await;
        assert!(matches!(err, Err(CacheError::ProducerFailed { .. })));
        assert!(store.inflight.is_empty());
    }

    #[tokio::test]
    async fn concurrent_callers_single_flight_to_one_producer_invocation() {
        let store = Arc::new(store());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                store
                    .get_or_generate("fp4", 3600, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Ok("shared result".to_string())
                    })
                    .await
                    .unwrap()
            }));
        }

        let mut results = Vec::new();
        for h in handles {
            results.push(h.await.unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for r in &results {
            assert_eq!(r.content, "shared result");
        }
    }
}
