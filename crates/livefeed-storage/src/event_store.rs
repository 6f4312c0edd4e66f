//! PostgreSQL implementation of EventStore
//!
//! - Payloads are stored as `JSON` text so key order survives the round trip
//! - Inserts run in an explicit transaction; the id is read back with
//!   `RETURNING` before the commit, so a failed or timed-out commit can be
//!   reported as [`StoreError::CommitUnconfirmed`] with the assigned id
//! - Every call is bounded by the configured timeout
//! - Feed queries use the `(subject_id, created_at DESC, id DESC)` index

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use livefeed_core::{Event, EventId, EventStore, NewEvent, StoreError, SubjectId};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, error, instrument};

use crate::config::StoreConfig;
use crate::models::EventRow;

/// PostgreSQL implementation of EventStore
///
/// # Example
///
/// ```ignore
/// use livefeed_storage::{PgEventStore, StoreConfig};
///
/// let store = PgEventStore::connect(&StoreConfig::new("postgres://localhost/livefeed")).await?;
/// store.migrate().await?;
/// ```
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgEventStore {
    /// Create a store over an existing pool
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Open a connection pool from configuration
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self::new(pool, config.timeout))
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the bundled migrations (creates the `events` table)
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Run a database future under the store timeout
    async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(|e| StoreError::Database(e.to_string())),
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    #[instrument(skip(self, event), fields(subject_id = %event.subject_id))]
    async fn insert_event(&self, event: NewEvent) -> Result<Event, StoreError> {
        let mut tx = self.bounded(self.pool.begin()).await?;

        // Bound as text and cast, so the stored JSON keeps the caller's key order
        let payload = serde_json::to_string(&event.payload)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let (id, created_at) = self
            .bounded(
                sqlx::query_as::<_, (i64, DateTime<Utc>)>(
                    r#"
                    INSERT INTO events (subject_id, event_type, payload)
                    VALUES ($1, $2, $3::json)
                    RETURNING id, created_at
                    "#,
                )
                .bind(event.subject_id.0)
                .bind(&event.event_type)
                .bind(payload)
                .fetch_one(&mut *tx),
            )
            .await
            .inspect_err(|e| error!("Failed to insert event: {}", e))?;

        let id = EventId(id);
        match tokio::time::timeout(self.timeout, tx.commit()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(%id, "Commit failed after insert: {}", e);
                return Err(StoreError::CommitUnconfirmed {
                    id,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                error!(%id, "Commit timed out after insert");
                return Err(StoreError::CommitUnconfirmed {
                    id,
                    reason: format!("commit timed out after {:?}", self.timeout),
                });
            }
        }

        debug!(%id, "inserted event");
        Ok(Event::from_new(event, id, created_at))
    }

    #[instrument(skip(self))]
    async fn recent_events(&self, subject_id: SubjectId, limit: usize) -> Result<Vec<Event>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = self
            .bounded(
                sqlx::query_as::<_, EventRow>(
                    r#"
                    SELECT id, subject_id, event_type, payload, created_at
                    FROM events
                    WHERE subject_id = $1
                    ORDER BY created_at DESC, id DESC
                    LIMIT $2
                    "#,
                )
                .bind(subject_id.0)
                .bind(limit)
                .fetch_all(&self.pool),
            )
            .await
            .inspect_err(|e| error!("Failed to query recent events: {}", e))?;

        debug!(count = rows.len(), "loaded recent events");
        rows.into_iter().map(Event::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn get_event(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        let row = self
            .bounded(
                sqlx::query_as::<_, EventRow>(
                    r#"
                    SELECT id, subject_id, event_type, payload, created_at
                    FROM events
                    WHERE id = $1
                    "#,
                )
                .bind(id.0)
                .fetch_optional(&self.pool),
            )
            .await
            .inspect_err(|e| error!("Failed to get event: {}", e))?;

        row.map(Event::try_from).transpose()
    }
}
