// Record store: typed CRUD over festivals and events.
//
// The service only sees the `RecordStore` trait; `SqliteStore` is the SQLite
// implementation on an SQLx pool. Foreign keys are enabled on every
// connection so an event insert racing a festival delete fails at the
// constraint instead of orphaning a row.

use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::models::{Event, Festival, NewEvent, NewFestival};

/// Outcome of a guarded festival delete, decided inside one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FestivalDelete {
    Deleted,
    Missing,
    HasEvents(i64),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_festivals(&self) -> Result<Vec<Festival>>;
    async fn get_festival(&self, id: i64) -> Result<Option<Festival>>;
    async fn insert_festival(&self, input: &NewFestival) -> Result<Festival>;
    async fn replace_festival(&self, festival: &Festival) -> Result<bool>;
    /// Rejects the delete while any event still references the festival.
    async fn delete_festival(&self, id: i64) -> Result<FestivalDelete>;

    async fn list_events(&self, festival_id: Option<i64>) -> Result<Vec<Event>>;
    async fn get_event(&self, id: i64) -> Result<Option<Event>>;
    async fn insert_event(&self, input: &NewEvent) -> Result<Event>;
    async fn replace_event(&self, event: &Event) -> Result<bool>;
    async fn delete_event(&self, id: i64) -> Result<bool>;
}

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Ok(SqliteStore { pool })
    }

    /// In-memory store for tests. A single connection, since each SQLite
    /// `:memory:` connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let store = SqliteStore { pool };
        store.init().await?;
        Ok(store)
    }

    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS festivals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                kind TEXT NOT NULL,
                description TEXT,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                location TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                location TEXT NOT NULL,
                capacity INTEGER NOT NULL DEFAULT 0,
                festival_id INTEGER NOT NULL REFERENCES festivals(id)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_festival ON events(festival_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_start_time ON events(start_time)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_festivals_start_date ON festivals(start_date)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn list_festivals(&self) -> Result<Vec<Festival>> {
        let festivals = sqlx::query_as::<_, Festival>(
            "SELECT id, name, kind, description, start_date, end_date, location, is_active
             FROM festivals ORDER BY start_date ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(festivals)
    }

    async fn get_festival(&self, id: i64) -> Result<Option<Festival>> {
        let festival = sqlx::query_as::<_, Festival>(
            "SELECT id, name, kind, description, start_date, end_date, location, is_active
             FROM festivals WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(festival)
    }

    async fn insert_festival(&self, input: &NewFestival) -> Result<Festival> {
        let result = sqlx::query(
            "INSERT INTO festivals (name, kind, description, start_date, end_date, location, is_active)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&input.name)
        .bind(&input.kind)
        .bind(&input.description)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(&input.location)
        .bind(input.is_active)
        .execute(&self.pool)
        .await?;

        Ok(Festival {
            id: result.last_insert_rowid(),
            name: input.name.clone(),
            kind: input.kind.clone(),
            description: input.description.clone(),
            start_date: input.start_date,
            end_date: input.end_date,
            location: input.location.clone(),
            is_active: input.is_active,
        })
    }

    async fn replace_festival(&self, festival: &Festival) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE festivals
             SET name = ?, kind = ?, description = ?, start_date = ?, end_date = ?,
                 location = ?, is_active = ?
             WHERE id = ?",
        )
        .bind(&festival.name)
        .bind(&festival.kind)
        .bind(&festival.description)
        .bind(festival.start_date)
        .bind(festival.end_date)
        .bind(&festival.location)
        .bind(festival.is_active)
        .bind(festival.id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_festival(&self, id: i64) -> Result<FestivalDelete> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM festivals WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if exists == 0 {
            return Ok(FestivalDelete::Missing);
        }

        let events =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events WHERE festival_id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if events > 0 {
            return Ok(FestivalDelete::HasEvents(events));
        }

        sqlx::query("DELETE FROM festivals WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(FestivalDelete::Deleted)
    }

    async fn list_events(&self, festival_id: Option<i64>) -> Result<Vec<Event>> {
        let events = match festival_id {
            Some(festival_id) => {
                sqlx::query_as::<_, Event>(
                    "SELECT id, name, description, start_time, end_time, location, capacity, festival_id
                     FROM events WHERE festival_id = ? ORDER BY start_time ASC, id ASC",
                )
                .bind(festival_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Event>(
                    "SELECT id, name, description, start_time, end_time, location, capacity, festival_id
                     FROM events ORDER BY start_time ASC, id ASC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(events)
    }

    async fn get_event(&self, id: i64) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            "SELECT id, name, description, start_time, end_time, location, capacity, festival_id
             FROM events WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    async fn insert_event(&self, input: &NewEvent) -> Result<Event> {
        let result = sqlx::query(
            "INSERT INTO events (name, description, start_time, end_time, location, capacity, festival_id)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(&input.location)
        .bind(input.capacity)
        .bind(input.festival_id)
        .execute(&self.pool)
        .await?;

        Ok(Event {
            id: result.last_insert_rowid(),
            name: input.name.clone(),
            description: input.description.clone(),
            start_time: input.start_time,
            end_time: input.end_time,
            location: input.location.clone(),
            capacity: input.capacity,
            festival_id: input.festival_id,
        })
    }

    async fn replace_event(&self, event: &Event) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE events
             SET name = ?, description = ?, start_time = ?, end_time = ?,
                 location = ?, capacity = ?, festival_id = ?
             WHERE id = ?",
        )
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(&event.location)
        .bind(event.capacity)
        .bind(event.festival_id)
        .bind(event.id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_event(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
