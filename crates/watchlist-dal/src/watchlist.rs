use crate::{
    Error,
    error::Result,
    schema::{self, NewWatchlistEntry},
};
use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{Acquire, Connection as _, Executor, Pool};
use tracing::debug;

/// Saved movie, field order is also order of serialized JSON
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WatchlistEntry {
    #[garde(skip)]
    pub id: i64,
    #[garde(custom(schema::text_length))]
    pub original_title: String,
    #[garde(custom(schema::text_length))]
    pub overview: String,
    #[garde(custom(schema::text_length))]
    pub genres: String,
    #[garde(skip)]
    pub popularity: i64,
    #[garde(custom(schema::text_length))]
    pub release_date: String,
    #[garde(custom(schema::text_length))]
    pub poster_path: String,
    #[garde(custom(schema::optional_text_length))]
    pub review: Option<String>,
}

const ENTITY_NAME: &str = "Watchlist";

const SELECT_ALL: &str = "SELECT id, original_title, overview, genres, popularity, release_date, poster_path, review FROM Watchlist";
const SELECT_ONE: &str = "SELECT id, original_title, overview, genres, popularity, release_date, poster_path, review FROM Watchlist WHERE id = ?";

pub type WatchlistRepository = WatchlistRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct WatchlistRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> WatchlistRepositoryImpl<E>
where
    for<'a> &'a E: Executor<'c, Database = crate::ChosenDB> + Acquire<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// All entries in storage order
    pub async fn list(&self) -> Result<Vec<WatchlistEntry>> {
        let records = sqlx::query_as::<_, WatchlistEntry>(SELECT_ALL)
            .fetch_all(&self.executor)
            .await?;
        Ok(records)
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM Watchlist")
            .fetch_one(&self.executor)
            .await?;
        Ok(count as u64)
    }

    pub async fn get(&self, id: i64) -> Result<WatchlistEntry> {
        get(id, &self.executor).await
    }

    /// Inserts new row, each call creates new entry with fresh id
    pub async fn create(&self, payload: NewWatchlistEntry) -> Result<WatchlistEntry> {
        let result = sqlx::query(
            "INSERT INTO Watchlist (original_title, overview, genres, popularity, release_date, poster_path, review) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&payload.original_title)
        .bind(&payload.overview)
        .bind(&payload.genres)
        .bind(payload.popularity)
        .bind(&payload.release_date)
        .bind(&payload.poster_path)
        .bind(&payload.review)
        .execute(&self.executor)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Created watchlist entry {id}");
        self.get(id).await
    }

    /// Partial update of an entry in single transaction.
    ///
    /// Stored entry is checked first, then known fields from `changes` are
    /// validated and merged into it. Nothing is written if any step fails.
    /// Write lock is taken at start, so concurrent updates wait for each other
    /// and last one wins.
    pub async fn update(&self, id: i64, changes: &Map<String, Value>) -> Result<WatchlistEntry> {
        let mut conn = self.executor.acquire().await?;
        let mut transaction = conn.begin_with("BEGIN IMMEDIATE").await?;
        let mut record = get(id, &mut *transaction).await?;

        schema::validate_stored(&record).map_err(|errors| {
            debug!("Stored entry {id} is not valid: {errors}");
            Error::ValidationFailed(errors)
        })?;
        let patch = schema::validate_patch(changes).map_err(|errors| {
            debug!("Invalid changes for entry {id}: {errors}");
            Error::ValidationFailed(errors)
        })?;

        if patch.is_empty() {
            debug!("No changes for entry {id}");
            return Ok(record);
        }
        patch.apply_to(&mut record);

        sqlx::query(
            "UPDATE Watchlist SET original_title = ?, overview = ?, genres = ?, popularity = ?, \
             release_date = ?, poster_path = ?, review = ? WHERE id = ?",
        )
        .bind(&record.original_title)
        .bind(&record.overview)
        .bind(&record.genres)
        .bind(record.popularity)
        .bind(&record.release_date)
        .bind(&record.poster_path)
        .bind(&record.review)
        .bind(id)
        .execute(&mut *transaction)
        .await?;
        transaction.commit().await?;

        Ok(record)
    }
}

async fn get<'c, E>(id: i64, executor: E) -> Result<WatchlistEntry>
where
    E: Executor<'c, Database = crate::ChosenDB>,
{
    sqlx::query_as::<_, WatchlistEntry>(SELECT_ONE)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| Error::RecordNotFound(ENTITY_NAME.to_string()))
}
