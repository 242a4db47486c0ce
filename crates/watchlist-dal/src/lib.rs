pub mod error;
pub mod schema;
pub mod watchlist;

use std::str::FromStr as _;

pub use error::Error;
pub use schema::FieldErrors;
pub use sqlx::Error as SqlxError;
use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::debug;

use crate::error::Result;

pub type ChosenDB = sqlx::Sqlite;
pub type Pool = sqlx::Pool<ChosenDB>;

/// Maximum length (in characters) of any text column
pub const MAX_TEXT_LENGTH: usize = 200;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Opens connection pool, creating database file if needed, and brings schema up to date
pub async fn new_pool(database_url: &str) -> Result<Pool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(50)
        .connect_with(options)
        .await?;
    MIGRATOR.run(&pool).await?;
    debug!("Database schema is ready");
    Ok(pool)
}
