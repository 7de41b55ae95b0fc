//! SQLite plumbing shared by the storage layer.

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::{debug, info};

const FILE_POOL_SIZE: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint refused the write.
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl DatabaseError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(db.message().to_owned())
            }
            sqlx::Error::Io(io) => Self::Io(io.to_string()),
            other => Self::Query(other.to_string()),
        }
    }
}

/// Where a pool points.
#[derive(Debug, Clone, Copy)]
pub enum Location<'a> {
    File(&'a Path),
    /// Private in-memory database. Held on one connection, since each
    /// `:memory:` connection is a separate database.
    Memory,
}

/// Connect with WAL journaling and foreign keys on.
///
/// File databases get their parent directory created and a busy timeout so
/// concurrent writers wait for the lock.
pub async fn connect(location: Location<'_>) -> Result<Pool<Sqlite>, DatabaseError> {
    let (options, pool_size) = match location {
        Location::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io(e.to_string()))?;
            }
            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .busy_timeout(BUSY_TIMEOUT);
            (options, FILE_POOL_SIZE)
        }
        Location::Memory => (SqliteConnectOptions::new().in_memory(true), 1),
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(pool_size)
        .connect_with(
            options
                .journal_mode(SqliteJournalMode::Wal)
                .foreign_keys(true),
        )
        .await
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;

    match location {
        Location::File(path) => info!(path = %path.display(), "Database opened"),
        Location::Memory => debug!("In-memory database opened"),
    }
    Ok(pool)
}

/// Seconds since the Unix epoch.
#[allow(clippy::cast_possible_wrap)]
pub fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs() as i64)
}

/// Declare a cloneable database handle over a migrated pool.
///
/// The generated type gets `open(path)`, `open_in_memory()` and `pool()`.
/// Migrations come from `./migrations` of the crate invoking the macro.
///
/// ```ignore
/// clubhouse_core::define_database!(ClubhouseDatabase, "Clubhouse database migrations complete");
/// ```
#[macro_export]
macro_rules! define_database {
    ($name:ident, $migrated:expr) => {
        #[derive(Clone)]
        pub struct $name {
            pool: ::sqlx::Pool<::sqlx::Sqlite>,
        }

        impl $name {
            pub async fn open(
                path: &::std::path::Path,
            ) -> ::std::result::Result<Self, $crate::db::DatabaseError> {
                Self::migrated($crate::db::Location::File(path)).await
            }

            /// Fresh private database, for tests.
            pub async fn open_in_memory() -> ::std::result::Result<Self, $crate::db::DatabaseError>
            {
                Self::migrated($crate::db::Location::Memory).await
            }

            async fn migrated(
                location: $crate::db::Location<'_>,
            ) -> ::std::result::Result<Self, $crate::db::DatabaseError> {
                let pool = $crate::db::connect(location).await?;
                ::sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .map_err(|e| $crate::db::DatabaseError::Migration(e.to_string()))?;
                ::tracing::info!($migrated);
                Ok(Self { pool })
            }

            pub const fn pool(&self) -> &::sqlx::Pool<::sqlx::Sqlite> {
                &self.pool
            }
        }
    };
}
