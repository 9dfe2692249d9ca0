use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::errors::{StorageError, StorageResult};

pub mod jobs;

/// Embedded migrations, applied in order. The numeric prefix is the version.
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial_schema",
    include_str!("../../migrations/001_initial_schema.sql"),
)];

/// Durable store of postings that have already been seen.
///
/// The pool holds a single connection, so writes from one run are
/// serialized and an in-memory database lives as long as the pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    pub fn pool(&self) -> Pool<Sqlite> {
        self.pool.clone()
    }

    /// Open (creating if needed) the database file and its directory
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StorageError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .synchronous(SqliteSynchronous::Full);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        debug!("Opened database at {}", path.display());
        Ok(Self { pool })
    }

    /// Private in-memory database, mostly for tests
    pub async fn open_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // The database disappears with its connection, so never recycle it
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> StorageResult<()> {
        self.run_embedded_migrations().await
    }

    async fn run_embedded_migrations(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                checksum BLOB NOT NULL,
                execution_time INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        for (name, content) in MIGRATIONS {
            let version = Self::migration_version(name)?;
            let checksum = Self::calculate_checksum(content);

            let applied = sqlx::query_scalar::<_, Vec<u8>>(
                "SELECT checksum FROM schema_migrations WHERE version = ?",
            )
            .bind(version)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(existing) = applied {
                if existing != checksum {
                    warn!("Migration {} changed after it was applied", name);
                }
                continue;
            }

            let start = std::time::Instant::now();
            let mut transaction = self.pool.begin().await?;

            if let Err(e) = sqlx::query(content).execute(&mut *transaction).await {
                transaction.rollback().await?;
                return Err(StorageError::MigrationFailed {
                    version,
                    message: e.to_string(),
                });
            }

            let execution_time = start.elapsed().as_millis() as i64;
            sqlx::query(
                r#"
                INSERT INTO schema_migrations (version, description, checksum, execution_time)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(version)
            .bind(*name)
            .bind(&checksum)
            .bind(execution_time)
            .execute(&mut *transaction)
            .await?;

            transaction.commit().await?;
            info!("Applied migration: {} ({}ms)", name, execution_time);
        }

        Ok(())
    }

    fn migration_version(name: &str) -> StorageResult<i64> {
        name.split('_')
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| StorageError::MigrationFailed {
                version: 0,
                message: format!("migration name {name} has no numeric version prefix"),
            })
    }

    fn calculate_checksum(content: &str) -> Vec<u8> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        hasher.finish().to_be_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let db = Database::open_in_memory().await.unwrap();
        db.migrate().await.unwrap();
        db.migrate().await.unwrap();

        let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
            .fetch_one(&db.pool())
            .await
            .unwrap();
        assert_eq!(applied, MIGRATIONS.len() as i64);
    }

    #[tokio::test]
    async fn test_schema_has_indexes() {
        let db = Database::open_in_memory().await.unwrap();
        db.migrate().await.unwrap();

        let indexes: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'jobs' AND name LIKE 'idx_%' ORDER BY name",
        )
        .fetch_all(&db.pool())
        .await
        .unwrap();
        assert_eq!(indexes, vec!["idx_jobs_company", "idx_jobs_first_seen_at"]);
    }

    #[test]
    fn test_migration_version() {
        assert_eq!(Database::migration_version("001_initial_schema").unwrap(), 1);
        assert!(Database::migration_version("initial").is_err());
    }
}
