//! SQLite-backed instance store.
//!
//! The table is created on open if it does not exist yet. `AUTOINCREMENT`
//! keeps ids of deleted rows from being handed out again.

use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::instances::model::{Instance, NewInstance};
use crate::instances::store::{InstanceStore, StoreError, StoreFuture};

const SELECT_COLUMNS: &str =
    "SELECT id, name, ip, http_port, rtsp_port, login, password, created_at FROM instances";

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InstanceRow {
    id: i64,
    name: Option<String>,
    ip: String,
    http_port: i64,
    rtsp_port: i64,
    login: String,
    password: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<InstanceRow> for Instance {
    type Error = StoreError;

    fn try_from(row: InstanceRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let port = |value: i64| {
            u16::try_from(value)
                .map_err(|_| StoreError::Backend(format!("port {value} out of range in row {id}")))
        };

        Ok(Instance {
            id,
            http_port: port(row.http_port)?,
            rtsp_port: port(row.rtsp_port)?,
            name: row.name,
            ip: row.ip,
            login: row.login,
            password: row.password,
            created_at: row.created_at,
        })
    }
}

/// Instance store persisted to a single SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `path` and ensure the
    /// schema exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS instances (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                ip TEXT NOT NULL,
                http_port INTEGER NOT NULL,
                rtsp_port INTEGER NOT NULL,
                login TEXT NOT NULL,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        tracing::info!(path = %path.as_ref().display(), "Instance database opened");
        Ok(Self { pool })
    }

    /// Wait for every pooled connection to close.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl InstanceStore for SqliteStore {
    fn insert(&self, new: NewInstance) -> StoreFuture<'_, Instance> {
        Box::pin(async move {
            let mut instance = new.into_instance(0);
            let result = sqlx::query(
                "INSERT INTO instances (name, ip, http_port, rtsp_port, login, password, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&instance.name)
            .bind(&instance.ip)
            .bind(i64::from(instance.http_port))
            .bind(i64::from(instance.rtsp_port))
            .bind(&instance.login)
            .bind(&instance.password)
            .bind(instance.created_at)
            .execute(&self.pool)
            .await?;

            instance.id = result.last_insert_rowid();
            Ok(instance)
        })
    }

    fn get(&self, id: i64) -> StoreFuture<'_, Option<Instance>> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, InstanceRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            row.map(Instance::try_from).transpose()
        })
    }

    fn list(&self) -> StoreFuture<'_, Vec<Instance>> {
        Box::pin(async move {
            let rows = sqlx::query_as::<_, InstanceRow>(&format!("{SELECT_COLUMNS} ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;
            rows.into_iter().map(Instance::try_from).collect()
        })
    }

    fn update_name<'a>(&'a self, id: i64, name: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let result = sqlx::query("UPDATE instances SET name = ? WHERE id = ?")
                .bind(name)
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn delete(&self, id: i64) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM instances WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
    }
}
