use std::{str::FromStr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow}, Pool, Row, Sqlite};

use crate::domain::{
    repository::TodoRepository,
    todo::{CreateTodo, OrderExhausted, Todo, TodoId, UpdateTodo, MAX_ORDER},
};

const DB_TARGET: &str = "worklist::db";

#[derive(Clone)]
pub struct SqliteTodoRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteTodoRepository {
    /// Opens a pool on `database_url`, creating the database file if needed.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid database url {database_url:?}"))?
            .create_if_missing(true);
        let pool_options = if is_in_memory(database_url) {
            // Each connection to :memory: is its own database, so keep exactly one alive.
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        match pool_options.connect_with(connect_options).await {
            Ok(pool) => {
                tracing::info!(target: DB_TARGET, database_url, "database connected");
                Ok(Self { pool: Arc::new(pool) })
            }
            Err(err) => {
                tracing::error!(target: DB_TARGET, database_url, error = %err, "database connection failed");
                Err(err).context("connecting to database")
            }
        }
    }
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS todos (
                id TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                "order" INTEGER NOT NULL,
                done_at TEXT
            )"#,
        )
        .execute(&*self.pool)
        .await
        .map_err(log_db_error)?;
        Ok(())
    }

    async fn create(&self, input: CreateTodo) -> Result<Todo> {
        let id = TodoId::new();
        // Reading the max and inserting in one statement keeps concurrent creates from sharing an order.
        // Nothing is inserted once the maximum order is taken.
        let row = sqlx::query(
            r#"INSERT INTO todos (id, value, "order", done_at)
               SELECT ?1, ?2, top + 1, NULL
               FROM (SELECT COALESCE(MAX("order"), 0) AS top FROM todos)
               WHERE top < ?3
               RETURNING "order""#,
        )
        .bind(id.to_string())
        .bind(&input.value)
        .bind(MAX_ORDER)
        .fetch_optional(&*self.pool)
        .await
        .map_err(log_db_error)?;
        let Some(row) = row else { return Err(OrderExhausted.into()) };
        let order: i64 = row.try_get("order")?;
        Ok(Todo { id, value: input.value, order, done_at: None })
    }

    async fn get(&self, id: TodoId) -> Result<Option<Todo>> {
        let row = sqlx::query(r#"SELECT id, value, "order", done_at FROM todos WHERE id = ?1"#)
            .bind(id.to_string())
            .fetch_optional(&*self.pool)
            .await
            .map_err(log_db_error)?;
        row.map(row_to_todo).transpose()
    }

    async fn list(&self) -> Result<Vec<Todo>> {
        let rows = sqlx::query(r#"SELECT id, value, "order", done_at FROM todos ORDER BY "order" DESC"#)
            .fetch_all(&*self.pool)
            .await
            .map_err(log_db_error)?;
        rows.into_iter().map(row_to_todo).collect()
    }

    async fn update(&self, id: TodoId, input: UpdateTodo) -> Result<Option<Todo>> {
        let mut tx = self.pool.begin().await.map_err(log_db_error)?;

        // Write before reading: a deferred transaction that reads first can't
        // upgrade its lock while another writer waits, and fails with SQLITE_BUSY.
        let touched = sqlx::query("UPDATE todos SET id = id WHERE id = ?1")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(log_db_error)?;
        if touched.rows_affected() == 0 {
            return Ok(None);
        }

        let row = sqlx::query(r#"SELECT id, value, "order", done_at FROM todos WHERE id = ?1"#)
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(log_db_error)?;
        let Some(mut todo) = row.map(row_to_todo).transpose()? else { return Ok(None) };

        if let Some(order) = input.target_order() {
            // Whoever holds the requested order takes ours.
            sqlx::query(r#"UPDATE todos SET "order" = ?1 WHERE "order" = ?2 AND id <> ?3"#)
                .bind(todo.order)
                .bind(order)
                .bind(todo.id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(log_db_error)?;
            todo.order = order;
        }
        if let Some(done) = input.completion() {
            todo.done_at = done.then(Utc::now);
        }
        if let Some(value) = input.new_value() {
            todo.value = value.to_owned();
        }

        sqlx::query(r#"UPDATE todos SET value = ?2, "order" = ?3, done_at = ?4 WHERE id = ?1"#)
            .bind(todo.id.to_string())
            .bind(&todo.value)
            .bind(todo.order)
            .bind(todo.done_at.map(|t| t.to_rfc3339()))
            .execute(&mut *tx)
            .await
            .map_err(log_db_error)?;

        tx.commit().await.map_err(log_db_error)?;
        Ok(Some(todo))
    }

    async fn delete(&self, id: TodoId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?1")
            .bind(id.to_string())
            .execute(&*self.pool)
            .await
            .map_err(log_db_error)?;
        Ok(result.rows_affected() > 0)
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Logs connection-level failures where they surface, then hands them on.
fn log_db_error(err: sqlx::Error) -> anyhow::Error {
    match &err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Tls(_) => {
            tracing::error!(target: DB_TARGET, error = %err, "database connection error");
        }
        _ => tracing::debug!(target: DB_TARGET, error = %err, "query failed"),
    }
    err.into()
}

fn row_to_todo(row: SqliteRow) -> Result<Todo> {
    let id_str: String = row.try_get("id")?;
    let value: String = row.try_get("value")?;
    let order: i64 = row.try_get("order")?;
    let done_at_str: Option<String> = row.try_get("done_at")?;

    let id = TodoId::parse(&id_str).with_context(|| format!("malformed todo id {id_str:?}"))?;
    let done_at = done_at_str
        .map(|s| DateTime::parse_from_rfc3339(&s).map(|t| t.with_timezone(&Utc)))
        .transpose()
        .context("malformed done_at timestamp")?;

    Ok(Todo { id, value, order, done_at })
}
