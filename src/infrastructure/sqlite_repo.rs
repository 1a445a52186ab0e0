use std::{str::FromStr, sync::Arc};

use async_trait::async_trait;
use sqlx::{
    Pool, Row, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
};
use tokio::sync::{Mutex, watch};

use crate::{
    domain::{
        repository::TaskRepository,
        task::{Task, TaskId},
    },
    error::{StoreError, StoreResult, check_insert_id},
};

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: Arc<Pool<Sqlite>>,
    snapshot: Arc<watch::Sender<Vec<Task>>>,
    // Serialises read-then-publish so snapshots go out in commit order.
    refresh_lock: Arc<Mutex<()>>,
}

impl SqliteTaskRepository {
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = if database_url.contains(":memory:") {
            // Every connection to :memory: is its own database; keep exactly one alive.
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().max_connections(5).connect_with(options).await?
        };
        let (snapshot, _) = watch::channel(Vec::new());
        tracing::info!(database_url, "task store connected");
        Ok(Self { pool: Arc::new(pool), snapshot: Arc::new(snapshot), refresh_lock: Arc::new(Mutex::new(())) })
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("task store closed");
    }

    async fn refresh(&self) -> StoreResult<()> {
        let _guard = self.refresh_lock.lock().await;
        let rows = sqlx::query("SELECT id, title, description, is_completed FROM tasks ORDER BY id")
            .fetch_all(&*self.pool)
            .await?;
        let tasks = rows.into_iter().map(row_to_task).collect::<StoreResult<Vec<_>>>()?;
        tracing::debug!(count = tasks.len(), "publishing task snapshot");
        self.snapshot.send_replace(tasks);
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn init(&self) -> StoreResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT,
                is_completed INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(&*self.pool)
        .await?;
        self.refresh().await
    }

    fn observe_tasks(&self) -> watch::Receiver<Vec<Task>> { self.snapshot.subscribe() }

    async fn insert_task(&self, task: Task) -> StoreResult<TaskId> {
        check_insert_id(task.id)?;
        let id = if task.id.is_unset() {
            let result = sqlx::query("INSERT INTO tasks (title, description, is_completed) VALUES (?1, ?2, ?3)")
                .bind(&task.title)
                .bind(&task.description)
                .bind(task.is_completed)
                .execute(&*self.pool)
                .await?;
            TaskId(result.last_insert_rowid())
        } else {
            sqlx::query("INSERT OR REPLACE INTO tasks (id, title, description, is_completed) VALUES (?1, ?2, ?3, ?4)")
                .bind(task.id.0)
                .bind(&task.title)
                .bind(&task.description)
                .bind(task.is_completed)
                .execute(&*self.pool)
                .await?;
            task.id
        };
        self.refresh().await?;
        Ok(id)
    }

    async fn update_task(&self, task: Task) -> StoreResult<()> {
        let result = sqlx::query("UPDATE tasks SET title = ?2, description = ?3, is_completed = ?4 WHERE id = ?1")
            .bind(task.id.0)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.is_completed)
            .execute(&*self.pool)
            .await?;
        if result.rows_affected() == 0 {
            tracing::debug!(id = %task.id, "update skipped, no such task");
            return Ok(());
        }
        self.refresh().await
    }

    async fn delete_task(&self, task: Task) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?1")
            .bind(task.id.0)
            .execute(&*self.pool)
            .await?;
        if result.rows_affected() == 0 {
            tracing::debug!(id = %task.id, "delete skipped, no such task");
            return Ok(());
        }
        self.refresh().await
    }
}

fn row_to_task(row: SqliteRow) -> StoreResult<Task> {
    let id: i64 = row.try_get("id")?;
    let title: String = row.try_get("title")?;
    let description: Option<String> = row.try_get("description")?;
    let is_completed: bool = row.try_get("is_completed")?;
    if id <= 0 {
        return Err(StoreError::CorruptRow(format!("non-positive id {id}")));
    }
    Ok(Task { id: TaskId(id), title, description, is_completed })
}
