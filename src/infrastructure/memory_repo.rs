use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::{
    domain::{
        repository::TaskRepository,
        task::{Task, TaskId},
    },
    error::{StoreError, StoreResult, check_insert_id},
};

#[derive(Default)]
struct Rows {
    items: Vec<Task>,
    last_id: i64,
}

/// Process-local store for tests and headless runs. Nothing survives a restart.
#[derive(Clone)]
pub struct InMemoryTaskRepository {
    rows: Arc<Mutex<Rows>>,
    snapshot: Arc<watch::Sender<Vec<Task>>>,
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        let (snapshot, _) = watch::channel(Vec::new());
        Self { rows: Arc::new(Mutex::new(Rows::default())), snapshot: Arc::new(snapshot) }
    }
}

impl InMemoryTaskRepository {
    pub fn new() -> Self { Self::default() }

    pub fn snapshot(&self) -> Vec<Task> { self.lock().items.clone() }

    fn lock(&self) -> std::sync::MutexGuard<'_, Rows> {
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Called with the row lock held so publication order matches write order.
    fn publish(&self, rows: &Rows) {
        tracing::debug!(count = rows.items.len(), "publishing task snapshot");
        self.snapshot.send_replace(rows.items.clone());
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn init(&self) -> StoreResult<()> {
        let rows = self.lock();
        self.publish(&rows);
        Ok(())
    }

    fn observe_tasks(&self) -> watch::Receiver<Vec<Task>> { self.snapshot.subscribe() }

    async fn insert_task(&self, mut task: Task) -> StoreResult<TaskId> {
        check_insert_id(task.id)?;
        let mut rows = self.lock();
        if task.id.is_unset() {
            let next = rows.last_id.checked_add(1).ok_or(StoreError::IdsExhausted(rows.last_id))?;
            rows.last_id = next;
            task.id = TaskId(next);
        } else {
            rows.last_id = rows.last_id.max(task.id.0);
        }
        let id = task.id;
        match rows.items.iter().position(|t| t.id == id) {
            Some(index) => rows.items[index] = task,
            None => {
                let at = rows.items.partition_point(|t| t.id < id);
                rows.items.insert(at, task);
            }
        }
        self.publish(&rows);
        Ok(id)
    }

    async fn update_task(&self, task: Task) -> StoreResult<()> {
        let mut rows = self.lock();
        let Some(index) = rows.items.iter().position(|t| t.id == task.id) else {
            tracing::debug!(id = %task.id, "update skipped, no such task");
            return Ok(());
        };
        rows.items[index] = task;
        self.publish(&rows);
        Ok(())
    }

    async fn delete_task(&self, task: Task) -> StoreResult<()> {
        let mut rows = self.lock();
        let before = rows.items.len();
        rows.items.retain(|t| t.id != task.id);
        if rows.items.len() == before {
            tracing::debug!(id = %task.id, "delete skipped, no such task");
            return Ok(());
        }
        self.publish(&rows);
        Ok(())
    }
}
