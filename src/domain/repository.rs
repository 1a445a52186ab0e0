use async_trait::async_trait;
use tokio::sync::watch;

use super::task::{Task, TaskId};
use crate::error::StoreResult;

#[async_trait]
pub trait TaskRepository: Send + Sync + 'static {
    async fn init(&self) -> StoreResult<()>;

    /// Latest snapshot plus every later one, ordered by id.
    fn observe_tasks(&self) -> watch::Receiver<Vec<Task>>;

    /// Unset id: the store assigns one. Set id: insert or replace.
    async fn insert_task(&self, task: Task) -> StoreResult<TaskId>;

    /// No-op when the id is not stored.
    async fn update_task(&self, task: Task) -> StoreResult<()>;

    /// No-op when the id is not stored.
    async fn delete_task(&self, task: Task) -> StoreResult<()>;
}
