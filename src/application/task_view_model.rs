//! Session state behind a task list screen.
//!
//! A [`TaskListViewModel`] combines the repository's task snapshots with the
//! current [`FilterState`] and publishes the filtered list on a watch channel.
//! Mutations are fire-and-forget and run on the session's task tracker; they
//! are abandoned when the session is closed or dropped.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::sync::{Notify, watch};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::task_form::{SaveOutcome, ValidTaskForm};
use crate::{
    domain::{
        filter::FilterState,
        repository::TaskRepository,
        task::{Task, TaskId},
    },
    error::StoreResult,
};

pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// When the derived list is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharingPolicy {
    /// From construction until the session ends.
    Eager,
    /// Only while a `filtered_tasks` receiver is alive, plus `grace` after the last one drops.
    WhileSubscribed { grace: Duration },
}

impl Default for SharingPolicy {
    fn default() -> Self { SharingPolicy::WhileSubscribed { grace: DEFAULT_GRACE } }
}

pub struct TaskListViewModel<R: TaskRepository> {
    repo: Arc<R>,
    policy: SharingPolicy,
    filter: watch::Sender<FilterState>,
    filtered: Arc<watch::Sender<Vec<Task>>>,
    subscribed: Arc<Notify>,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl<R: TaskRepository> TaskListViewModel<R> {
    /// Must be called inside a tokio runtime; the pipeline is spawned here.
    pub fn new(repo: Arc<R>, policy: SharingPolicy) -> Self {
        let (filter, filter_rx) = watch::channel(FilterState::default());
        let (filtered, _) = watch::channel(Vec::new());
        let filtered = Arc::new(filtered);
        let subscribed = Arc::new(Notify::new());
        let cancel = CancellationToken::new();

        tokio::spawn(drive(repo.clone(), filter_rx, filtered.clone(), subscribed.clone(), policy, cancel.clone()));
        tracing::info!(?policy, "task list session opened");

        Self { repo, policy, filter, filtered, subscribed, cancel, tracker: TaskTracker::new() }
    }

    pub fn policy(&self) -> SharingPolicy { self.policy }

    pub fn set_filter(&self, state: FilterState) {
        self.filter.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
    }

    pub fn filter(&self) -> watch::Receiver<FilterState> { self.filter.subscribe() }

    pub fn current_filter(&self) -> FilterState { *self.filter.borrow() }

    /// Subscribes to the filtered list. Under `WhileSubscribed` this also
    /// starts the pipeline if it is paused.
    pub fn filtered_tasks(&self) -> watch::Receiver<Vec<Task>> {
        let receivers_before = self.filtered.receiver_count();
        let rx = self.filtered.subscribe();
        if wakes_pipeline(self.policy, receivers_before) {
            self.subscribed.notify_one();
        }
        rx
    }

    /// Last derived list, without subscribing.
    pub fn current_filtered(&self) -> Vec<Task> { self.filtered.borrow().clone() }

    /// Looks `id` up in the latest unfiltered snapshot.
    pub async fn get_task_by_id(&self, id: TaskId) -> Option<Task> {
        let tasks = self.repo.observe_tasks();
        let found = tasks.borrow().iter().find(|t| t.id == id).cloned();
        found
    }

    pub fn add_task(&self, title: impl Into<String>, description: Option<String>, is_completed: bool) {
        let task = Task::new(title, description, is_completed);
        let repo = self.repo.clone();
        self.launch("insert", async move { repo.insert_task(task).await.map(|_| ()) });
    }

    pub fn update_task(&self, task: Task) {
        let repo = self.repo.clone();
        self.launch("update", async move { repo.update_task(task).await });
    }

    pub fn delete_task(&self, task: Task) {
        let repo = self.repo.clone();
        self.launch("delete", async move { repo.delete_task(task).await });
    }

    pub fn set_completed(&self, task: Task, is_completed: bool) {
        self.update_task(Task { is_completed, ..task });
    }

    /// Inserts a new task, or updates `editing` with the form's fields.
    /// An `editing` id that no longer exists is saved as a new task.
    pub async fn save_task(&self, editing: Option<TaskId>, form: ValidTaskForm) -> StoreResult<SaveOutcome> {
        let existing = match editing {
            Some(id) => self.get_task_by_id(id).await,
            None => None,
        };
        match existing {
            Some(task) => {
                let id = task.id;
                self.repo.update_task(form.merge_into(task)).await?;
                Ok(SaveOutcome::Updated(id))
            }
            None => {
                if let Some(id) = editing {
                    tracing::info!(%id, "edited task is gone, saving as new");
                }
                let id = self.repo.insert_task(form.into_new_task()).await?;
                Ok(SaveOutcome::Inserted(id))
            }
        }
    }

    /// Waits for every mutation launched so far.
    pub async fn settle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Ends the session: stops the pipeline and abandons pending mutations.
    pub fn close(&self) {
        if !self.cancel.is_cancelled() {
            self.cancel.cancel();
            tracing::info!("task list session closed");
        }
    }

    pub fn is_closed(&self) -> bool { self.cancel.is_cancelled() }

    fn launch<F>(&self, op: &'static str, mutation: F)
    where
        F: Future<Output = StoreResult<()>> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => tracing::debug!(op, "mutation abandoned"),
                result = mutation => {
                    if let Err(error) = result {
                        tracing::error!(op, %error, "task mutation failed");
                    }
                }
            }
        });
    }
}

impl<R: TaskRepository> Drop for TaskListViewModel<R> {
    fn drop(&mut self) { self.close(); }
}

/// Only a first subscriber under `WhileSubscribed` can find the pipeline
/// paused or in its grace window; anything else would leave a stale permit.
fn wakes_pipeline(policy: SharingPolicy, receivers_before: usize) -> bool {
    matches!(policy, SharingPolicy::WhileSubscribed { .. }) && receivers_before == 0
}

async fn drive<R: TaskRepository>(
    repo: Arc<R>,
    filter: watch::Receiver<FilterState>,
    output: Arc<watch::Sender<Vec<Task>>>,
    subscribed: Arc<Notify>,
    policy: SharingPolicy,
    cancel: CancellationToken,
) {
    match policy {
        SharingPolicy::Eager => {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = combine(repo.observe_tasks(), filter, &output) => {}
            }
        }
        SharingPolicy::WhileSubscribed { grace } => {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = share_while_subscribed(&*repo, filter, &output, &subscribed, grace) => {}
            }
        }
    }
    tracing::debug!("task list pipeline stopped");
}

async fn share_while_subscribed<R: TaskRepository>(
    repo: &R,
    filter: watch::Receiver<FilterState>,
    output: &watch::Sender<Vec<Task>>,
    subscribed: &Notify,
    grace: Duration,
) {
    loop {
        while output.receiver_count() == 0 {
            subscribed.notified().await;
        }
        tracing::debug!("task list pipeline active");
        let pipeline = combine(repo.observe_tasks(), filter.clone(), output);
        tokio::pin!(pipeline);
        loop {
            tokio::select! {
                _ = &mut pipeline => return,
                _ = output.closed() => {}
            }
            // Last receiver gone; keep computing through the grace window.
            let expired = tokio::select! {
                _ = &mut pipeline => return,
                _ = tokio::time::sleep(grace) => true,
                _ = subscribed.notified() => false,
            };
            if expired && output.receiver_count() == 0 {
                break;
            }
        }
        tracing::debug!(?grace, "no subscribers, task list pipeline paused");
    }
}

/// Republishes `filter` applied to `tasks` whenever either changes.
/// Returns once either input's sender is gone.
async fn combine(
    mut tasks: watch::Receiver<Vec<Task>>,
    mut filter: watch::Receiver<FilterState>,
    output: &watch::Sender<Vec<Task>>,
) {
    loop {
        let state = *filter.borrow_and_update();
        let visible = {
            let all = tasks.borrow_and_update();
            tracing::debug!(observed = all.len(), filter = %state, "recomputing task list");
            state.apply(&all)
        };
        output.send_if_modified(|current| {
            if *current == visible {
                return false;
            }
            *current = visible;
            true
        });
        tokio::select! {
            changed = tasks.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = filter.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_a_first_while_subscribed_receiver_wakes_the_pipeline() {
        let lazy = SharingPolicy::WhileSubscribed { grace: DEFAULT_GRACE };
        assert!(wakes_pipeline(lazy, 0));
        assert!(!wakes_pipeline(lazy, 1));
        assert!(!wakes_pipeline(SharingPolicy::Eager, 0));
        assert!(!wakes_pipeline(SharingPolicy::Eager, 3));
    }
}
