use std::sync::Arc;

use tasks::{
    application::task_view_model::TaskListViewModel,
    config::AppConfig,
    domain::repository::TaskRepository,
    infrastructure::sqlite_repo::SqliteTaskRepository,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;
    let repo = Arc::new(SqliteTaskRepository::connect(&config.database_url).await?);
    repo.init().await?;

    let session = TaskListViewModel::new(repo.clone(), config.sharing);
    session.set_filter(config.filter);
    let mut tasks = session.filtered_tasks();

    // Wait for the pipeline's first pass over the loaded snapshot, or give up on ctrl-c.
    let expected = config.filter.apply(&repo.observe_tasks().borrow());
    tokio::select! {
        seen = tasks.wait_for(|visible| *visible == expected) => { seen?; }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted");
            return Ok(());
        }
    }

    let visible = tasks.borrow_and_update().clone();
    tracing::info!(filter = %config.filter, count = visible.len(), "task list ready");
    if visible.is_empty() {
        println!("{}", config.filter.empty_message());
    }
    for task in &visible {
        println!("{}", serde_json::to_string(task)?);
    }

    session.close();
    repo.close().await;
    Ok(())
}
