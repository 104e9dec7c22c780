use crate::types::{TaskInfo, TaskStatus};
use chrono::{DateTime, Utc};
use llego_common::{LlegoError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Finished tasks kept for `GET /tasks`
const DEFAULT_FINISHED_HISTORY: usize = 100;

/// Tracks background jobs; at most one running task per task type
pub struct JobManager {
    tasks: Arc<RwLock<HashMap<String, TaskInfo>>>,
    finished_history: usize,
}

impl JobManager {
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_FINISHED_HISTORY)
    }

    /// Keep at most `limit` finished tasks; running tasks are never evicted
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            finished_history: limit,
        }
    }

    /// Register a running task, refusing if one of the same type is running
    pub async fn create_task(&self, task_type: &str) -> Result<String> {
        let mut tasks = self.tasks.write().await;
        if let Some(running) = tasks
            .values()
            .find(|t| t.task_type == task_type && t.status == TaskStatus::Running)
        {
            return Err(LlegoError::conflict(format!(
                "Task {} is already running ({})",
                task_type, running.task_id
            )));
        }

        let task_id = Uuid::new_v4().to_string();
        tasks.insert(
            task_id.clone(),
            TaskInfo {
                task_id: task_id.clone(),
                task_type: task_type.to_string(),
                status: TaskStatus::Running,
                message: "Starting...".to_string(),
                started_at: Utc::now(),
                finished_at: None,
            },
        );
        Ok(task_id)
    }

    pub async fn complete_task(&self, task_id: &str, message: String) {
        self.finish(task_id, TaskStatus::Completed, message).await;
    }

    pub async fn fail_task(&self, task_id: &str, error: String) {
        self.finish(task_id, TaskStatus::Failed, error).await;
    }

    async fn finish(&self, task_id: &str, status: TaskStatus, message: String) {
        let mut tasks = self.tasks.write().await;
        if let Some(task) = tasks.get_mut(task_id) {
            task.status = status;
            task.message = message;
            task.finished_at = Some(Utc::now());
        }
        self.evict_finished(&mut tasks);
    }

    fn evict_finished(&self, tasks: &mut HashMap<String, TaskInfo>) {
        let mut finished: Vec<(String, DateTime<Utc>)> = tasks
            .values()
            .filter_map(|t| t.finished_at.map(|at| (t.task_id.clone(), at)))
            .collect();
        if finished.len() <= self.finished_history {
            return;
        }

        finished.sort_by(|a, b| a.1.cmp(&b.1));
        let excess = finished.len() - self.finished_history;
        for (task_id, _) in finished.into_iter().take(excess) {
            tasks.remove(&task_id);
        }
        debug!("Evicted {} finished tasks", excess);
    }

    /// All tasks, newest first
    pub async fn get_tasks(&self) -> Vec<TaskInfo> {
        let mut tasks: Vec<TaskInfo> = self.tasks.read().await.values().cloned().collect();
        tasks.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        tasks
    }

    pub async fn get_task(&self, task_id: &str) -> Option<TaskInfo> {
        self.tasks.read().await.get(task_id).cloned()
    }
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new()
    }
}
