//! In-memory task store for tests.

use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;

use super::models::{NewTask, Task, TaskStore};

#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<Vec<Task>>,
    /// When set, every insert fails - for persistence-failure tests.
    fail_inserts: Mutex<bool>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        *self.fail_inserts.lock().unwrap() = fail;
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: NewTask) -> Result<Task> {
        if *self.fail_inserts.lock().unwrap() {
            bail!("simulated insert failure");
        }

        let mut tasks = self.tasks.lock().unwrap();
        let now = Utc::now();
        let stored = Task {
            id: tasks.len() as i32 + 1,
            title: task.title,
            description: task.description,
            priority: task.priority,
            deadline: task.deadline,
            user_id: task.user_id,
            status: task.status,
            created_at: now,
            updated_at: now,
        };
        tasks.push(stored.clone());
        Ok(stored)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
