use std::collections::HashSet;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::blob::BlobStore;
use crate::focus::select_focus;
use crate::notify::Notifier;
use crate::task::{Task, new_task_id};

pub const DEFAULT_STORE_KEY: &str = "focusFlowTasks";

pub const ADDED_TITLE: &str = "Task added";
pub const ADDED_MESSAGE: &str = "Your new focus task has been added";
pub const COMPLETED_TITLE: &str = "Task completed";
pub const COMPLETED_MESSAGE: &str = "Great job staying focused!";

/// Owns the task list and mirrors it to a blob store under a fixed key.
///
/// Mutations never fail. A failed write is logged and leaves the in-memory
/// list authoritative; `has_unsaved_changes` reports it until a later write
/// succeeds.
#[derive(Debug)]
pub struct TaskStore<B, N> {
    tasks: Vec<Task>,
    blob: B,
    notifier: N,
    key: String,
    unsaved: bool,
}

impl<B: BlobStore, N: Notifier> TaskStore<B, N> {
    #[tracing::instrument(skip_all, fields(key = %key.as_ref()))]
    pub fn initialize(blob: B, notifier: N, key: impl AsRef<str>) -> Self {
        let key = key.as_ref().to_string();
        let tasks = load_tasks(&blob, &key);
        info!(key = %key, count = tasks.len(), "initialized task store");

        Self {
            tasks,
            blob,
            notifier,
            key,
            unsaved: false,
        }
    }

    pub fn add(&mut self, text: &str) -> Option<&Task> {
        self.add_at(text, Utc::now())
    }

    #[tracing::instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn add_at(&mut self, text: &str, now: DateTime<Utc>) -> Option<&Task> {
        if text.trim().is_empty() {
            debug!("ignoring empty task text");
            return None;
        }

        let mut task = Task::new(text.to_string(), now);
        while self.get(&task.id).is_some() {
            task.id = new_task_id();
        }

        debug!(id = %task.id, "task added");
        self.tasks.insert(0, task);
        self.persist_after_mutation();
        self.notifier.notify(ADDED_TITLE, ADDED_MESSAGE);
        self.tasks.first()
    }

    /// Marks a task completed. Returns `false` for unknown ids and for tasks
    /// already completed; neither case writes or notifies.
    #[tracing::instrument(skip(self))]
    pub fn complete(&mut self, id: &str) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!("complete: no task with id");
            return false;
        };
        if task.completed {
            debug!("complete: task already completed");
            return false;
        }

        task.completed = true;
        self.persist_after_mutation();
        self.notifier.notify(COMPLETED_TITLE, COMPLETED_MESSAGE);
        true
    }

    #[tracing::instrument(skip(self))]
    pub fn delete(&mut self, id: &str) -> bool {
        let Some(idx) = self.tasks.iter().position(|t| t.id == id) else {
            debug!("delete: no task with id");
            return false;
        };

        let removed = self.tasks.remove(idx);
        debug!(text_len = removed.text.len(), remaining = self.tasks.len(), "task deleted");
        self.persist_after_mutation();
        true
    }

    /// Writes the full list under the store key, replacing any prior value.
    #[tracing::instrument(skip(self), fields(key = %self.key, count = self.tasks.len()))]
    pub fn persist(&mut self) -> anyhow::Result<()> {
        let result = self.write_snapshot();
        self.unsaved = result.is_err();
        result
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn focus(&self) -> Option<&Task> {
        select_focus(&self.tasks)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn blob(&self) -> &B {
        &self.blob
    }

    pub fn blob_mut(&mut self) -> &mut B {
        &mut self.blob
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn write_snapshot(&mut self) -> anyhow::Result<()> {
        let payload =
            serde_json::to_string(&self.tasks).context("failed to serialize task list")?;
        self.blob
            .set(&self.key, &payload)
            .with_context(|| format!("failed to write task list under key {}", self.key))
    }

    fn persist_after_mutation(&mut self) {
        if let Err(err) = self.persist() {
            warn!(
                key = %self.key,
                error = %format!("{err:#}"),
                "failed to persist task list; keeping in-memory state"
            );
        }
    }
}

#[tracing::instrument(skip(blob))]
fn load_tasks<B: BlobStore>(blob: &B, key: &str) -> Vec<Task> {
    let raw = match blob.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("no persisted task list; starting empty");
            return Vec::new();
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "failed to read persisted task list; starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Task>>(&raw) {
        Ok(tasks) => dedupe_ids(tasks),
        Err(err) => {
            warn!(error = %err, "persisted task list is malformed; starting empty");
            Vec::new()
        }
    }
}

fn dedupe_ids(tasks: Vec<Task>) -> Vec<Task> {
    let before = tasks.len();
    let mut seen = HashSet::with_capacity(before);
    let kept: Vec<Task> = tasks
        .into_iter()
        .filter(|task| seen.insert(task.id.clone()))
        .collect();

    if kept.len() != before {
        warn!(
            before,
            after = kept.len(),
            "dropped tasks with duplicate ids from persisted list"
        );
    }
    kept
}
