use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::model::{RunId, TaskId, TaskOutcome, TaskRecord, TaskStatus};

/// How long a task stays visible after it was started.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(30 * 60);

/// In-memory task store.
///
/// Writers take the exclusive lock, readers the shared one. Entries are replaced
/// wholesale so a reader never sees a half-updated record, and nothing awaits or
/// performs I/O while a guard is held.
pub struct TaskRegistry {
    tasks: RwLock<HashMap<TaskId, TaskRecord>>,
    retention: Duration,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            retention,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Registers `id` as processing, replacing any previous entry for it.
    ///
    /// The returned run id must accompany the matching [`TaskRegistry::update`].
    pub fn create(&self, id: TaskId, started_at: DateTime<Utc>) -> RunId {
        let run = RunId::new();
        let record = TaskRecord::processing(run, started_at);
        let replaced = self.tasks.write().insert(id.clone(), record);
        if let Some(previous) = replaced {
            if !previous.status.is_terminal() {
                warn!(task_id = %id, "task resubmitted while a previous run was in flight");
            }
        }
        run
    }

    /// Moves the entry for `id` to its terminal state.
    ///
    /// Dropped (returns `false`) when the entry is gone, belongs to another run, or
    /// already left `Processing`.
    pub fn update(&self, id: &TaskId, run: RunId, outcome: TaskOutcome) -> bool {
        let mut tasks = self.tasks.write();
        let Some(current) = tasks.get(id) else {
            debug!(task_id = %id, "dropping result for evicted task");
            return false;
        };
        if current.run != run {
            debug!(task_id = %id, "dropping result from superseded run");
            return false;
        }
        if current.status != TaskStatus::Processing {
            return false;
        }
        let next = current.finished(outcome);
        tasks.insert(id.clone(), next);
        true
    }

    pub fn get(&self, id: &TaskId) -> Option<TaskRecord> {
        self.tasks.read().get(id).cloned()
    }

    /// Removes every entry started before `now - retention`. Returns the number removed.
    pub fn evict(&self, now: DateTime<Utc>, retention: Duration) -> usize {
        let Ok(window) = chrono::Duration::from_std(retention) else {
            return 0;
        };
        let cutoff = now - window;
        let mut tasks = self.tasks.write();
        let before = tasks.len();
        tasks.retain(|_, record| record.started_at >= cutoff);
        before - tasks.len()
    }

    /// Eviction pass using the configured retention window.
    pub fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        self.evict(now, self.retention)
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn id(value: &str) -> TaskId {
        TaskId::new(value)
    }

    #[test]
    fn created_task_is_processing() {
        let registry = TaskRegistry::new();
        registry.create(id("a@x.com"), Utc::now());
        let record = registry.get(&id("a@x.com")).expect("task present");
        assert_eq!(record.status, TaskStatus::Processing);
        assert!(record.token.is_none());
        assert!(record.error.is_none());
    }

    #[test]
    fn update_replaces_entry_and_keeps_start_time() {
        let registry = TaskRegistry::new();
        let started = Utc::now() - chrono::Duration::minutes(2);
        let run = registry.create(id("a"), started);

        assert!(registry.update(
            &id("a"),
            run,
            TaskOutcome::Completed {
                token: "abc123".into()
            }
        ));

        let record = registry.get(&id("a")).unwrap();
        assert_eq!(record.status, TaskStatus::Completed);
        assert_eq!(record.token.as_deref(), Some("abc123"));
        assert_eq!(record.started_at, started);
    }

    #[test]
    fn update_for_missing_task_is_dropped() {
        let registry = TaskRegistry::new();
        let applied = registry.update(
            &id("ghost"),
            RunId::new(),
            TaskOutcome::Failed {
                error: "late".into(),
            },
        );
        assert!(!applied);
        assert!(registry.get(&id("ghost")).is_none());
    }

    #[test]
    fn superseded_run_cannot_overwrite_newer_entry() {
        let registry = TaskRegistry::new();
        let first = registry.create(id("a"), Utc::now());
        let second = registry.create(id("a"), Utc::now());

        assert!(!registry.update(
            &id("a"),
            first,
            TaskOutcome::Failed {
                error: "stale".into()
            }
        ));
        assert_eq!(
            registry.get(&id("a")).unwrap().status,
            TaskStatus::Processing
        );

        assert!(registry.update(
            &id("a"),
            second,
            TaskOutcome::Completed { token: "t".into() }
        ));
    }

    #[test]
    fn terminal_state_is_written_once() {
        let registry = TaskRegistry::new();
        let run = registry.create(id("a"), Utc::now());
        assert!(registry.update(
            &id("a"),
            run,
            TaskOutcome::Completed { token: "t".into() }
        ));
        assert!(!registry.update(
            &id("a"),
            run,
            TaskOutcome::Failed {
                error: "again".into()
            }
        ));
        assert_eq!(registry.get(&id("a")).unwrap().token.as_deref(), Some("t"));
    }

    #[test]
    fn eviction_honours_retention_window() {
        let registry = TaskRegistry::new();
        let now = Utc::now();
        registry.create(id("old"), now - chrono::Duration::minutes(31));
        registry.create(id("fresh"), now - chrono::Duration::minutes(29));

        let removed = registry.evict(now, DEFAULT_RETENTION);

        assert_eq!(removed, 1);
        assert!(registry.get(&id("old")).is_none());
        assert!(registry.get(&id("fresh")).is_some());
        assert_eq!(registry.evict(now, DEFAULT_RETENTION), 0);
    }

    #[test]
    fn concurrent_writers_do_not_interfere() {
        let registry = Arc::new(TaskRegistry::new());
        let handles: Vec<_> = (0..16)
            .map(|idx| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let task = id(&format!("user{idx}@x.com"));
                    let run = registry.create(task.clone(), Utc::now());
                    for _ in 0..50 {
                        let _ = registry.get(&task);
                        registry.evict_expired(Utc::now());
                    }
                    registry.update(
                        &task,
                        run,
                        TaskOutcome::Completed {
                            token: format!("token-{idx}"),
                        },
                    );
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.len(), 16);
        for idx in 0..16 {
            let record = registry.get(&id(&format!("user{idx}@x.com"))).unwrap();
            assert_eq!(record.status, TaskStatus::Completed);
            assert_eq!(record.token, Some(format!("token-{idx}")));
        }
    }
}
