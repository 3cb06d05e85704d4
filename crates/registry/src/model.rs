use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier callers poll with. Currently the account identifier of the request.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one submission of a task id. A resubmission of the same id gets a new run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Numeric status code exposed on the wire.
    pub fn code(self) -> u8 {
        match self {
            TaskStatus::Processing => 1,
            TaskStatus::Completed => 2,
            TaskStatus::Failed => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskStatus::Processing)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result a worker reports back.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TaskOutcome {
    Completed { token: String },
    Failed { error: String },
}

impl TaskOutcome {
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskOutcome::Completed { .. } => TaskStatus::Completed,
            TaskOutcome::Failed { .. } => TaskStatus::Failed,
        }
    }
}

/// Snapshot of a task as stored in the registry. Callers always receive clones.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskRecord {
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip)]
    pub run: RunId,
}

impl TaskRecord {
    pub fn processing(run: RunId, started_at: DateTime<Utc>) -> Self {
        Self {
            status: TaskStatus::Processing,
            token: None,
            error: None,
            started_at,
            run,
        }
    }

    /// Builds the terminal replacement for this record, keeping its start time and run.
    pub fn finished(&self, outcome: TaskOutcome) -> Self {
        let status = outcome.status();
        let (token, error) = match outcome {
            TaskOutcome::Completed { token } => (Some(token), None),
            TaskOutcome::Failed { error } => (None, Some(error)),
        };
        Self {
            status,
            token,
            error,
            started_at: self.started_at,
            run: self.run,
        }
    }
}
