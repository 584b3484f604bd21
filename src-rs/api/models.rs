use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
    Failed,
    Incomplete,
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Incomplete => "incomplete",
            TaskStatus::Unknown => "unknown",
        }
    }
}

// Closed set: an unrecognized change type fails deserialization and is
// reported as the panel error instead of rendering an undefined marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Created,
    Modified,
    Deleted,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FilesystemChange {
    pub path: String,
    pub change_type: ChangeType,
    #[serde(default = "default_file_type")]
    pub file_type: String,
    pub before_hash: Option<String>,
    pub after_hash: Option<String>,
}

fn default_file_type() -> String {
    "file".to_string()
}

#[derive(Clone, Debug, Deserialize)]
pub struct CommandRecord {
    pub command: String,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub success: bool,
    pub timestamp: Option<String>,
    pub filesystem_changes: Option<Vec<FilesystemChange>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TaskSummary {
    pub id: i64,
    pub task_description: String,
    pub final_status: TaskStatus,
    pub created_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub commands: Vec<CommandRecord>,
    pub final_output: Option<String>,
    pub execution_time_seconds: Option<i64>,
    pub error_message: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FilesystemState {
    pub id: i64,
    pub task_id: Option<i64>,
    pub timestamp: Option<NaiveDateTime>,
    #[serde(default)]
    pub state_type: String,
    pub command_index: Option<usize>,
    pub command_text: Option<String>,
    #[serde(default)]
    pub changes: Vec<FilesystemChange>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TaskDetail {
    pub task: TaskSummary,
    #[serde(default)]
    pub filesystem_states: Vec<FilesystemState>,
}

// The backend serializes snapshot identifiers as JSON numbers; the older
// contract implied strings. The client treats both as opaque.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateId {
    Number(i64),
    Text(String),
}

impl StateId {
    pub fn parse(raw: &str) -> StateId {
        match raw.parse::<i64>() {
            Ok(num) => StateId::Number(num),
            Err(_) => StateId::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateId::Number(num) => write!(f, "{}", num),
            StateId::Text(text) => write!(f, "{}", text),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExecuteRequest {
    pub task: String,
}

#[derive(Debug, Serialize)]
pub struct CommandRequest {
    pub command: String,
}

#[derive(Debug, Serialize)]
pub struct PythonFileRequest {
    pub file_path: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct PythonRunRequest {
    pub code: String,
    pub use_file: bool,
}

#[derive(Debug, Serialize)]
pub struct CompareRequest {
    pub previous_state_id: StateId,
}

#[derive(Debug, Deserialize)]
pub struct ListingResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub output: String,
    pub error: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ExecuteResponse {
    pub task_id: Option<i64>,
    #[serde(default)]
    pub success: bool,
    pub commands_executed: Option<usize>,
    #[serde(default)]
    pub output: String,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PythonFileResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RunResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub output: String,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SnapshotResponse {
    pub state_id: Option<StateId>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompareResponse {
    pub state_id: Option<StateId>,
    #[serde(default)]
    pub changes: Vec<FilesystemChange>,
    pub error: Option<String>,
}
