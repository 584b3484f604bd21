pub mod client;
pub mod models;

pub use client::HTTPClient;
pub use models::{
    ChangeType, CommandRecord, CompareResponse, ExecuteResponse, FilesystemChange,
    FilesystemState, ListingResponse, PythonFileResponse, RunResponse, SnapshotResponse,
    StateId, TaskDetail, TaskStatus, TaskSummary,
};
