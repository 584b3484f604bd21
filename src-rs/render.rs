use std::io::{self, Write};

use chrono::{Local, NaiveDateTime, TimeZone, Utc};

use crate::api::models::{
    ChangeType, ExecuteResponse, FilesystemChange, ListingResponse, TaskDetail, TaskStatus,
    TaskSummary,
};
use crate::config::ConsoleConfig;

pub const TREE_UNAVAILABLE: &str = "directory tree unavailable";
pub const EXECUTE_FAILED: &str = "Failed to execute task";
pub const NO_TASKS: &str = "no tasks";
pub const NO_CHANGES: &str = "no filesystem changes";
pub const MISSING_HASH: &str = "N/A";

const DESCRIPTION_LIMIT: usize = 40;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BadgeStyle {
    Success,
    Danger,
    Warning,
    Neutral,
}

impl BadgeStyle {
    fn code(&self) -> Option<&'static str> {
        match self {
            BadgeStyle::Success => Some("32"),
            BadgeStyle::Danger => Some("31"),
            BadgeStyle::Warning => Some("33"),
            BadgeStyle::Neutral => None,
        }
    }
}

pub fn badge_style(status: TaskStatus) -> BadgeStyle {
    match status {
        TaskStatus::Completed => BadgeStyle::Success,
        TaskStatus::Failed => BadgeStyle::Danger,
        TaskStatus::Pending | TaskStatus::Incomplete => BadgeStyle::Warning,
        TaskStatus::Unknown => BadgeStyle::Neutral,
    }
}

pub fn badge(status: TaskStatus) -> String {
    paint(badge_style(status), status.as_str())
}

fn paint(style: BadgeStyle, text: &str) -> String {
    match style.code() {
        Some(code) => format!("\x1b[{}m{}\x1b[0m", code, text),
        None => text.to_string(),
    }
}

pub fn truncate_description(text: &str) -> String {
    if text.chars().count() <= DESCRIPTION_LIMIT {
        return text.to_string();
    }
    let head: String = text.chars().take(DESCRIPTION_LIMIT).collect();
    format!("{}...", head)
}

pub fn format_duration(seconds: i64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}

pub fn format_timestamp(ts: Option<NaiveDateTime>) -> String {
    match ts {
        Some(naive) => Utc
            .from_utc_datetime(&naive)
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "-".to_string(),
    }
}

pub fn format_tree(resp: &ListingResponse) -> String {
    if let Some(err) = &resp.error {
        return paint(BadgeStyle::Danger, err);
    }
    if !resp.success {
        return paint(BadgeStyle::Danger, TREE_UNAVAILABLE);
    }
    resp.output.clone()
}

pub fn change_marker(change_type: ChangeType) -> char {
    match change_type {
        ChangeType::Created => '+',
        ChangeType::Modified => '~',
        ChangeType::Deleted => '-',
    }
}

pub fn format_changes(changes: &[FilesystemChange]) -> String {
    if changes.is_empty() {
        return NO_CHANGES.to_string();
    }
    let mut out = String::new();
    for change in changes {
        out.push_str(&format!(
            "{} {} [{}]",
            change_marker(change.change_type),
            change.path,
            change.file_type
        ));
        if change.change_type == ChangeType::Modified {
            let before = change.before_hash.as_deref().unwrap_or(MISSING_HASH);
            let after = change.after_hash.as_deref().unwrap_or(MISSING_HASH);
            out.push_str(&format!(" {} -> {}", before, after));
        }
        out.push('\n');
    }
    out
}

pub fn format_task_rows(tasks: &[TaskSummary]) -> String {
    if tasks.is_empty() {
        return NO_TASKS.to_string();
    }
    let mut out = String::new();
    for task in tasks {
        out.push_str(&format!(
            "#{} [{}] {} ({})\n",
            task.id,
            badge(task.final_status),
            truncate_description(&task.task_description),
            format_timestamp(task.created_at),
        ));
    }
    out
}

pub fn format_task_detail(detail: &TaskDetail) -> String {
    let task = &detail.task;
    let mut out = String::new();
    out.push_str(&format!("task #{} [{}]\n", task.id, badge(task.final_status)));
    out.push_str(&format!("{}\n", task.task_description));
    if let Some(seconds) = task.execution_time_seconds {
        out.push_str(&format!("duration: {}\n", format_duration(seconds)));
    }
    out.push_str(&format!("created: {}\n", format_timestamp(task.created_at)));
    if task.completed_at.is_some() {
        out.push_str(&format!("completed: {}\n", format_timestamp(task.completed_at)));
    }
    if let Some(err) = &task.error_message {
        out.push_str(&format!("error: {}\n", paint(BadgeStyle::Danger, err)));
    }
    for (idx, command) in task.commands.iter().enumerate() {
        let tag = if command.success {
            paint(BadgeStyle::Success, "ok")
        } else {
            paint(BadgeStyle::Danger, "err")
        };
        out.push_str(&format!("\n{}. {} [{}]\n", idx + 1, command.command, tag));
        if !command.output.is_empty() {
            for line in command.output.lines() {
                out.push_str(&format!("   {}\n", line));
            }
        }
        if let Some(changes) = &command.filesystem_changes {
            if !changes.is_empty() {
                out.push_str(&format!("   {} filesystem change(s)\n", changes.len()));
            }
        }
    }
    if !detail.filesystem_states.is_empty() {
        out.push_str(&format!(
            "\n{} filesystem state(s) recorded\n",
            detail.filesystem_states.len()
        ));
    }
    out
}

#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub task: String,
    pub output: String,
    pub ok: bool,
}

impl HistoryEntry {
    pub fn from_execute(task: &str, result: &Result<ExecuteResponse, String>) -> Self {
        match result {
            Ok(resp) => {
                if let Some(err) = &resp.error {
                    Self {
                        task: task.to_string(),
                        output: err.clone(),
                        ok: false,
                    }
                } else {
                    Self {
                        task: task.to_string(),
                        output: resp.output.clone(),
                        ok: resp.success,
                    }
                }
            }
            Err(err) => Self {
                task: task.to_string(),
                output: if err.is_empty() {
                    EXECUTE_FAILED.to_string()
                } else {
                    err.clone()
                },
                ok: false,
            },
        }
    }
}

pub fn entry(entry: &HistoryEntry) {
    let tag = if entry.ok {
        paint(BadgeStyle::Success, "ok")
    } else {
        paint(BadgeStyle::Danger, "err")
    };
    println!("[{}] {}", tag, entry.task);
    if !entry.output.is_empty() {
        println!("{}", entry.output);
    }
}

pub fn history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("no history");
        return;
    }
    for item in entries {
        entry(item);
    }
}

pub fn banner(cfg: &ConsoleConfig) {
    println!("Task Console");
    println!("API: {}", cfg.base_url);
    println!("Type a task in plain language, or /help for commands.");
}

pub fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

pub fn help() {
    println!("Commands:");
    println!("  /help                  Show commands");
    println!("  /exit | /quit          Exit");
    println!("  /ls                    Show the directory tree");
    println!("  /tasks [limit]         List recent tasks");
    println!("  /task <id>             Show task detail");
    println!("  /command <cmd>         Run a single shell command");
    println!("  /pyfile <path>         Create a Python file (body ends with '.')");
    println!("  /run                   Run Python code (body ends with '.')");
    println!("  /snapshot              Capture a filesystem snapshot");
    println!("  /compare [id]          Diff the filesystem against a snapshot");
    println!("  /history               Show this session's submissions");
    println!("  /reset                 Clear the session history");
    println!("  /config                Show current config");
    println!("  /base <url>            Update base URL");
    println!("  /token <token>         Update bearer token");
    println!("Anything else is submitted as a task.");
}

pub fn config(cfg: &ConsoleConfig) {
    println!("config:");
    println!("  base: {}", cfg.base_url);
    println!("  limit: {}", cfg.limit);
    println!("  debug: {}", cfg.debug);
    if cfg.token.is_some() {
        println!("  token: set");
    }
}

pub fn info(msg: &str) {
    println!("{}", msg);
}

pub fn error(msg: &str) {
    eprintln!("{}", error_line(msg));
}

fn error_line(msg: &str) -> String {
    format!("error: {}", paint(BadgeStyle::Danger, msg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn change(change_type: &str, before: Option<&str>, after: Option<&str>) -> FilesystemChange {
        serde_json::from_value(json!({
            "path": "src/app.py",
            "change_type": change_type,
            "file_type": "file",
            "before_hash": before,
            "after_hash": after,
        }))
        .unwrap()
    }

    #[test]
    fn truncation_kicks_in_past_forty_chars() {
        let long: String = "x".repeat(45);
        let rendered = truncate_description(&long);
        assert_eq!(rendered, format!("{}...", "x".repeat(40)));
        assert_eq!(truncate_description("short"), "short");
        let exact: String = "y".repeat(40);
        assert_eq!(truncate_description(&exact), exact);
    }

    #[test]
    fn badge_mapping_is_total() {
        assert_eq!(badge_style(TaskStatus::Completed), BadgeStyle::Success);
        assert_eq!(badge_style(TaskStatus::Failed), BadgeStyle::Danger);
        assert_eq!(badge_style(TaskStatus::Pending), BadgeStyle::Warning);
        assert_eq!(badge_style(TaskStatus::Incomplete), BadgeStyle::Warning);
        assert_eq!(badge_style(TaskStatus::Unknown), BadgeStyle::Neutral);
    }

    #[test]
    fn duration_buckets() {
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(60), "1m 0s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(3600), "1h 0m");
        assert_eq!(format_duration(3725), "1h 2m");
    }

    #[test]
    fn empty_change_list_renders_placeholder() {
        assert_eq!(format_changes(&[]), NO_CHANGES);
    }

    #[test]
    fn modified_without_hashes_falls_back_to_na() {
        let rendered = format_changes(&[change("modified", None, None)]);
        assert!(rendered.contains("N/A -> N/A"));
        assert!(rendered.starts_with("~ src/app.py [file]"));
    }

    #[test]
    fn created_and_deleted_hide_hashes() {
        let rendered = format_changes(&[
            change("created", None, Some("abc123")),
            change("deleted", Some("def456"), None),
        ]);
        assert!(rendered.contains("+ src/app.py"));
        assert!(rendered.contains("- src/app.py"));
        assert!(!rendered.contains("abc123"));
        assert!(!rendered.contains("def456"));
    }

    #[test]
    fn change_markers_cover_every_type() {
        assert_eq!(change_marker(ChangeType::Created), '+');
        assert_eq!(change_marker(ChangeType::Modified), '~');
        assert_eq!(change_marker(ChangeType::Deleted), '-');
    }

    #[test]
    fn tree_render_prefers_the_error_field() {
        let failed: ListingResponse =
            serde_json::from_value(json!({"success": false, "error": "X"})).unwrap();
        assert!(format_tree(&failed).contains("X"));
        let unsuccessful: ListingResponse =
            serde_json::from_value(json!({"success": false, "output": ""})).unwrap();
        assert!(format_tree(&unsuccessful).contains(TREE_UNAVAILABLE));
        let ok: ListingResponse =
            serde_json::from_value(json!({"success": true, "output": "app/\n  main.py"})).unwrap();
        assert_eq!(format_tree(&ok), "app/\n  main.py");
    }

    #[test]
    fn empty_task_list_renders_placeholder() {
        assert_eq!(format_task_rows(&[]), NO_TASKS);
    }

    #[test]
    fn task_rows_carry_truncated_description_and_badge() {
        let task: TaskSummary = serde_json::from_value(json!({
            "id": 3,
            "task_description": "a".repeat(45),
            "final_status": "failed",
            "created_at": "2026-08-28T10:00:00",
        }))
        .unwrap();
        let rendered = format_task_rows(&[task]);
        assert!(rendered.contains(&format!("{}...", "a".repeat(40))));
        assert!(rendered.contains("failed"));
        assert!(rendered.starts_with("#3"));
    }

    #[test]
    fn detail_numbers_commands_from_one_and_counts_changes() {
        let detail: TaskDetail = serde_json::from_value(json!({
            "task": {
                "id": 5,
                "task_description": "make a file",
                "final_status": "completed",
                "created_at": "2026-08-28T10:00:00",
                "completed_at": "2026-08-28T10:02:05",
                "execution_time_seconds": 125,
                "commands": [
                    {"command": "touch a.txt", "output": "", "success": true,
                     "filesystem_changes": [
                         {"path": "a.txt", "change_type": "created", "file_type": "file"}
                     ]},
                    {"command": "cat missing", "output": "No such file", "success": false}
                ]
            },
            "filesystem_states": []
        }))
        .unwrap();
        let rendered = format_task_detail(&detail);
        assert!(rendered.contains("1. touch a.txt"));
        assert!(rendered.contains("2. cat missing"));
        assert!(rendered.contains("1 filesystem change(s)"));
        assert!(rendered.contains("duration: 2m 5s"));
        assert!(rendered.contains("   No such file"));
    }

    #[test]
    fn error_lines_keep_the_prefix_alongside_the_color() {
        let line = error_line("snapshot failed");
        assert!(line.starts_with("error: "));
        assert!(line.contains("snapshot failed"));
    }

    #[test]
    fn history_entry_reflects_each_failure_mode() {
        let ok: ExecuteResponse =
            serde_json::from_value(json!({"success": true, "output": "done"})).unwrap();
        let entry = HistoryEntry::from_execute("list files", &Ok(ok));
        assert!(entry.ok);
        assert_eq!(entry.output, "done");

        let reported: ExecuteResponse =
            serde_json::from_value(json!({"success": false, "error": "llm unavailable"})).unwrap();
        let entry = HistoryEntry::from_execute("list files", &Err("llm unavailable".to_string()));
        assert!(!entry.ok);
        let entry_reported = HistoryEntry::from_execute("list files", &Ok(reported));
        assert!(!entry_reported.ok);
        assert_eq!(entry_reported.output, "llm unavailable");

        let transport = HistoryEntry::from_execute("list files", &Err(String::new()));
        assert!(!transport.ok);
        assert_eq!(transport.output, EXECUTE_FAILED);
    }
}
