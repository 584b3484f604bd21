use std::io::{self, Write};

use crate::api::client::HTTPClient;
use crate::api::models::StateId;
use crate::config::ConsoleConfig;
use crate::render::{self, HistoryEntry};

pub struct REPL {
    pub config: ConsoleConfig,
    pub client: HTTPClient,
    pub history: Vec<HistoryEntry>,
}

impl REPL {
    pub fn new(config: ConsoleConfig, client: HTTPClient) -> Self {
        Self {
            config,
            client,
            history: Vec::new(),
        }
    }

    pub fn run(&mut self) {
        render::banner(&self.config);
        self.refresh_tree();
        loop {
            render::prompt();
            let mut line = String::new();
            if io::stdin().read_line(&mut line).is_err() {
                break;
            }
            if line.is_empty() {
                break;
            }
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('/') {
                if self.handle_command(&line) {
                    break;
                }
                continue;
            }
            self.submit_task(&line);
        }
    }

    fn handle_command(&mut self, line: &str) -> bool {
        let mut parts = line.splitn(2, ' ');
        let cmd = parts.next().unwrap_or("").trim_start_matches('/');
        let rest = parts.next().unwrap_or("").trim();
        match cmd {
            "exit" | "quit" => return true,
            "help" => render::help(),
            "ls" => self.refresh_tree(),
            "tasks" => {
                let limit = rest.parse::<usize>().unwrap_or(self.config.limit);
                self.list_tasks(limit);
            }
            "task" => match rest.parse::<i64>() {
                Ok(id) => self.show_task(id),
                Err(_) => render::error("usage: /task <id>"),
            },
            "command" => {
                if rest.is_empty() {
                    render::error("usage: /command <cmd>");
                } else {
                    self.run_command(rest);
                }
            }
            "pyfile" => self.create_python_file(rest),
            "run" => self.run_python(),
            "snapshot" => self.create_snapshot(),
            "compare" => self.compare_snapshot(rest),
            "history" => render::history(&self.history),
            "reset" => {
                self.history.clear();
                render::info("history cleared");
            }
            "config" => render::config(&self.config),
            "base" => {
                if rest.is_empty() {
                    render::info(&format!("base: {}", self.config.base_url));
                } else {
                    self.config.base_url = rest.to_string();
                    self.client = HTTPClient::new(&self.config.base_url, self.config.token.clone());
                    render::info("base url updated");
                }
            }
            "token" => {
                if rest.is_empty() {
                    render::info("usage: /token <token>");
                } else {
                    self.config.token = Some(rest.to_string());
                    self.client = HTTPClient::new(&self.config.base_url, self.config.token.clone());
                    render::info("token updated");
                }
            }
            _ => render::info("unknown command, type /help"),
        }
        false
    }

    fn submit_task(&mut self, line: &str) {
        let task = match prepare_task(line) {
            Some(task) => task,
            None => return,
        };
        render::info("executing task, this can take a while...");
        let result = self.client.execute_task(task);
        if self.config.debug {
            if let Ok(resp) = &result {
                if let Some(id) = resp.task_id {
                    render::info(&format!("task id: {}", id));
                }
                if let Some(count) = resp.commands_executed {
                    render::info(&format!("commands executed: {}", count));
                }
            }
        }
        let entry = HistoryEntry::from_execute(task, &result);
        render::entry(&entry);
        // Newest first, like the history panel this replaces.
        self.history.insert(0, entry);
        self.refresh_tree();
    }

    fn refresh_tree(&self) {
        match self.client.directory_tree() {
            Ok(listing) => render::info(&render::format_tree(&listing)),
            Err(_) => render::error(render::TREE_UNAVAILABLE),
        }
    }

    fn list_tasks(&self, limit: usize) {
        match self.client.recent_tasks(limit) {
            Ok(tasks) => render::info(&render::format_task_rows(&tasks)),
            Err(err) => render::error(&err),
        }
    }

    fn show_task(&self, id: i64) {
        match self.client.task_detail(id) {
            Ok(detail) => render::info(&render::format_task_detail(&detail)),
            Err(err) => render::error(&err),
        }
    }

    fn run_command(&self, command: &str) {
        match self.client.run_command(command) {
            Ok(resp) => render_run_output(resp.success, &resp.output, resp.error.as_deref()),
            Err(err) => render::error(&err),
        }
    }

    fn create_python_file(&self, path: &str) {
        if path.trim().is_empty() {
            render::error("file path is required");
            return;
        }
        render::info("enter the file body, end with a single '.' line");
        let code = read_block();
        if let Err(msg) = validate_python_file(path, &code) {
            render::error(msg);
            return;
        }
        match self.client.create_python_file(path, &code) {
            Ok(resp) => {
                if resp.success {
                    let message = resp
                        .message
                        .unwrap_or_else(|| format!("Created Python file at {}", path));
                    render::info(&message);
                    self.refresh_tree();
                } else {
                    let message = resp
                        .message
                        .unwrap_or_else(|| "failed to create Python file".to_string());
                    render::error(&message);
                }
            }
            Err(err) => render::error(&err),
        }
    }

    fn run_python(&self) {
        render::info("enter the code, end with a single '.' line");
        let code = read_block();
        if code.trim().is_empty() {
            render::error("code is required");
            return;
        }
        match self.client.run_python(&code, true) {
            Ok(resp) => render_run_output(resp.success, &resp.output, resp.error.as_deref()),
            Err(err) => render::error(&err),
        }
    }

    fn create_snapshot(&self) {
        match self.client.create_snapshot() {
            Ok(resp) => {
                if let Some(err) = resp.error {
                    render::error(&err);
                } else if let Some(id) = resp.state_id {
                    render::info(&format!("snapshot created: {}", id));
                } else {
                    render::error("snapshot response carried no state id");
                }
            }
            Err(err) => render::error(&err),
        }
    }

    fn compare_snapshot(&self, rest: &str) {
        let raw = if rest.is_empty() {
            match prompt_line("previous state id: ") {
                Some(answer) => answer,
                None => return,
            }
        } else {
            rest.to_string()
        };
        let raw = raw.trim().to_string();
        if raw.is_empty() {
            render::info("compare cancelled");
            return;
        }
        match self.client.compare_snapshot(StateId::parse(&raw)) {
            Ok(resp) => {
                if let Some(err) = resp.error {
                    render::error(&err);
                } else {
                    render::info(&render::format_changes(&resp.changes));
                    if let Some(id) = resp.state_id {
                        render::info(&format!("new snapshot: {}", id));
                    }
                }
            }
            Err(err) => render::error(&err),
        }
    }
}

fn render_run_output(success: bool, output: &str, error: Option<&str>) {
    if let Some(err) = error {
        render::error(err);
        return;
    }
    if success {
        render::info(output);
    } else if output.is_empty() {
        render::error("execution failed with no output");
    } else {
        render::error(output);
    }
}

fn prepare_task(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn validate_python_file(path: &str, code: &str) -> Result<(), &'static str> {
    if path.trim().is_empty() {
        return Err("file path is required");
    }
    if code.trim().is_empty() {
        return Err("code is required");
    }
    Ok(())
}

fn read_block() -> String {
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let trimmed = line.trim_end();
                if trimmed == "." {
                    break;
                }
                lines.push(trimmed.to_string());
            }
        }
    }
    lines.join("\n")
}

fn prompt_line(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_tasks_are_rejected_before_any_request() {
        assert_eq!(prepare_task(""), None);
        assert_eq!(prepare_task("   \t  "), None);
        assert_eq!(prepare_task("  list the files  "), Some("list the files"));
    }

    #[test]
    fn python_file_validation_requires_both_fields() {
        assert!(validate_python_file("", "print(1)").is_err());
        assert!(validate_python_file("a.py", "   ").is_err());
        assert!(validate_python_file("a.py", "print(1)").is_ok());
    }
}
