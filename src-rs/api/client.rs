use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::api::models::{
    CommandRequest, CompareRequest, CompareResponse, ExecuteRequest, ExecuteResponse,
    ListingResponse, PythonFileRequest, PythonFileResponse, PythonRunRequest, RunResponse,
    SnapshotResponse, StateId, TaskDetail, TaskSummary,
};

pub struct HTTPClient {
    pub base_url: String,
    pub token: Option<String>,
    client: Client,
}

impl HTTPClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            base_url: base_url.to_string(),
            token,
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("reqwest client"),
        }
    }

    pub fn directory_tree(&self) -> Result<ListingResponse, String> {
        let resp = self
            .client
            .get(self.url("/ls"))
            .headers(self.headers())
            .send()
            .map_err(|err| err.to_string())?;
        let status = resp.status();
        if status.is_success() {
            return resp.json::<ListingResponse>().map_err(|err| err.to_string());
        }
        // The backend reports listing failures as HTTP 500 with a normal
        // listing body; hand those to the renderer instead of flattening
        // them into a transport error.
        let body = resp.text().unwrap_or_default();
        match listing_from_error_body(&body) {
            Some(listing) => Ok(listing),
            None => Err(error_body(status, &body)),
        }
    }

    pub fn execute_task(&self, task: &str) -> Result<ExecuteResponse, String> {
        self.post_json(
            "/api/execute",
            &ExecuteRequest {
                task: task.to_string(),
            },
        )
    }

    pub fn recent_tasks(&self, limit: usize) -> Result<Vec<TaskSummary>, String> {
        let url = format!("{}?limit={}", self.url("/api/tasks"), limit);
        let resp = self
            .client
            .get(url)
            .headers(self.headers())
            .send()
            .map_err(|err| err.to_string())?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(error_body(status, &body));
        }
        let value = resp.json::<Value>().map_err(|err| err.to_string())?;
        if let Some(err) = value.get("error").and_then(|v| v.as_str()) {
            return Err(err.to_string());
        }
        let items = value.as_array().cloned().unwrap_or_default();
        let mut tasks = Vec::new();
        for item in items {
            match serde_json::from_value::<TaskSummary>(item) {
                Ok(task) => tasks.push(task),
                Err(err) => return Err(format!("bad task record: {}", err)),
            }
        }
        Ok(tasks)
    }

    pub fn task_detail(&self, id: i64) -> Result<TaskDetail, String> {
        let resp = self
            .client
            .get(self.url(&format!("/api/tasks/{}", id)))
            .headers(self.headers())
            .send()
            .map_err(|err| err.to_string())?;
        parse(resp)
    }

    pub fn run_command(&self, command: &str) -> Result<RunResponse, String> {
        self.post_json(
            "/api/command",
            &CommandRequest {
                command: command.to_string(),
            },
        )
    }

    pub fn create_python_file(&self, file_path: &str, code: &str) -> Result<PythonFileResponse, String> {
        self.post_json(
            "/api/python/file",
            &PythonFileRequest {
                file_path: file_path.to_string(),
                code: code.to_string(),
            },
        )
    }

    pub fn run_python(&self, code: &str, use_file: bool) -> Result<RunResponse, String> {
        self.post_json(
            "/api/python/execute",
            &PythonRunRequest {
                code: code.to_string(),
                use_file,
            },
        )
    }

    pub fn create_snapshot(&self) -> Result<SnapshotResponse, String> {
        let resp = self
            .client
            .post(self.url("/api/filesystem/snapshot"))
            .headers(self.headers())
            .send()
            .map_err(|err| err.to_string())?;
        parse(resp)
    }

    pub fn compare_snapshot(&self, previous: StateId) -> Result<CompareResponse, String> {
        self.post_json(
            "/api/filesystem/compare",
            &CompareRequest {
                previous_state_id: previous,
            },
        )
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, String> {
        let resp = self
            .client
            .post(self.url(path))
            .headers(self.headers())
            .json(body)
            .send()
            .map_err(|err| err.to_string())?;
        parse(resp)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token {
            let value = format!("Bearer {}", token);
            if let Ok(header) = HeaderValue::from_str(&value) {
                headers.insert(AUTHORIZATION, header);
            }
        }
        headers
    }
}

fn parse<T: DeserializeOwned>(resp: Response) -> Result<T, String> {
    let status = resp.status();
    if status.is_success() {
        resp.json::<T>().map_err(|err| err.to_string())
    } else {
        let body = resp.text().unwrap_or_default();
        Err(error_body(status, &body))
    }
}

fn listing_from_error_body(body: &str) -> Option<ListingResponse> {
    match serde_json::from_str::<ListingResponse>(body) {
        Ok(listing) if listing.error.is_some() || !listing.success => Some(listing),
        _ => None,
    }
}

// The backend reports failures as JSON bodies with an error field (or, for
// the python file endpoint, a message field) even on non-2xx statuses; fall
// back to the raw body when it is anything else.
fn error_body(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(err) = value.get("error").and_then(|v| v.as_str()) {
            return err.to_string();
        }
        if let Some(msg) = value.get("message").and_then(|v| v.as_str()) {
            return msg.to_string();
        }
    }
    format!("http {}: {}", status.as_u16(), body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_join_strips_trailing_slash() {
        let client = HTTPClient::new("http://localhost:5000/", None);
        assert_eq!(client.url("/ls"), "http://localhost:5000/ls");
        let bare = HTTPClient::new("http://localhost:5000", None);
        assert_eq!(bare.url("/api/tasks"), "http://localhost:5000/api/tasks");
    }

    #[test]
    fn error_body_prefers_the_error_field() {
        let msg = error_body(
            StatusCode::NOT_FOUND,
            "{\"error\": \"Task with ID 3 not found\"}",
        );
        assert_eq!(msg, "Task with ID 3 not found");
    }

    #[test]
    fn error_body_falls_back_to_the_message_field() {
        let msg = error_body(
            StatusCode::BAD_REQUEST,
            "{\"success\": false, \"message\": \"For security reasons, cannot create files outside of /app\"}",
        );
        assert_eq!(
            msg,
            "For security reasons, cannot create files outside of /app"
        );
    }

    #[test]
    fn error_body_falls_back_to_status_and_text() {
        let msg = error_body(StatusCode::BAD_GATEWAY, "upstream gone");
        assert_eq!(msg, "http 502: upstream gone");
    }

    #[test]
    fn failed_listing_bodies_are_kept_for_the_renderer() {
        let listing =
            listing_from_error_body("{\"success\": false, \"error\": \"X\"}").unwrap();
        assert_eq!(listing.error.as_deref(), Some("X"));
        assert!(crate::render::format_tree(&listing).contains("X"));
        assert!(listing_from_error_body("upstream gone").is_none());
        assert!(listing_from_error_body("{}").is_none());
    }
}
