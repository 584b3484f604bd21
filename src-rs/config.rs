#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub limit: usize,
    pub debug: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            token: None,
            limit: 10,
            debug: false,
        }
    }
}
