pub mod cli;
pub mod config;
pub mod render;
pub mod repl;

#[path = "api/lib.rs"]
pub mod api;

pub use api::HTTPClient;
pub use config::ConsoleConfig;
pub use repl::REPL;
