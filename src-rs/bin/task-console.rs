use task_console_rs::api::client::HTTPClient;
use task_console_rs::cli;
use task_console_rs::repl::REPL;

fn main() {
    let config = cli::parse_config();
    let client = HTTPClient::new(&config.base_url, config.token.clone());
    let mut repl = REPL::new(config, client);
    repl.run();
}
