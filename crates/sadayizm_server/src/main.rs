//! Server entry point.

use log::{error, warn};
use sadayizm_core::{flush_logging, init_logging};
use sadayizm_server::config::ServerConfig;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServerConfig::from_env();

    if let Err(err) = init_logging(&config.logging()) {
        eprintln!("sadayizm: logging init failed: {err}");
        return ExitCode::FAILURE;
    }
    for warning in &config.warnings {
        warn!("event=config_load module=server status=fallback {warning}");
    }

    let code = match sadayizm_server::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=server_exit module=server status=error error={err}");
            eprintln!("sadayizm: {err}");
            ExitCode::FAILURE
        }
    };
    flush_logging();
    code
}
