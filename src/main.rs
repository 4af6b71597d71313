//! Pank transfer service
//!
//! ```text
//! ┌──────────┐    ┌─────────────┐    ┌──────────┐    ┌──────────────┐
//! │ Gateway  │───▶│ Coordinator │───▶│  Ledger  │    │   Central    │
//! │ (axum)   │    │             │───▶│ Registry │◀──▶│  directory   │
//! └──────────┘    └─────────────┘    └──────────┘    └──────────────┘
//! ```
//!
//! Usage: `pank_transfer [--env dev] [--port 9001]`

use anyhow::Context;

use pank_transfer::config::AppConfig;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> anyhow::Result<Option<u16>> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            let port = args[i + 1]
                .parse()
                .with_context(|| format!("Invalid --port value: {}", args[i + 1]))?;
            return Ok(Some(port));
        }
    }
    Ok(None)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut app_config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override()? {
        app_config.gateway.port = port;
    }

    let _log_guard = pank_transfer::logging::init_logging(&app_config);

    tracing::info!(
        env = %env,
        bank = %app_config.bank.name,
        bank_prefix = %app_config.bank.prefix,
        directory_mode = ?app_config.central_bank.mode,
        "Starting transfer service"
    );

    pank_transfer::gateway::run_server(&app_config).await?;

    tracing::info!("Transfer service stopped");
    Ok(())
}
