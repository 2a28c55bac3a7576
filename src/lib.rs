pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod render;
pub mod shell;
pub mod validation;
pub mod wizard;

use std::sync::Arc;

use api::{HttpTransport, ScenarioClient};
use config::WizardConfig;
use error::AppError;
use wizard::WizardController;

/// Build a controller talking HTTP to the configured backend.
pub fn connect(config: &WizardConfig) -> Result<WizardController, AppError> {
    let transport = HttpTransport::new(config.api_base_url.clone())?;
    let client = ScenarioClient::new(Arc::new(transport));
    Ok(WizardController::new(client, config))
}

/// Entry point of the terminal front end: stdin commands, pages on stdout.
pub async fn run() -> Result<(), AppError> {
    let config = WizardConfig::load()?;
    let _log_guard = logging::init(config.log_dir.as_deref());

    tracing::info!(
        api = %config.api_base_url,
        variant = ?config.variant,
        "Starting Scenario Wizard v{}",
        env!("CARGO_PKG_VERSION")
    );

    let mut controller = connect(&config)?;
    controller.mount().await;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    shell::run(&mut controller, stdin, &mut stdout).await?;

    tracing::info!("Scenario Wizard exiting");
    Ok(())
}
