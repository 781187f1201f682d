//! Skald command-line entry point.

use std::process::ExitCode;

use skald_core::clock::SystemClock;
use skald_core::turn::TurnRange;
use skald_runner::{AppError, Campaign, RunnerConfig, Scenario, Services, open_log};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "skald exited with an error");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<(), AppError> {
    let config = RunnerConfig::from_env()?;
    tracing::info!(scenario = %config.scenario.display(), turns = config.turns, "starting skald");

    let scenario = Scenario::load(&config.scenario).await?;
    let log = open_log(&config.log).await?;
    let services = Services::from_llm(config.llm.as_ref())?;
    let mut campaign =
        Campaign::assemble(&config, &scenario, log, services, SystemClock::shared()).await?;

    // Whatever was committed before a failure is still worth printing.
    let outcome = campaign.run(config.turns).await;
    for segment in campaign.transcribe(TurnRange::all(), config.style).await? {
        println!("{}\n", segment.text);
    }
    outcome.map(|_| ())
}
