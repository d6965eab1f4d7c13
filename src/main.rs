//! Dremio runner command-line entry point.

mod cli;

use cli::{Cli, Command};
use dremio_runner::api::{HttpTransport, SessionManager};
use dremio_runner::config::configuration_schema;
use dremio_runner::error::Result;
use dremio_runner::logging;
use dremio_runner::DremioRunner;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init_stderr_logging();

    if let Err(e) = run().await {
        error!("{}: {}", e.category(), e);
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command.clone() {
        Command::Query { sql } => {
            let mut runner = connect(&cli).await?;
            println!("{}", runner.run_query_json(&sql).await?);
        }
        Command::Schema => {
            let mut runner = connect(&cli).await?;
            let tables = runner.get_schema().await?;
            println!("{}", serde_json::to_string_pretty(&tables)?);
        }
        Command::Diagnose { sql } => {
            // Diagnosis only needs the management API, not the ODBC driver.
            let config = cli.resolve_config()?;
            config.validate()?;
            info!("Connection: {}", config.display_string());

            let transport = HttpTransport::new()?;
            let mut session = SessionManager::connect(config, Box::new(transport)).await?;
            println!("{}", session.diagnose(&sql).await);
        }
        Command::TestConnection => {
            let mut runner = connect(&cli).await?;
            runner.test_connection().await?;
            println!("Connection OK");
        }
        Command::ConfigSchema => {
            println!("{}", serde_json::to_string_pretty(&configuration_schema())?);
        }
    }

    Ok(())
}

/// Resolves configuration and connects a runner.
async fn connect(cli: &Cli) -> Result<DremioRunner> {
    let config = cli.resolve_config()?;
    DremioRunner::from_config(config).await
}
