//! sqlrun - Run a directory of SQL scripts and write each result set next to its script.

use db_sqlrun::cli::Cli;
use db_sqlrun::config::{self, Config};
use db_sqlrun::db::PostgresConnector;
use db_sqlrun::error::{Result, SqlRunError};
use db_sqlrun::logging;
use db_sqlrun::operator::ConsoleOperator;
use db_sqlrun::runner::{RunOutcome, Runner};
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse_args();

    match &cli.log_file {
        Some(path) => {
            if let Err(e) = logging::init_file_logging(path, cli.verbose) {
                eprintln!("{}: {}", e.category(), e);
                std::process::exit(1);
            }
        }
        None => logging::init_stderr_logging(cli.verbose),
    }

    let code = match run(&cli).await {
        Ok(outcome) => {
            report(&outcome);
            outcome.exit_code()
        }
        Err(e) => {
            fail(&e, cli.log_file.is_some());
            1
        }
    };

    std::process::exit(code);
}

async fn run(cli: &Cli) -> Result<RunOutcome> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let file_config = Config::load_from_file(&config_path)?;

    let overrides = cli.to_overrides();
    let mut operator = ConsoleOperator::new();
    let auth = config::resolve_auth(&overrides, &file_config, &mut operator)?;
    let run_config = config::resolve(&overrides, &file_config, auth)?;
    info!("Target: {}", run_config.connection_summary());

    let connector = PostgresConnector;
    Runner::new(run_config, &connector, &mut operator).run().await
}

fn report(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Declined => println!("Cancelled. Nothing was executed."),
        RunOutcome::Completed(report) if report.is_success() => {
            println!("Done: {} artifact(s) written.", report.artifacts.len());
        }
        RunOutcome::Completed(report) => {
            eprintln!(
                "Finished with {} failed script(s), {} artifact(s) written:",
                report.failures.len(),
                report.artifacts.len()
            );
            for failure in &report.failures {
                eprintln!("  {}: {}", failure.script.display(), failure.error);
            }
        }
    }
}

/// Prints the fatal error once. Stderr logging would repeat it, so the
/// logger only records it when logs go to a file.
fn fail(e: &SqlRunError, logging_to_file: bool) {
    if logging_to_file {
        error!("{}: {}", e.category(), e);
    }
    eprintln!("{}: {}", e.category(), e);
}
