//! Error handling and display for the CLI.

use std::path::PathBuf;

use colored::Colorize;
use rigger_api::ApiError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("No API keys configured. Run `rigctl config set-keys` or set RIGGER_API_KEY and RIGGER_SECRET_KEY.")]
    MissingCredentials,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{remaining} resources still failed to delete after sweeping {}", report.display())]
    SweepIncomplete { remaining: usize, report: PathBuf },
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    let Some(cli_err) = err.downcast_ref::<CliError>() else {
        return;
    };
    match cli_err {
        CliError::MissingCredentials => {
            eprintln!(
                "\n{}",
                "Hint: Run `rigctl config set-keys <api-key> <secret-key>`.".yellow()
            );
        }
        CliError::Api(api) if api.status() == Some(401) => {
            eprintln!(
                "\n{}",
                "Hint: The request signature was rejected. Check the API and secret keys."
                    .yellow()
            );
        }
        CliError::Api(api) if api.status() == Some(432) => {
            eprintln!(
                "\n{}",
                "Hint: The command is not available to this account.".yellow()
            );
        }
        CliError::Api(ApiError::Network(_)) => {
            eprintln!(
                "\n{}",
                "Hint: Check your network connection and API endpoint.".yellow()
            );
        }
        CliError::SweepIncomplete { report, .. } => {
            eprintln!(
                "\n{}",
                format!(
                    "Hint: Run `rigctl sweep {}` again once the blocking resources are gone.",
                    report.display()
                )
                .yellow()
            );
        }
        _ => {}
    }
}
