//! Delete one resource.

use anyhow::Result;
use clap::Args;
use rigger_api::commands::delete_action;
use rigger_id::ResourceRef;
use rigger_lifecycle::{DeleteError, Deleter};
use tracing::info;

use crate::error::CliError;
use crate::output::{print_info, print_json, print_success, OutputFormat};

use super::CommandContext;

/// Delete one resource by `kind:id`.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Resource to delete, e.g. `network:5b2f...`. Key pairs use their name.
    target: ResourceRef,

    /// Fail when the resource does not exist.
    #[arg(long)]
    strict: bool,
}

impl DeleteCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let client = ctx.client()?;
        let action = delete_action(self.target.kind, &self.target.id);
        info!(resource = %self.target, command = %action.command, "Deleting");

        let outcome = match client.delete(&self.target, &action).await {
            Ok(()) => "deleted",
            Err(DeleteError::NotFound(message)) if !self.strict => {
                info!(resource = %self.target, %message, "Already gone");
                "not_found"
            }
            Err(DeleteError::NotFound(message)) => {
                return Err(CliError::NotFound(format!("{}: {message}", self.target)).into())
            }
            Err(DeleteError::Failed(message)) => {
                anyhow::bail!("Failed to delete {}: {message}", self.target)
            }
        };

        match ctx.format {
            OutputFormat::Json => print_json(
                &serde_json::json!({ "resource": self.target.to_string(), "outcome": outcome }),
            ),
            OutputFormat::Table if outcome == "deleted" => {
                print_success(&format!("Deleted {}", self.target))
            }
            OutputFormat::Table => print_info(&format!("{} was already gone", self.target)),
        }
        Ok(())
    }
}
