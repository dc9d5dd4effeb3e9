//! List resources of one kind.

use anyhow::{bail, Result};
use clap::Args;
use rigger_api::commands::list_command;
use rigger_api::Params;
use rigger_id::ResourceKind;
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use crate::error::CliError;
use crate::output::{display_option, print_json, print_output, OutputFormat};

use super::CommandContext;

/// List resources of one kind.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Resource kind, e.g. `virtual_machine` or `network`.
    kind: ResourceKind,

    /// Extra list filter as `key=value`; repeatable.
    #[arg(long = "filter", value_name = "KEY=VALUE")]
    filters: Vec<String>,
}

/// One row of any list output.
#[derive(Debug, Clone, Serialize, Tabled)]
struct ResourceRow {
    #[tabled(rename = "ID")]
    id: String,

    #[tabled(rename = "Name", display = "display_option")]
    name: Option<String>,

    #[tabled(rename = "State", display = "display_option")]
    state: Option<String>,

    #[tabled(rename = "Account", display = "display_option")]
    account: Option<String>,
}

impl ResourceRow {
    fn from_value(item: &Value) -> Self {
        let text = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            id: text("id")
                .or_else(|| text("name"))
                .unwrap_or_else(|| "-".to_string()),
            name: text("name").or_else(|| text("displayname")).or_else(|| text("ipaddress")),
            state: text("state"),
            account: text("account"),
        }
    }
}

impl ListCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let client = ctx.client()?;
        let (command, key) = list_command(self.kind);
        let params = filter_params(&self.filters)?;

        let body = client.request(command, params).await.map_err(CliError::from)?;
        let items: Vec<Value> = body
            .get(key)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        match ctx.format {
            OutputFormat::Json => print_json(&items),
            OutputFormat::Table => {
                let rows: Vec<ResourceRow> = items.iter().map(ResourceRow::from_value).collect();
                print_output(&rows, OutputFormat::Table);
            }
        }
        Ok(())
    }
}

/// `listall=true` plus every `key=value` filter.
fn filter_params(filters: &[String]) -> Result<Params> {
    let mut params = Params::new().set("listall", true);
    for filter in filters {
        let Some((key, value)) = filter.split_once('=') else {
            bail!("Invalid filter '{filter}', expected key=value");
        };
        if key.is_empty() {
            bail!("Invalid filter '{filter}', key is empty");
        }
        params.insert(key, value.to_string());
    }
    Ok(params)
}
