//! CLI Commands

pub mod controls;
pub mod roles;
pub mod run;

pub use controls::ControlsCommand;
pub use roles::RolesCommand;
pub use run::RunCommand;

use clap::Args;
use serde_json::Value;
use shared::RequestContext;
use std::path::PathBuf;

/// Request arguments shared by `controls` and `run`
#[derive(Debug, Clone, Args)]
pub struct ContextArgs {
    /// Fixture file (JSON or YAML)
    #[arg(short, long)]
    pub fixture: PathBuf,

    /// Caller's role id
    #[arg(short, long)]
    pub role: String,

    /// Item id
    #[arg(short, long)]
    pub item: Option<String>,

    /// Record type of the item
    #[arg(short, long)]
    pub template: Option<String>,

    /// Session as inline JSON
    #[arg(short, long, value_parser = parse_json)]
    pub session: Option<Value>,
}

impl ContextArgs {
    pub fn context(&self) -> RequestContext {
        RequestContext {
            item_id: self.item.clone(),
            template_id: self.template.clone(),
            role_id: self.role.clone(),
            session: self.session.clone().unwrap_or(Value::Null),
        }
    }
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {}", e))
}

/// Print a value as pretty JSON on stdout
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
