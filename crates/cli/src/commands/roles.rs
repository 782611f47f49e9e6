//! user-actions roles

use clap::Args;
use serde::Serialize;
use shared::DisplayMode;
use std::path::PathBuf;

use super::print_json;
use crate::Fixture;

/// List the roles of a fixture with their action selectors
#[derive(Debug, Args)]
pub struct RolesCommand {
    /// Fixture file (JSON or YAML)
    #[arg(short, long)]
    pub fixture: PathBuf,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleSummary {
    pub id: String,
    pub name: Option<String>,
    pub actions: Vec<ActionSummary>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionSummary {
    pub selector: String,
    pub template: String,
    pub strict: bool,
}

impl RolesCommand {
    pub fn execute(&self) -> anyhow::Result<Vec<RoleSummary>> {
        let roles = Fixture::load(&self.fixture)?.role_documents()?;
        Ok(roles
            .into_iter()
            .map(|role| RoleSummary {
                id: role.id,
                name: role.name,
                actions: role
                    .actions
                    .into_iter()
                    .map(|rule| ActionSummary {
                        strict: rule.display == DisplayMode::Strict,
                        selector: rule.selector,
                        template: rule.template,
                    })
                    .collect(),
            })
            .collect())
    }

    pub fn run(&self) -> anyhow::Result<()> {
        print_json(&self.execute()?)
    }
}
