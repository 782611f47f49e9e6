//! user-actions controls

use clap::Args;
use shared::VisibilityMap;

use super::{print_json, ContextArgs};
use crate::Fixture;

/// Resolve the visibility map for one item
#[derive(Debug, Args)]
pub struct ControlsCommand {
    #[command(flatten)]
    pub request: ContextArgs,
}

impl ControlsCommand {
    pub async fn execute(&self) -> anyhow::Result<VisibilityMap> {
        let service = Fixture::load(&self.request.fixture)?.service(None)?;
        Ok(service.get_user_controls(&self.request.context()).await?)
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        print_json(&self.execute().await?)
    }
}
