//! user-actions run

use actions_core::{ChannelExecutor, GateDecision};
use clap::Args;
use std::sync::Arc;
use tracing::info;

use super::{print_json, ContextArgs};
use crate::Fixture;

/// Authorize one action and dispatch it when allowed
#[derive(Debug, Args)]
pub struct RunCommand {
    #[command(flatten)]
    pub request: ContextArgs,

    /// Action selector to run
    #[arg(short, long)]
    pub action: Option<String>,
}

impl RunCommand {
    pub async fn execute(&self) -> anyhow::Result<GateDecision> {
        let (executor, mut runs) = ChannelExecutor::new();
        let service = Fixture::load(&self.request.fixture)?.service(Some(Arc::new(executor)))?;

        let decision = service
            .run_action(&self.request.context(), self.action.as_deref())
            .await?;
        while let Ok(run) = runs.try_recv() {
            info!(run_id = %run.id, action = %run.action, "dispatched");
        }
        Ok(decision)
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        print_json(&self.execute().await?)
    }
}
