//! ActionGate - Authorize one named action before it is executed
//!
//! The gate only decides. Execution belongs to whoever listens on the
//! [`ActionExecutor`] it notifies after a positive verdict.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{RequestContext, Result, UserActionsError, VisibilityMap};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::VisibilityAggregator;

/// "Run this action" event emitted after a positive verdict
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRun {
    pub id: Uuid,
    pub action: String,
    pub context: RequestContext,
    pub visibility: VisibilityMap,
    pub authorized_at: DateTime<Utc>,
}

/// Receiver of authorized action runs
pub trait ActionExecutor: Send + Sync {
    fn notify(&self, run: ActionRun);
}

/// Executor that forwards runs over an unbounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelExecutor {
    sender: mpsc::UnboundedSender<ActionRun>,
}

impl ChannelExecutor {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ActionRun>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ActionExecutor for ChannelExecutor {
    fn notify(&self, run: ActionRun) {
        if let Err(err) = self.sender.send(run) {
            warn!(action = %err.0.action, run_id = %err.0.id, "executor channel closed, run dropped");
        }
    }
}

/// Outcome of [`ActionGate::run`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDecision {
    pub action: String,
    pub authorized: bool,
    pub visibility: VisibilityMap,
    /// Set when the executor was notified
    pub run_id: Option<Uuid>,
}

/// Authorizes actions against the caller's visibility map
#[derive(Clone)]
pub struct ActionGate {
    aggregator: Arc<VisibilityAggregator>,
    executor: Option<Arc<dyn ActionExecutor>>,
}

impl ActionGate {
    pub fn new(aggregator: Arc<VisibilityAggregator>) -> Self {
        Self {
            aggregator,
            executor: None,
        }
    }

    /// Builder: notify `executor` after every positive verdict of [`run`](Self::run)
    pub fn with_executor(mut self, executor: Arc<dyn ActionExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Whether `action` is visible for the caller. Unknown actions are `false`.
    pub async fn authorize(&self, ctx: &RequestContext, action: Option<&str>) -> Result<bool> {
        let (_, authorized, _) = self.decide(ctx, action).await?;
        Ok(authorized)
    }

    /// Authorize `action` and, if allowed, hand it to the executor
    pub async fn run(&self, ctx: &RequestContext, action: Option<&str>) -> Result<GateDecision> {
        let (action, authorized, visibility) = self.decide(ctx, action).await?;

        let mut run_id = None;
        if authorized {
            if let Some(executor) = &self.executor {
                let id = Uuid::new_v4();
                executor.notify(ActionRun {
                    id,
                    action: action.clone(),
                    context: ctx.clone(),
                    visibility: visibility.clone(),
                    authorized_at: Utc::now(),
                });
                run_id = Some(id);
            }
        }

        Ok(GateDecision {
            action,
            authorized,
            visibility,
            run_id,
        })
    }

    async fn decide(
        &self,
        ctx: &RequestContext,
        action: Option<&str>,
    ) -> Result<(String, bool, VisibilityMap)> {
        let action = action
            .filter(|a| !a.is_empty())
            .ok_or(UserActionsError::MissingAction)?;

        let visibility = self.aggregator.resolve(ctx).await?;
        let authorized = visibility.is_visible(action);
        info!(role_id = %ctx.role_id, action, authorized, "action gate decision");

        Ok((action.to_string(), authorized, visibility))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedQuery, ROLE_TEMPLATE};
    use crate::{ActionEvaluator, FilterHookRegistry, FilterResolver, RoleCache, RoleLoader};
    use serde_json::json;
    use shared::{ActionRule, IdFormat, RoleDocument};

    const UPDATE: &str = "[data-action='update']";
    const DELETE: &str = "[data-action='delete']";

    fn gate(query: Arc<ScriptedQuery>) -> ActionGate {
        let loader = RoleLoader::new(query.clone(), Arc::new(RoleCache::new()), ROLE_TEMPLATE);
        let resolver =
            FilterResolver::new(Arc::new(FilterHookRegistry::new()), "userActions", IdFormat::Plain);
        let aggregator = VisibilityAggregator::new(loader, ActionEvaluator::new(resolver, query));
        ActionGate::new(Arc::new(aggregator))
    }

    fn editor() -> Arc<ScriptedQuery> {
        Arc::new(
            ScriptedQuery::new().with_role(
                RoleDocument::new("editor")
                    .with_action(ActionRule::new(UPDATE, "T1"))
                    .with_action(ActionRule::new(DELETE, "T1").with_filter(json!({"hit": false}))),
            ),
        )
    }

    fn ctx() -> RequestContext {
        RequestContext::new("editor").with_item("I1").with_template("T1")
    }

    #[tokio::test]
    async fn test_authorize_visible_action() {
        assert!(gate(editor()).authorize(&ctx(), Some(UPDATE)).await.unwrap());
    }

    #[tokio::test]
    async fn test_authorize_hidden_action() {
        assert!(!gate(editor()).authorize(&ctx(), Some(DELETE)).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_action_is_denied_not_error() {
        let allowed = gate(editor())
            .authorize(&ctx(), Some("[data-action='publish']"))
            .await
            .unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn test_missing_action() {
        let query = editor();
        let gate = gate(Arc::clone(&query));

        let err = gate.authorize(&ctx(), None).await.unwrap_err();
        assert!(matches!(err, UserActionsError::MissingAction));
        let err = gate.authorize(&ctx(), Some("")).await.unwrap_err();
        assert!(matches!(err, UserActionsError::MissingAction));
        assert_eq!(query.role_lookups(), 0);
    }

    #[tokio::test]
    async fn test_resolution_failure_fails_authorize() {
        let err = gate(editor())
            .authorize(&RequestContext::new("editor").with_item("I1"), Some(UPDATE))
            .await
            .unwrap_err();
        assert!(matches!(err, UserActionsError::Validation(_)));
    }

    #[tokio::test]
    async fn test_run_notifies_executor_only_when_authorized() {
        let (executor, mut runs) = ChannelExecutor::new();
        let gate = gate(editor()).with_executor(Arc::new(executor));

        let denied = gate.run(&ctx(), Some(DELETE)).await.unwrap();
        assert!(!denied.authorized);
        assert!(denied.run_id.is_none());
        assert!(runs.try_recv().is_err());

        let allowed = gate.run(&ctx(), Some(UPDATE)).await.unwrap();
        assert!(allowed.authorized);

        let run = runs.try_recv().unwrap();
        assert_eq!(Some(run.id), allowed.run_id);
        assert_eq!(run.action, UPDATE);
        assert_eq!(run.context, ctx());
        assert_eq!(run.visibility.get(DELETE), Some(false));
    }

    #[tokio::test]
    async fn test_closed_executor_channel_does_not_fail_run() {
        let (executor, runs) = ChannelExecutor::new();
        drop(runs);
        let gate = gate(editor()).with_executor(Arc::new(executor));

        let decision = gate.run(&ctx(), Some(UPDATE)).await.unwrap();
        assert!(decision.authorized);
    }
}
