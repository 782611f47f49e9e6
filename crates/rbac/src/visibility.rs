//! VisibilityAggregator - Resolve every action of a role into a visibility map

use shared::{RequestContext, Result, UserActionsError, VisibilityMap};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::{ActionEvaluator, RoleLoader};

/// Merge per-rule verdicts. `true` wins for a shared selector, whatever the order.
pub fn merge_verdicts<I>(verdicts: I) -> VisibilityMap
where
    I: IntoIterator<Item = (String, bool)>,
{
    verdicts.into_iter().collect()
}

/// Fans rule evaluation out over a role's action rules
#[derive(Clone)]
pub struct VisibilityAggregator {
    loader: RoleLoader,
    evaluator: Arc<ActionEvaluator>,
}

impl VisibilityAggregator {
    pub fn new(loader: RoleLoader, evaluator: ActionEvaluator) -> Self {
        Self {
            loader,
            evaluator: Arc::new(evaluator),
        }
    }

    pub fn loader(&self) -> &RoleLoader {
        &self.loader
    }

    /// Visibility of every action in the caller's role for the requested item
    pub async fn resolve(&self, ctx: &RequestContext) -> Result<VisibilityMap> {
        ctx.target()?;

        let role = self.loader.load(&ctx.role_id).await?;
        if role.actions.is_empty() {
            debug!(role_id = %ctx.role_id, "role has no actions");
            return Ok(VisibilityMap::new());
        }

        let ctx = Arc::new(ctx.clone());
        let mut tasks = JoinSet::new();
        for index in 0..role.actions.len() {
            let evaluator = Arc::clone(&self.evaluator);
            let role = Arc::clone(&role);
            let ctx = Arc::clone(&ctx);
            tasks.spawn(async move {
                let rule = &role.actions[index];
                let visible = evaluator.evaluate(rule, &ctx, &role).await?;
                Ok::<_, UserActionsError>((rule.selector.clone(), visible))
            });
        }

        // Wait for every rule; keep the first failure and drop the rest.
        let mut verdicts = Vec::with_capacity(role.actions.len());
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.unwrap_or_else(|e| {
                Err(UserActionsError::Query(format!("rule evaluation task failed: {}", e)))
            });
            match outcome {
                Ok(verdict) => verdicts.push(verdict),
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        if let Some(err) = first_error {
            warn!(role_id = %ctx.role_id, error = %err, "visibility resolution failed");
            return Err(err);
        }

        let map = merge_verdicts(verdicts);
        debug!(role_id = %ctx.role_id, selectors = map.len(), "visibility resolved");
        Ok(map)
    }
}
