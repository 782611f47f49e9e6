//! ActionEvaluator - One existence check per action rule

use shared::{ActionRule, QueryService, RecordQuery, RequestContext, Result, RoleDocument};
use std::sync::Arc;
use tracing::debug;

use crate::FilterResolver;

/// Decides whether a single rule makes its action visible
#[derive(Clone)]
pub struct ActionEvaluator {
    resolver: FilterResolver,
    query: Arc<dyn QueryService>,
}

impl ActionEvaluator {
    pub fn new(resolver: FilterResolver, query: Arc<dyn QueryService>) -> Self {
        Self { resolver, query }
    }

    /// `true` iff at least one record of the request's template matches the rule's filter
    pub async fn evaluate(
        &self,
        rule: &ActionRule,
        ctx: &RequestContext,
        role: &RoleDocument,
    ) -> Result<bool> {
        let (_, template_id) = ctx.target()?;

        // A strict rule never applies outside its own template.
        if !rule.applies_to(template_id) {
            debug!(selector = %rule.selector, rule_template = %rule.template, template_id, "strict rule skipped");
            return Ok(false);
        }

        let filter = self.resolver.resolve(rule, ctx, role).await?;
        let query = RecordQuery::new(template_id, filter)
            .with_caller(ctx.role_id.as_str(), ctx.session.clone());

        let visible = self.query.exists(&query).await?;
        debug!(selector = %rule.selector, visible, "rule evaluated");
        Ok(visible)
    }
}
