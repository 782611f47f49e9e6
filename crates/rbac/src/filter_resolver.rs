//! FilterResolver - Turn an action rule into a concrete existence filter
//!
//! A rule's filter is either a static object, an empty value, or the name of
//! a dynamic-filter hook. Hooks exist for rules that need context the engine
//! cannot compute itself ("item belongs to a group the user manages"); they
//! are registered by name in a [`FilterHookRegistry`] and looked up as
//! `<namespace>:<filter>`.

use async_trait::async_trait;
use serde_json::{Map, Value};
use shared::{
    json_type, ActionRule, FilterSpec, IdFormat, RequestContext, Result, RoleDocument,
    UserActionsError,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Result of a dynamic filter hook
#[derive(Debug, Clone, PartialEq)]
pub struct HookOutput {
    /// Computed filter; must be a JSON object
    pub filter: Value,
    /// `Some(false)` means the hook owns the filter and `_id`/`_tp` are not added
    pub append_id_and_tp: Option<bool>,
}

impl HookOutput {
    /// Filter that gets `_id`/`_tp` appended like a static one
    pub fn new(filter: Value) -> Self {
        Self {
            filter,
            append_id_and_tp: None,
        }
    }

    /// Filter used exactly as returned
    pub fn owned(filter: Value) -> Self {
        Self {
            filter,
            append_id_and_tp: Some(false),
        }
    }
}

/// Failure reported by a hook
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HookError(pub String);

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Dynamic filter extension point
#[async_trait]
pub trait FilterHook: Send + Sync {
    async fn compute(
        &self,
        ctx: &RequestContext,
        role: &RoleDocument,
    ) -> std::result::Result<HookOutput, HookError>;
}

/// Adapter for plain synchronous functions
pub struct FnHook<F>(pub F);

#[async_trait]
impl<F> FilterHook for FnHook<F>
where
    F: Fn(&RequestContext, &RoleDocument) -> std::result::Result<HookOutput, HookError>
        + Send
        + Sync,
{
    async fn compute(
        &self,
        ctx: &RequestContext,
        role: &RoleDocument,
    ) -> std::result::Result<HookOutput, HookError> {
        (self.0)(ctx, role)
    }
}

/// Hook name -> handler
#[derive(Default, Clone)]
pub struct FilterHookRegistry {
    hooks: HashMap<String, Arc<dyn FilterHook>>,
}

impl FilterHookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook under its full name (e.g. `userActions:managedGroups`)
    pub fn register(&mut self, name: impl Into<String>, hook: Arc<dyn FilterHook>) {
        self.hooks.insert(name.into(), hook);
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_hook(mut self, name: impl Into<String>, hook: Arc<dyn FilterHook>) -> Self {
        self.register(name, hook);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn FilterHook>> {
        self.hooks.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.hooks.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for FilterHookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterHookRegistry")
            .field("hooks", &self.names())
            .finish()
    }
}

/// Produces the filter an action rule is evaluated with
#[derive(Debug, Clone)]
pub struct FilterResolver {
    hooks: Arc<FilterHookRegistry>,
    namespace: String,
    id_format: IdFormat,
}

impl FilterResolver {
    pub fn new(hooks: Arc<FilterHookRegistry>, namespace: impl Into<String>, id_format: IdFormat) -> Self {
        Self {
            hooks,
            namespace: namespace.into(),
            id_format,
        }
    }

    /// Registry name of hook `filter` under `namespace`
    pub fn qualified_hook_name(namespace: &str, filter: &str) -> String {
        format!("{}:{}", namespace, filter)
    }

    /// Full registry name for a rule's string filter
    pub fn hook_name(&self, filter: &str) -> String {
        Self::qualified_hook_name(&self.namespace, filter)
    }

    /// Resolve the concrete filter for `rule` in the context of `ctx`
    pub async fn resolve(
        &self,
        rule: &ActionRule,
        ctx: &RequestContext,
        role: &RoleDocument,
    ) -> Result<Map<String, Value>> {
        let (item_id, _) = ctx.target()?;
        let spec = rule
            .filter_spec()
            .map_err(|reason| UserActionsError::invalid_filter(&rule.selector, reason))?;

        match spec {
            FilterSpec::Static(filter) => self.stamp(filter.clone(), rule, item_id),
            FilterSpec::Empty => self.stamp(Map::new(), rule, item_id),
            FilterSpec::Dynamic(name) => {
                let hook_name = self.hook_name(name);
                let hook = self
                    .hooks
                    .get(&hook_name)
                    .ok_or_else(|| UserActionsError::dynamic(&hook_name, "no hook registered"))?;

                debug!(hook = %hook_name, selector = %rule.selector, "calling filter hook");
                let output = hook
                    .compute(ctx, role)
                    .await
                    .map_err(|e| UserActionsError::dynamic(&hook_name, e.to_string()))?;

                let filter = match output.filter {
                    Value::Object(filter) => filter,
                    other => {
                        return Err(UserActionsError::dynamic(
                            &hook_name,
                            format!("expected an object, got {}", json_type(&other)),
                        ))
                    }
                };

                if output.append_id_and_tp == Some(false) {
                    return Ok(filter);
                }
                self.stamp(filter, rule, item_id)
            }
        }
    }

    /// Pin the filter to the current item and the rule's template
    fn stamp(
        &self,
        mut filter: Map<String, Value>,
        rule: &ActionRule,
        item_id: &str,
    ) -> Result<Map<String, Value>> {
        let tp = self.id_format.convert(&rule.template).map_err(|reason| {
            UserActionsError::invalid_filter(&rule.selector, format!("template: {}", reason))
        })?;
        filter.insert("_id".to_string(), Value::String(item_id.to_string()));
        filter.insert("_tp".to_string(), tp);
        Ok(filter)
    }
}
