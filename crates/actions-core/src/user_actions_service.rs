//! UserActionsService - Entry point for visibility queries and action runs

use audit::{AuditEntry, AuditLogger, AuditStats};
use rbac::{
    ActionEvaluator, ActionExecutor, ActionGate, FilterHook, FilterHookRegistry, FilterResolver,
    GateDecision, RoleCache, RoleLoader, VisibilityAggregator,
};
use shared::{EngineConfig, QueryService, RequestContext, Result, VisibilityMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

/// Builder for [`UserActionsService`]
pub struct UserActionsServiceBuilder {
    config: EngineConfig,
    query: Arc<dyn QueryService>,
    hooks: Vec<(String, Arc<dyn FilterHook>)>,
    executor: Option<Arc<dyn ActionExecutor>>,
    cache: Option<Arc<RoleCache>>,
}

impl UserActionsServiceBuilder {
    pub fn new(query: Arc<dyn QueryService>) -> Self {
        Self {
            config: EngineConfig::default(),
            query,
            hooks: Vec::new(),
            executor: None,
            cache: None,
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a dynamic filter hook under `<hookNamespace>:<name>`
    pub fn hook(mut self, name: impl Into<String>, hook: Arc<dyn FilterHook>) -> Self {
        self.hooks.push((name.into(), hook));
        self
    }

    pub fn executor(mut self, executor: Arc<dyn ActionExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Share an existing role cache instead of creating one from the config
    pub fn role_cache(mut self, cache: Arc<RoleCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<UserActionsService> {
        self.config.validate()?;
        let config = self.config;

        let mut registry = FilterHookRegistry::new();
        for (name, hook) in self.hooks {
            registry.register(
                FilterResolver::qualified_hook_name(&config.hook_namespace, &name),
                hook,
            );
        }

        let cache = self.cache.unwrap_or_else(|| {
            Arc::new(match config.role_cache_ttl() {
                Some(ttl) => RoleCache::with_ttl(ttl),
                None => RoleCache::new(),
            })
        });

        let loader = RoleLoader::new(
            Arc::clone(&self.query),
            Arc::clone(&cache),
            config.role_template.as_str(),
        );
        let resolver = FilterResolver::new(
            Arc::new(registry),
            config.hook_namespace.as_str(),
            config.id_format,
        );
        let evaluator = ActionEvaluator::new(resolver, self.query);
        let aggregator = Arc::new(VisibilityAggregator::new(loader, evaluator));

        let mut gate = ActionGate::new(Arc::clone(&aggregator));
        if let Some(executor) = self.executor {
            gate = gate.with_executor(executor);
        }

        Ok(UserActionsService {
            audit: Mutex::new(AuditLogger::new(config.audit_capacity)),
            config,
            aggregator,
            gate,
            cache,
        })
    }
}

/// Visibility queries and gated action runs for one deployment
pub struct UserActionsService {
    config: EngineConfig,
    aggregator: Arc<VisibilityAggregator>,
    gate: ActionGate,
    cache: Arc<RoleCache>,
    audit: Mutex<AuditLogger>,
}

impl UserActionsService {
    pub fn builder(query: Arc<dyn QueryService>) -> UserActionsServiceBuilder {
        UserActionsServiceBuilder::new(query)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Which actions the caller may see for the requested item
    pub async fn get_user_controls(&self, ctx: &RequestContext) -> Result<VisibilityMap> {
        match self.aggregator.resolve(ctx).await {
            Ok(map) => {
                self.audit().log_controls_resolved(ctx, &map);
                Ok(map)
            }
            Err(err) => {
                warn!(role_id = %ctx.role_id, kind = err.kind(), error = %err, "get_user_controls failed");
                self.audit().log_failure(ctx, None, &err);
                Err(err)
            }
        }
    }

    /// Authorize `action` and notify the executor when allowed
    pub async fn run_action(&self, ctx: &RequestContext, action: Option<&str>) -> Result<GateDecision> {
        match self.gate.run(ctx, action).await {
            Ok(decision) => {
                self.audit()
                    .log_gate_decision(ctx, &decision.action, decision.authorized);
                if decision.authorized {
                    info!(role_id = %ctx.role_id, action = %decision.action, run_id = ?decision.run_id, "action run dispatched");
                }
                Ok(decision)
            }
            Err(err) => {
                warn!(role_id = %ctx.role_id, kind = err.kind(), error = %err, "run_action failed");
                self.audit().log_failure(ctx, action, &err);
                Err(err)
            }
        }
    }

    /// Whether `action` is visible, without notifying the executor
    pub async fn is_action_allowed(&self, ctx: &RequestContext, action: Option<&str>) -> Result<bool> {
        self.gate.authorize(ctx, action).await
    }

    /// Forget a cached role so its next use reloads it
    pub fn invalidate_role(&self, role_id: &str) -> bool {
        let removed = self.cache.invalidate(role_id);
        if removed {
            info!(role_id, "role cache entry invalidated");
        }
        removed
    }

    pub fn role_cache(&self) -> &Arc<RoleCache> {
        &self.cache
    }

    pub fn audit_stats(&self) -> AuditStats {
        self.audit().get_stats()
    }

    pub fn recent_denials(&self, limit: usize) -> Vec<AuditEntry> {
        self.audit()
            .get_recent_denials(limit)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn export_audit(&self) -> serde_json::Value {
        self.audit().export_json()
    }

    fn audit(&self) -> MutexGuard<'_, AuditLogger> {
        self.audit.lock().unwrap_or_else(|e| e.into_inner())
    }
}
