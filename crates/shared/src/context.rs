//! Per-request input and output types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{Result, UserActionsError};

/// Per-request input to the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    /// Item being evaluated
    #[serde(default)]
    pub item_id: Option<String>,

    /// Record type of the item
    #[serde(default)]
    pub template_id: Option<String>,

    /// Caller's role
    pub role_id: String,

    /// Opaque session/identity value, forwarded to collaborators untouched
    #[serde(default)]
    pub session: Value,
}

impl RequestContext {
    pub fn new(role_id: impl Into<String>) -> Self {
        Self {
            role_id: role_id.into(),
            ..Default::default()
        }
    }

    /// Builder: set the item id
    pub fn with_item(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    /// Builder: set the template id
    pub fn with_template(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    /// Builder: set the session value
    pub fn with_session(mut self, session: Value) -> Self {
        self.session = session;
        self
    }

    /// Item id and template id, or a validation error if either is missing
    pub fn target(&self) -> Result<(&str, &str)> {
        let item_id = non_empty(self.item_id.as_deref())
            .ok_or_else(|| UserActionsError::Validation("itemId is required".to_string()))?;
        let template_id = non_empty(self.template_id.as_deref())
            .ok_or_else(|| UserActionsError::Validation("templateId is required".to_string()))?;
        Ok((item_id, template_id))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Selector to visibility verdict
///
/// A `true` verdict for a selector is never overwritten; a `false` verdict
/// only fills an empty slot. The result is the same whatever order the
/// verdicts are recorded in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisibilityMap(BTreeMap<String, bool>);

impl VisibilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one verdict into the map
    pub fn record(&mut self, selector: impl Into<String>, visible: bool) {
        if visible {
            self.0.insert(selector.into(), true);
        } else {
            self.0.entry(selector.into()).or_insert(false);
        }
    }

    pub fn get(&self, selector: &str) -> Option<bool> {
        self.0.get(selector).copied()
    }

    /// Present and `true`
    pub fn is_visible(&self, selector: &str) -> bool {
        self.get(selector).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Selectors whose verdict is `true`
    pub fn visible_selectors(&self) -> Vec<&str> {
        self.iter().filter(|(_, v)| *v).map(|(k, _)| k).collect()
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for VisibilityMap {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        let mut map = VisibilityMap::new();
        for (selector, visible) in iter {
            map.record(selector, visible);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_target_requires_item_and_template() {
        let ctx = RequestContext::new("editor").with_template("T1");
        assert!(matches!(ctx.target(), Err(UserActionsError::Validation(_))));

        let ctx = RequestContext::new("editor").with_item("I1").with_template("");
        assert!(matches!(ctx.target(), Err(UserActionsError::Validation(_))));

        let ctx = RequestContext::new("editor").with_item("I1").with_template("T1");
        assert_eq!(ctx.target().unwrap(), ("I1", "T1"));
    }

    #[test]
    fn test_context_deserialize() {
        let ctx: RequestContext = serde_json::from_value(json!({
            "itemId": "I1",
            "templateId": "T1",
            "roleId": "editor",
            "session": {"user": "u1"}
        }))
        .unwrap();

        assert_eq!(ctx.item_id.as_deref(), Some("I1"));
        assert_eq!(ctx.session["user"], "u1");
    }

    #[test]
    fn test_true_wins_in_either_order() {
        let mut a = VisibilityMap::new();
        a.record("s", true);
        a.record("s", false);

        let mut b = VisibilityMap::new();
        b.record("s", false);
        b.record("s", true);

        assert_eq!(a, b);
        assert!(a.is_visible("s"));
    }

    #[test]
    fn test_false_fills_empty_slot() {
        let map: VisibilityMap = vec![("a", false), ("b", false), ("b", false)]
            .into_iter()
            .collect();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(false));
        assert!(!map.is_visible("missing"));
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let map: VisibilityMap = vec![("b", true), ("a", false)].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&map).unwrap(),
            r#"{"a":false,"b":true}"#
        );
        assert_eq!(map.visible_selectors(), vec!["b"]);
    }
}
