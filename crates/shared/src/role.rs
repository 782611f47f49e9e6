//! Role document types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// When an action rule applies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Applies regardless of the request's template
    #[default]
    Default,
    /// Applies only when the request's template equals the rule's template
    Strict,
}

/// The three shapes a rule filter can take
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterSpec<'a> {
    /// Object-shaped query fragment
    Static(&'a Map<String, Value>),
    /// `null`, `{}` or `""`
    Empty,
    /// Name of a dynamic-filter extension point
    Dynamic(&'a str),
}

/// One named permission rule inside a role document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRule {
    /// Key of the element this rule governs; also the output map key
    pub selector: String,

    /// Record type this rule applies to
    pub template: String,

    #[serde(default)]
    pub display: DisplayMode,

    /// Raw filter. `None` means the field was absent, which is distinct from `null`.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub filter: Option<Value>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl ActionRule {
    /// Create a rule with an empty filter and default display
    pub fn new(selector: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            template: template.into(),
            display: DisplayMode::Default,
            filter: Some(Value::Object(Map::new())),
        }
    }

    /// Builder: set the raw filter
    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Builder: remove the filter entirely
    pub fn without_filter(mut self) -> Self {
        self.filter = None;
        self
    }

    /// Builder: make the rule strict
    pub fn strict(mut self) -> Self {
        self.display = DisplayMode::Strict;
        self
    }

    /// Whether this rule can apply to a request for `template_id`
    pub fn applies_to(&self, template_id: &str) -> bool {
        match self.display {
            DisplayMode::Default => true,
            DisplayMode::Strict => self.template == template_id,
        }
    }

    /// Classify the raw filter. The error is a human-readable reason.
    pub fn filter_spec(&self) -> Result<FilterSpec<'_>, String> {
        match &self.filter {
            None => Err("filter is missing".to_string()),
            Some(Value::Null) => Ok(FilterSpec::Empty),
            Some(Value::Object(map)) if map.is_empty() => Ok(FilterSpec::Empty),
            Some(Value::Object(map)) => Ok(FilterSpec::Static(map)),
            Some(Value::String(name)) if name.is_empty() => Ok(FilterSpec::Empty),
            Some(Value::String(name)) => Ok(FilterSpec::Dynamic(name)),
            Some(other) => Err(format!(
                "expected an object, an empty value or a hook name, got {}",
                json_type(other)
            )),
        }
    }
}

/// JSON type name of a value, for error messages
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A permission role: an ordered list of action rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDocument {
    /// Plain string, or the hex string of an extended-JSON `{"$oid": ...}` id
    #[serde(rename = "_id", deserialize_with = "deserialize_record_id")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub actions: Vec<ActionRule>,
}

fn deserialize_record_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RecordId {
        Plain(String),
        ObjectId {
            #[serde(rename = "$oid")]
            oid: String,
        },
    }

    Ok(match RecordId::deserialize(deserializer)? {
        RecordId::Plain(id) => id,
        RecordId::ObjectId { oid } => oid,
    })
}

impl RoleDocument {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            actions: Vec::new(),
        }
    }

    /// Builder: append a rule
    pub fn with_action(mut self, rule: ActionRule) -> Self {
        self.actions.push(rule);
        self
    }

    /// Decode a role document from a stored record
    pub fn from_record(record: Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(record)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ============== ActionRule Tests ==============

    #[test]
    fn test_rule_deserialize_defaults() {
        let rule: ActionRule = serde_json::from_value(json!({
            "selector": "[data-action='update']",
            "template": "T1",
            "filter": {}
        }))
        .unwrap();

        assert_eq!(rule.display, DisplayMode::Default);
        assert_eq!(rule.filter_spec(), Ok(FilterSpec::Empty));
    }

    #[test]
    fn test_absent_filter_differs_from_null() {
        let absent: ActionRule = serde_json::from_value(json!({
            "selector": "a",
            "template": "T1"
        }))
        .unwrap();
        let null: ActionRule = serde_json::from_value(json!({
            "selector": "a",
            "template": "T1",
            "filter": null
        }))
        .unwrap();

        assert!(absent.filter_spec().is_err());
        assert_eq!(null.filter_spec(), Ok(FilterSpec::Empty));
    }

    #[test]
    fn test_filter_spec_shapes() {
        let rule = ActionRule::new("a", "T1").with_filter(json!({"owner": true}));
        assert!(matches!(rule.filter_spec(), Ok(FilterSpec::Static(m)) if m.len() == 1));

        let rule = ActionRule::new("a", "T1").with_filter(json!("managedGroups"));
        assert_eq!(rule.filter_spec(), Ok(FilterSpec::Dynamic("managedGroups")));

        let rule = ActionRule::new("a", "T1").with_filter(json!(""));
        assert_eq!(rule.filter_spec(), Ok(FilterSpec::Empty));

        let rule = ActionRule::new("a", "T1").with_filter(json!([1, 2]));
        let reason = rule.filter_spec().unwrap_err();
        assert!(reason.contains("array"));
    }

    #[test]
    fn test_brace_prefixed_string_is_a_hook_name() {
        let rule = ActionRule::new("a", "T1").with_filter(json!("{\"x\": 1}"));
        assert!(matches!(rule.filter_spec(), Ok(FilterSpec::Dynamic(_))));
    }

    #[test]
    fn test_strict_applies_only_to_own_template() {
        let rule = ActionRule::new("a", "T1").strict();
        assert!(rule.applies_to("T1"));
        assert!(!rule.applies_to("T2"));

        let rule = ActionRule::new("a", "T1");
        assert!(rule.applies_to("T2"));
    }

    // ============== RoleDocument Tests ==============

    #[test]
    fn test_role_from_record() {
        let role = RoleDocument::from_record(json!({
            "_id": "editor",
            "_tp": "roles",
            "name": "Editor",
            "actions": [
                {"selector": "[data-action='delete']", "template": "T1", "display": "strict", "filter": {"owner": true}}
            ]
        }))
        .unwrap();

        assert_eq!(role.id, "editor");
        assert_eq!(role.name.as_deref(), Some("Editor"));
        assert_eq!(role.actions.len(), 1);
        assert_eq!(role.actions[0].display, DisplayMode::Strict);
    }

    #[test]
    fn test_role_with_object_id() {
        let role = RoleDocument::from_record(json!({
            "_id": {"$oid": "5451a84c8f3c2e7e340000aa"},
            "actions": []
        }))
        .unwrap();
        assert_eq!(role.id, "5451a84c8f3c2e7e340000aa");
    }

    #[test]
    fn test_role_with_non_string_id() {
        assert!(RoleDocument::from_record(json!({"_id": 42})).is_err());
    }

    #[test]
    fn test_role_without_actions() {
        let role = RoleDocument::from_record(json!({"_id": "guest"})).unwrap();
        assert!(role.actions.is_empty());
    }

    #[test]
    fn test_role_from_malformed_record() {
        assert!(RoleDocument::from_record(json!({"actions": "nope"})).is_err());
    }
}
