//! Plan and import results exchanged with the host.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// Dotted path of the attribute.
    pub path: String,
    /// Value before the change; `None` when the attribute is being set.
    pub before: Option<Value>,
    /// Value after the change; `None` when the attribute is being removed.
    pub after: Option<Value>,
}

impl AttributeChange {
    /// A change from `before` to `after`.
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// An attribute that gains a value.
    pub fn added(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// An attribute that loses its value.
    pub fn removed(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// An attribute whose value changes.
    pub fn modified(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self::new(path, Some(before), Some(after))
    }
}

/// The outcome of planning one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// State expected after applying; `null` for a delete.
    pub planned_state: Value,
    /// Attribute-level differences from the prior state.
    pub changes: Vec<AttributeChange>,
    /// A force-new attribute changed: delete and re-create instead of updating.
    pub requires_replace: bool,
}

impl PlanResult {
    /// A plan that keeps `state` as is.
    pub fn no_change(state: Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// A plan with changes.
    pub fn with_changes(planned_state: Value, changes: Vec<AttributeChange>, requires_replace: bool) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }

    /// Whether applying the plan changes anything.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// The change to `path`, if any.
    pub fn change(&self, path: &str) -> Option<&AttributeChange> {
        self.changes.iter().find(|c| c.path == path)
    }
}

/// A resource brought under management by import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// Type name of the imported resource.
    pub resource_type: String,
    /// State read from the API.
    pub state: Value,
}

impl ImportedResource {
    /// An imported resource of `resource_type`.
    pub fn new(resource_type: impl Into<String>, state: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// What the provider offers, derived from its schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Resource type names, sorted.
    pub resources: Vec<String>,
    /// Resource types that accept `import`.
    pub importable: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_change_constructors() {
        let added = AttributeChange::added("name", json!("collector1"));
        assert!(added.before.is_none());
        assert_eq!(added.after, Some(json!("collector1")));

        let removed = AttributeChange::removed("category", json!("prod"));
        assert_eq!(removed.before, Some(json!("prod")));
        assert!(removed.after.is_none());

        let modified = AttributeChange::modified("scan_interval", json!("1m0s"), json!("5m0s"));
        assert_eq!(modified.before, Some(json!("1m0s")));
        assert_eq!(modified.after, Some(json!("5m0s")));
    }

    #[test]
    fn test_plan_result() {
        let unchanged = PlanResult::no_change(json!({"id": "123"}));
        assert!(!unchanged.has_changes());
        assert!(!unchanged.requires_replace);

        let replace = PlanResult::with_changes(
            json!({"collector_id": 2}),
            vec![AttributeChange::modified("collector_id", json!(1), json!(2))],
            true,
        );
        assert!(replace.requires_replace);
        assert!(replace.change("collector_id").is_some());
        assert!(replace.change("name").is_none());
    }

    #[test]
    fn test_imported_resource() {
        let imported = ImportedResource::new("sumologic_http_source", json!({"id": 7, "collector_id": 3}));
        assert_eq!(imported.resource_type, "sumologic_http_source");
        assert_eq!(imported.state["collector_id"], 3);
    }
}
