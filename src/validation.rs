//! Presence and type checks of configuration against a [`Schema`].
//!
//! ```
//! use sumologic_provider::schema::{Attribute, Schema};
//! use sumologic_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute("collector_id", Attribute::required_int64());
//!
//! assert!(validate(&schema, &json!({"name": "http", "collector_id": 42})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "http", "collector_id": "x"}));
//! assert_eq!(diagnostics[0].attribute.as_deref(), Some("collector_id"));
//! ```

use crate::schema::{Attribute, AttributeType, Block, BlockNestingMode, Diagnostic, NestedBlock, Schema};
use serde_json::Value;

/// Validate a configuration value against a schema.
///
/// - Required attributes must be present and non-null.
/// - Computed-only attributes are ignored.
/// - Present values must have the declared type.
/// - Nested blocks are checked recursively, including item counts.
/// - Attributes the schema does not know produce a warning.
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

/// [`validate`], as a `Result` carrying only the errors.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let errors: Vec<_> = validate(schema, value)
        .into_iter()
        .filter(Diagnostic::is_error)
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Whether `value` passes validation without errors.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate_result(schema, value).is_ok()
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return,
        _ => {
            let mut diag = Diagnostic::error("Expected object")
                .with_detail(format!("Got {}", value_type_name(value)));
            if !path.is_empty() {
                diag = diag.with_attribute(path);
            }
            diagnostics.push(diag);
            return;
        }
    };

    for (name, attr) in &block.attributes {
        validate_attribute(attr, obj.get(name), &join_path(path, name), diagnostics);
    }

    for (name, nested) in &block.blocks {
        validate_nested_block(nested, obj.get(name), &join_path(path, name), diagnostics);
    }

    for name in obj.keys() {
        if !block.attributes.contains_key(name) && !block.blocks.contains_key(name) {
            let attr_path = join_path(path, name);
            diagnostics.push(
                Diagnostic::warning(format!("Unsupported attribute '{}'", attr_path))
                    .with_detail("This attribute is not part of the resource and is ignored")
                    .with_attribute(attr_path),
            );
        }
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.is_computed_only() {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        }
        Some(v) => validate_attribute_type(&attr.attr_type, v, path, diagnostics),
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        }
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        }
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        }
        AttributeType::List(element_type) => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    validate_attribute_type(element_type, item, &format!("{}.{}", path, i), diagnostics);
                }
            }
            None => diagnostics.push(type_error(path, "list", value)),
        },
    }
}

fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match (nested.nesting_mode, value) {
        (_, None | Some(Value::Null)) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s)",
                        path, nested.min_items
                    ))
                    .with_attribute(path),
                );
            }
        }
        (BlockNestingMode::Single, Some(v)) => validate_block(&nested.block, v, path, diagnostics),
        (BlockNestingMode::List, Some(Value::Array(items))) => {
            let len = items.len() as u32;
            if len < nested.min_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s), got {}",
                        path, nested.min_items, len
                    ))
                    .with_attribute(path),
                );
            }
            if nested.max_items > 0 && len > nested.max_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' allows at most {} item(s), got {}",
                        path, nested.max_items, len
                    ))
                    .with_attribute(path),
                );
            }
            for (i, item) in items.iter().enumerate() {
                validate_block(&nested.block, item, &format!("{}.{}", path, i), diagnostics);
            }
        }
        (BlockNestingMode::List, Some(v)) => diagnostics.push(
            Diagnostic::error(format!("Expected list for block '{}'", path))
                .with_detail(format!("Got {}", value_type_name(v)))
                .with_attribute(path),
        ),
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64()
                || n.is_u64() && n.as_u64().map_or(false, |u| u <= i64::MAX as u64)
                || n.as_f64().map_or(false, |f| {
                    f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64
                })
        }
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected, value_type_name(got)))
        .with_attribute(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DiagnosticSeverity;
    use serde_json::json;

    fn source_schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_int64())
            .with_attribute("name", Attribute::required_string())
            .with_attribute("collector_id", Attribute::required_int64().with_force_new())
            .with_attribute("paused", Attribute::optional_bool())
            .with_attribute("blacklist", Attribute::optional_string_list())
            .with_attribute("url", Attribute::computed_string())
            .with_block(
                "filters",
                NestedBlock::list(
                    Block::new()
                        .with_attribute("filter_type", Attribute::required_string())
                        .with_attribute("name", Attribute::required_string())
                        .with_attribute("regexp", Attribute::required_string())
                        .with_attribute("mask", Attribute::optional_string()),
                ),
            )
    }

    fn errors(value: Value) -> Vec<Diagnostic> {
        validate(&source_schema(), &value)
            .into_iter()
            .filter(Diagnostic::is_error)
            .collect()
    }

    #[test]
    fn test_valid_source() {
        let diagnostics = validate(
            &source_schema(),
            &json!({
                "name": "local",
                "collector_id": 42,
                "paused": false,
                "blacklist": ["/var/log/secure"],
                "filters": [{"filter_type": "Exclude", "name": "noise", "regexp": ".*DEBUG.*"}]
            }),
        );
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    }

    #[test]
    fn test_missing_required() {
        let diagnostics = errors(json!({"collector_id": 42}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("name"));

        let diagnostics = errors(json!({"name": null, "collector_id": 42}));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_wrong_types() {
        let diagnostics = errors(json!({"name": 7, "collector_id": 1.5, "paused": "no"}));
        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics.iter().all(|d| d.summary.contains("Invalid type")));
    }

    #[test]
    fn test_integral_float_is_int64() {
        assert!(errors(json!({"name": "n", "collector_id": 42.0})).is_empty());
    }

    #[test]
    fn test_list_elements_are_checked() {
        let diagnostics = errors(json!({"name": "n", "collector_id": 1, "blacklist": ["ok", 3]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("blacklist.1"));
    }

    #[test]
    fn test_computed_attributes_are_ignored() {
        assert!(errors(json!({"name": "n", "collector_id": 1, "id": "x", "url": 5})).is_empty());
    }

    #[test]
    fn test_nested_block_items() {
        let diagnostics = errors(json!({
            "name": "n",
            "collector_id": 1,
            "filters": [{"filter_type": "Mask", "name": "ssn"}]
        }));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("filters.0.regexp"));

        let diagnostics = errors(json!({"name": "n", "collector_id": 1, "filters": {}}));
        assert!(diagnostics[0].summary.contains("Expected list"));
    }

    #[test]
    fn test_block_item_limits() {
        let schema = Schema::v0().with_block(
            "path",
            NestedBlock::list(Block::new()).with_min_items(1).with_max_items(1),
        );
        assert!(!is_valid(&schema, &json!({})));
        assert!(!is_valid(&schema, &json!({"path": [{}, {}]})));
        assert!(is_valid(&schema, &json!({"path": [{}]})));
    }

    #[test]
    fn test_unknown_attribute_warns() {
        let diagnostics = validate(
            &source_schema(),
            &json!({"name": "n", "collector_id": 1, "colector_id": 1}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, DiagnosticSeverity::Warning);
        assert!(validate_result(&source_schema(), &json!({"name": "n", "collector_id": 1, "x": 1})).is_ok());
    }

    #[test]
    fn test_non_object_root() {
        let diagnostics = validate(&source_schema(), &json!([1, 2]));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].attribute.is_none());
    }
}
