//! Resolves a node's input mapping into concrete arguments (§4.1).

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use super::data_source::DataSource;
use super::template::{render_text, Selector};

/// Value Resolver failure. Resolution itself never raises on missing data; this
/// error is reserved for structural bugs in the caller's input mapping.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolverError {
    #[error("input mapping must be a JSON object, got: {0}")]
    NotAMapping(String),
}

/// Resolves a single template value against `data`.
///
/// - An exact `{{ path }}` reference (the whole string, nothing else) navigates and
///   returns the referenced value *unchanged*, preserving its type. If navigation
///   fails, falls back to text rendering (so the literal stays literal rather than
///   silently becoming an empty string) per §4.1.
/// - Any other string containing `{{ }}` is rendered as text.
/// - Objects and arrays are resolved recursively, element by element.
/// - Any other scalar (plain string with no template, number, bool, null) passes
///   through unchanged.
pub fn resolve_value(template: &Value, data: &DataSource) -> Value {
    match template {
        Value::String(s) => {
            if let Some(selector) = Selector::parse(s) {
                match data.navigate(&selector.path) {
                    Some(v) => v,
                    None => Value::String(render_text(s, data)),
                }
            } else if super::template::contains_template(s) {
                Value::String(render_text(s, data))
            } else {
                Value::String(s.clone())
            }
        }
        Value::Object(map) => {
            let resolved = map
                .iter()
                .map(|(k, v)| (k.clone(), resolve_value(v, data)))
                .collect();
            Value::Object(resolved)
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| resolve_value(v, data)).collect())
        }
        other => other.clone(),
    }
}

/// Resolves a full input mapping (argument name -> template value) into concrete
/// arguments. `mapping` must already be a JSON object; anything else is a structural
/// bug in the caller, not a data-availability problem, and is the one case this
/// function raises on.
pub fn resolve_input_mapping(
    mapping: &Value,
    data: &DataSource,
) -> Result<HashMap<String, Value>, ResolverError> {
    let object = mapping
        .as_object()
        .ok_or_else(|| ResolverError::NotAMapping(mapping.to_string()))?;

    Ok(object
        .iter()
        .map(|(k, v)| (k.clone(), resolve_value(v, data)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data_with_a_output() -> DataSource {
        let mut outputs = HashMap::new();
        outputs.insert("A".to_string(), json!({"y": 2}));
        DataSource::new(outputs, HashMap::new())
    }

    /// **Scenario**: scenario 1 from the spec — `{z: "{{ A.y }}"}` resolves to `{z: 2}`,
    /// preserving the number type rather than stringifying it.
    #[test]
    fn resolve_exact_reference_preserves_type() {
        let data = data_with_a_output();
        let mapping = json!({"z": "{{ A.y }}"});
        let resolved = resolve_input_mapping(&mapping, &data).unwrap();
        assert_eq!(resolved["z"], json!(2));
    }

    /// **Scenario**: a literal value with no template passes through unchanged.
    #[test]
    fn resolve_literal_passthrough() {
        let data = DataSource::new(HashMap::new(), HashMap::new());
        let mapping = json!({"x": 1, "label": "hello"});
        let resolved = resolve_input_mapping(&mapping, &data).unwrap();
        assert_eq!(resolved["x"], json!(1));
        assert_eq!(resolved["label"], json!("hello"));
    }

    /// **Scenario**: text interpolation renders to a string, not the raw type.
    #[test]
    fn resolve_text_interpolation_renders_string() {
        let data = data_with_a_output();
        let mapping = json!({"msg": "value is {{ A.y }}"});
        let resolved = resolve_input_mapping(&mapping, &data).unwrap();
        assert_eq!(resolved["msg"], json!("value is 2"));
    }

    /// **Scenario**: an exact reference to a missing path falls back to the
    /// text-render path rather than raising; since the path is unknown to the
    /// data source, it renders as empty text rather than erroring.
    #[test]
    fn resolve_exact_reference_missing_path_falls_back_to_text() {
        let data = DataSource::new(HashMap::new(), HashMap::new());
        let mapping = json!({"z": "{{ Missing.y }}"});
        let resolved = resolve_input_mapping(&mapping, &data).unwrap();
        assert_eq!(resolved["z"], json!(""));
    }

    /// **Scenario**: nested objects and arrays resolve recursively.
    #[test]
    fn resolve_nested_structures() {
        let data = data_with_a_output();
        let mapping = json!({
            "nested": {"inner": "{{ A.y }}"},
            "list": ["{{ A.y }}", "literal"]
        });
        let resolved = resolve_input_mapping(&mapping, &data).unwrap();
        assert_eq!(resolved["nested"]["inner"], json!(2));
        assert_eq!(resolved["list"][0], json!(2));
        assert_eq!(resolved["list"][1], json!("literal"));
    }

    /// **Scenario**: a non-object mapping raises a structural ResolverError.
    #[test]
    fn resolve_non_mapping_is_structural_error() {
        let data = DataSource::new(HashMap::new(), HashMap::new());
        let err = resolve_input_mapping(&json!([1, 2, 3]), &data).unwrap_err();
        assert!(matches!(err, ResolverError::NotAMapping(_)));
    }

    /// **Scenario**: resolving the same mapping twice with the same data yields equal
    /// results (pure function of state, testable property from §8).
    #[test]
    fn resolve_is_pure() {
        let data = data_with_a_output();
        let mapping = json!({"z": "{{ A.y }}", "msg": "y is {{ A.y }}"});
        let first = resolve_input_mapping(&mapping, &data).unwrap();
        let second = resolve_input_mapping(&mapping, &data).unwrap();
        assert_eq!(first, second);
    }
}
