//! # Type Coercion & Unknown-Key Stripping
//!
//! Request segments arrive mostly as strings: path parameters, query
//! values, headers and cookies never carry JSON types. Before validation
//! the engine rewrites string input into the types the schema declares,
//! and optionally drops keys the schema does not know.
//!
//! Both walks follow `type`, `properties`, `additionalProperties` (schema
//! form) and `items`. Anything else in the schema, `$ref` included, is
//! left to the validator.

use serde_json::{Map, Number, Value};

/// Rewrite `value` into the types declared by `schema`.
///
/// Coercion never fails: input that cannot be converted is returned
/// unchanged and the validator reports it.
pub fn coerce(schema: &Value, value: Value) -> Value {
    let Some(schema) = schema.as_object() else {
        return value;
    };

    let types = declared_types(schema);
    let value = coerce_type(&types, value);

    match value {
        Value::Object(mut map) => {
            coerce_properties(schema, &mut map);
            Value::Object(map)
        }
        Value::Array(items) => match schema.get("items") {
            Some(item_schema) if item_schema.is_object() => Value::Array(
                items
                    .into_iter()
                    .map(|item| coerce(item_schema, item))
                    .collect(),
            ),
            _ => Value::Array(items),
        },
        other => other,
    }
}

/// Remove object keys that `schema` does not declare.
///
/// Objects are only stripped when the schema lists `properties` and
/// allows nothing beyond them: no `patternProperties` and an absent or
/// `false` `additionalProperties`.
pub fn strip_unknown(schema: &Value, value: &mut Value) {
    let Some(schema) = schema.as_object() else {
        return;
    };

    match value {
        Value::Object(map) => {
            let Some(Value::Object(props)) = schema.get("properties") else {
                return;
            };
            let open = schema.contains_key("patternProperties")
                || matches!(
                    schema.get("additionalProperties"),
                    Some(Value::Bool(true)) | Some(Value::Object(_))
                );
            if !open {
                map.retain(|key, _| props.contains_key(key));
            }
            for (key, sub) in props {
                if let Some(slot) = map.get_mut(key) {
                    strip_unknown(sub, slot);
                }
            }
        }
        Value::Array(items) => {
            if let Some(item_schema) = schema.get("items") {
                for item in items.iter_mut() {
                    strip_unknown(item_schema, item);
                }
            }
        }
        _ => {}
    }
}

fn coerce_properties(schema: &Map<String, Value>, map: &mut Map<String, Value>) {
    let props = match schema.get("properties") {
        Some(Value::Object(props)) => Some(props),
        _ => None,
    };

    if let Some(props) = props {
        for (key, sub) in props {
            if let Some(slot) = map.get_mut(key) {
                let v = slot.take();
                *slot = coerce(sub, v);
            }
        }
    }

    if let Some(extra) = schema.get("additionalProperties").filter(|s| s.is_object()) {
        for (key, slot) in map.iter_mut() {
            if props.is_some_and(|p| p.contains_key(key)) {
                continue;
            }
            let v = slot.take();
            *slot = coerce(extra, v);
        }
    }
}

fn declared_types(schema: &Map<String, Value>) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn coerce_type(types: &[&str], value: Value) -> Value {
    if types.is_empty() || types.iter().any(|t| has_type(t, &value)) {
        return value;
    }

    if let Value::String(s) = &value {
        for t in types {
            if let Some(parsed) = parse_as(t, s) {
                return parsed;
            }
        }
    }

    if types.contains(&"array") && !value.is_object() {
        return Value::Array(vec![value]);
    }

    value
}

fn has_type(t: &str, value: &Value) -> bool {
    match t {
        "string" => value.is_string(),
        "integer" => match value {
            Value::Number(n) => n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0),
            _ => false,
        },
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => false,
    }
}

fn parse_as(t: &str, s: &str) -> Option<Value> {
    match t {
        "integer" => parse_integer(s),
        "number" => parse_integer(s).or_else(|| {
            s.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .and_then(Number::from_f64)
                .map(Value::Number)
        }),
        "boolean" => match s {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        "null" => (s == "null").then_some(Value::Null),
        _ => None,
    }
}

fn parse_integer(s: &str) -> Option<Value> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::Number(i.into()));
    }
    s.parse::<u64>().ok().map(|u| Value::Number(u.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_string_becomes_number() {
        let schema = json!({"type": "object", "properties": {"page": {"type": "number"}}});
        assert_eq!(coerce(&schema, json!({"page": "5"})), json!({"page": 5}));
        assert_eq!(coerce(&schema, json!({"page": "2.5"})), json!({"page": 2.5}));
    }

    #[test]
    fn integer_rejects_fractions() {
        let schema = json!({"type": "integer"});
        assert_eq!(coerce(&schema, json!("42")), json!(42));
        assert_eq!(coerce(&schema, json!("4.2")), json!("4.2"));
    }

    #[test]
    fn unparseable_input_left_alone() {
        let schema = json!({"type": "number"});
        assert_eq!(coerce(&schema, json!("five")), json!("five"));
        assert_eq!(coerce(&schema, json!("NaN")), json!("NaN"));
    }

    #[test]
    fn booleans() {
        let schema = json!({"type": "boolean"});
        assert_eq!(coerce(&schema, json!("true")), json!(true));
        assert_eq!(coerce(&schema, json!("false")), json!(false));
        assert_eq!(coerce(&schema, json!("yes")), json!("yes"));
    }

    #[test]
    fn null_literal() {
        let schema = json!({"type": ["integer", "null"]});
        assert_eq!(coerce(&schema, json!("null")), Value::Null);
        assert_eq!(coerce(&schema, json!("12")), json!(12));
    }

    #[test]
    fn strings_stay_strings_when_allowed() {
        let schema = json!({"type": ["string", "integer"]});
        assert_eq!(coerce(&schema, json!("7")), json!("7"));
    }

    #[test]
    fn scalar_wrapped_into_array_and_items_coerced() {
        let schema = json!({"type": "array", "items": {"type": "integer"}});
        assert_eq!(coerce(&schema, json!("3")), json!([3]));
        assert_eq!(coerce(&schema, json!(["1", "2"])), json!([1, 2]));
    }

    #[test]
    fn additional_properties_schema_applies_to_extra_keys() {
        let schema = json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "additionalProperties": {"type": "integer"}
        });
        assert_eq!(
            coerce(&schema, json!({"name": "10", "a": "1", "b": "x"})),
            json!({"name": "10", "a": 1, "b": "x"})
        );
    }

    #[test]
    fn nested_objects() {
        let schema = json!({
            "type": "object",
            "properties": {
                "filter": {
                    "type": "object",
                    "properties": {"min": {"type": "integer"}, "active": {"type": "boolean"}}
                }
            }
        });
        assert_eq!(
            coerce(&schema, json!({"filter": {"min": "3", "active": "true"}})),
            json!({"filter": {"min": 3, "active": true}})
        );
    }

    #[test]
    fn strip_removes_undeclared_keys() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "tags": {"type": "array", "items": {"type": "object", "properties": {"id": {}}}}
            }
        });
        let mut value = json!({"name": "a", "admin": true, "tags": [{"id": 1, "x": 2}]});
        strip_unknown(&schema, &mut value);
        assert_eq!(value, json!({"name": "a", "tags": [{"id": 1}]}));
    }

    #[test]
    fn strip_respects_open_schemas() {
        let schema = json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "additionalProperties": true
        });
        let mut value = json!({"name": "a", "extra": 1});
        strip_unknown(&schema, &mut value);
        assert_eq!(value, json!({"name": "a", "extra": 1}));
    }

    #[test]
    fn strip_without_properties_is_noop() {
        let schema = json!({"type": "object"});
        let mut value = json!({"anything": 1});
        strip_unknown(&schema, &mut value);
        assert_eq!(value, json!({"anything": 1}));
    }

    #[test]
    fn objects_are_not_wrapped_into_arrays() {
        let schema = json!({"type": "array", "items": {"type": "object"}});
        assert_eq!(coerce(&schema, json!({"a": 1})), json!({"a": 1}));
        assert_eq!(coerce(&schema, json!("x")), json!(["x"]));
    }

    proptest::proptest! {
        #[test]
        fn integer_strings_coerce_to_the_same_integer(n in proptest::num::i64::ANY) {
            let schema = json!({"type": "integer"});
            proptest::prop_assert_eq!(coerce(&schema, json!(n.to_string())), json!(n));
        }

        #[test]
        fn strings_pass_through_string_schemas(s in ".*") {
            let schema = json!({"type": "string"});
            proptest::prop_assert_eq!(coerce(&schema, json!(s.clone())), json!(s));
        }
    }
}
