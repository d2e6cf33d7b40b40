//! JSON Schema for `manifest.json` plus the cross-field rules a schema
//! cannot express cleanly.

use jsonschema::error::ValidationErrorKind;
use jsonschema::{ValidationError, Validator};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use super::ValidationIssue;

/// Field types accepted in `user_config`
pub const FIELD_TYPES: [&str; 5] = ["string", "number", "boolean", "directory", "file"];

/// Validate a parsed manifest document, returning every issue sorted by path
pub fn validate_value(value: &Value) -> Vec<ValidationIssue> {
    let schema = manifest_schema();
    let compiled = match Validator::new(&schema) {
        Ok(compiled) => compiled,
        Err(e) => {
            return vec![ValidationIssue::new(
                "",
                format!("Failed to compile schema: {}", e),
            )]
        }
    };

    let mut issues: Vec<ValidationIssue> = match compiled.validate(value) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.map(|e| to_issue(&e)).collect(),
    };
    issues.extend(semantic_issues(value));

    issues.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.message.cmp(&b.message)));
    issues.dedup();
    issues
}

fn to_issue(error: &ValidationError) -> ValidationIssue {
    let mut path = dotted_path(&error.instance_path.to_string());
    if let ValidationErrorKind::Required { property } = &error.kind {
        let property = property
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| property.to_string());
        if path.is_empty() {
            path = property;
        } else {
            path = format!("{}.{}", path, property);
        }
    }
    ValidationIssue::new(path, error.to_string())
}

/// `/tools/1/name` -> `tools.1.name`
fn dotted_path(pointer: &str) -> String {
    pointer
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}

fn semantic_issues(value: &Value) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if let Some(fields) = value.get("user_config").and_then(Value::as_object) {
        for (name, field) in fields {
            if let Some(field) = field.as_object() {
                check_user_field(name, field, &mut issues);
            }
        }
    }

    if let Some(tools) = value.get("tools").and_then(Value::as_array) {
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        for (idx, tool) in tools.iter().enumerate() {
            let Some(name) = tool.get("name").and_then(Value::as_str) else {
                continue;
            };
            match seen.get(name) {
                Some(first) => issues.push(ValidationIssue::new(
                    format!("tools.{}.name", idx),
                    format!("duplicate tool name '{}' (first declared at tools.{})", name, first),
                )),
                None => {
                    seen.insert(name, idx);
                }
            }
        }
    }

    issues
}

fn check_user_field(name: &str, field: &Map<String, Value>, issues: &mut Vec<ValidationIssue>) {
    let base = format!("user_config.{}", name);
    let field_type = field.get("type").and_then(Value::as_str);
    let default = field.get("default");

    if field.get("sensitive").and_then(Value::as_bool) == Some(true) && default.is_some() {
        issues.push(ValidationIssue::new(
            format!("{}.default", base),
            "sensitive fields must not declare a default value",
        ));
    }

    if let (Some(default), Some(field_type)) = (default, field_type) {
        let type_ok = match field_type {
            "number" => default.is_number(),
            "boolean" => default.is_boolean(),
            "string" | "directory" | "file" => default.is_string(),
            _ => true,
        };
        if !type_ok {
            issues.push(ValidationIssue::new(
                format!("{}.default", base),
                format!("default value must be of type {}", field_type),
            ));
        }
    }

    if let (Some(choices), Some(default)) = (
        field.get("enum").and_then(Value::as_array),
        default.and_then(Value::as_str),
    ) {
        if !choices.iter().any(|c| c.as_str() == Some(default)) {
            issues.push(ValidationIssue::new(
                format!("{}.default", base),
                format!("default value '{}' is not one of the allowed values", default),
            ));
        }
    }

    if let (Some(min), Some(max)) = (
        field.get("min").and_then(Value::as_f64),
        field.get("max").and_then(Value::as_f64),
    ) {
        if min > max {
            issues.push(ValidationIssue::new(
                format!("{}.max", base),
                format!("max ({}) must not be less than min ({})", max, min),
            ));
        }
    }
}

/// The manifest JSON Schema
pub fn manifest_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["name", "version", "server"],
        "properties": {
            "name": {
                "type": "string",
                "minLength": 1,
                "pattern": "\\S"
            },
            "version": {
                "type": "string",
                "minLength": 1
            },
            "display_name": { "type": "string" },
            "description": { "type": "string" },
            "license": { "type": "string" },
            "homepage": { "type": "string" },
            "author": {
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": { "type": "string", "minLength": 1 },
                    "email": { "type": "string" },
                    "url": { "type": "string" }
                }
            },
            "server": {
                "$ref": "#/$defs/server"
            },
            "user_config": {
                "type": "object",
                "additionalProperties": {
                    "$ref": "#/$defs/userConfigField"
                }
            },
            "tools": {
                "type": "array",
                "items": {
                    "$ref": "#/$defs/tool"
                }
            }
        },
        "$defs": {
            "server": {
                "type": "object",
                "required": ["type", "entry_point"],
                "properties": {
                    "type": {
                        "type": "string",
                        "enum": ["python", "node", "binary"]
                    },
                    "entry_point": {
                        "type": "string",
                        "minLength": 1
                    },
                    "mcp_config": {
                        "type": "object",
                        "properties": {
                            "command": { "type": "string", "minLength": 1 },
                            "args": {
                                "type": "array",
                                "items": { "type": "string" }
                            },
                            "env": {
                                "type": "object",
                                "additionalProperties": { "type": "string" }
                            }
                        }
                    }
                }
            },
            "userConfigField": {
                "type": "object",
                "required": ["type"],
                "properties": {
                    "type": {
                        "type": "string",
                        "enum": FIELD_TYPES
                    },
                    "title": { "type": "string" },
                    "description": { "type": "string" },
                    "required": { "type": "boolean" },
                    "sensitive": { "type": "boolean" },
                    "enum": {
                        "type": "array",
                        "items": { "type": "string" },
                        "minItems": 1
                    },
                    "min": { "type": "number" },
                    "max": { "type": "number" }
                }
            },
            "tool": {
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": { "type": "string", "minLength": 1 },
                    "description": { "type": "string" }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Value {
        json!({
            "name": "my-ext",
            "version": "1.0.0",
            "server": { "type": "node", "entry_point": "server/index.js" }
        })
    }

    fn paths(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn test_valid_document_has_no_issues() {
        assert!(validate_value(&base()).is_empty());
    }

    #[test]
    fn test_unknown_top_level_keys_allowed() {
        let mut doc = base();
        doc["dxt_version"] = json!("0.1");
        doc["keywords"] = json!(["sql"]);
        assert!(validate_value(&doc).is_empty());
    }

    #[test]
    fn test_missing_required_field_reports_its_path() {
        let mut doc = base();
        doc.as_object_mut().unwrap().remove("version");
        let issues = validate_value(&doc);
        assert_eq!(paths(&issues), vec!["version"]);
        assert!(issues[0].message.contains("version"));
    }

    #[test]
    fn test_nested_required_field() {
        let mut doc = base();
        doc["server"] = json!({ "type": "python" });
        let issues = validate_value(&doc);
        assert_eq!(paths(&issues), vec!["server.entry_point"]);
    }

    #[test]
    fn test_all_issues_are_collected() {
        let doc = json!({
            "name": "",
            "server": { "type": "ruby", "entry_point": "main.rb" },
            "tools": [{ "description": "nameless" }]
        });
        let issues = validate_value(&doc);
        let found = paths(&issues);
        assert!(found.contains(&"name"));
        assert!(found.contains(&"version"));
        assert!(found.contains(&"server.type"));
        assert!(found.contains(&"tools.0.name"));
        let mut sorted = found.clone();
        sorted.sort();
        assert_eq!(found, sorted);
    }

    #[test]
    fn test_whitespace_only_name() {
        let mut doc = base();
        doc["name"] = json!("   ");
        assert_eq!(paths(&validate_value(&doc)), vec!["name"]);
    }

    #[test]
    fn test_sensitive_field_with_default() {
        let mut doc = base();
        doc["user_config"] = json!({
            "api_key": { "type": "string", "sensitive": true, "default": "abc" }
        });
        let issues = validate_value(&doc);
        assert_eq!(paths(&issues), vec!["user_config.api_key.default"]);
        assert!(issues[0].message.contains("sensitive"));
    }

    #[test]
    fn test_default_type_and_enum() {
        let mut doc = base();
        doc["user_config"] = json!({
            "port": { "type": "number", "default": "1433" },
            "mode": { "type": "string", "enum": ["a", "b"], "default": "c" },
            "range": { "type": "number", "min": 10, "max": 1 }
        });
        let issues = validate_value(&doc);
        assert_eq!(
            paths(&issues),
            vec![
                "user_config.mode.default",
                "user_config.port.default",
                "user_config.range.max"
            ]
        );
    }

    #[test]
    fn test_unknown_field_type() {
        let mut doc = base();
        doc["user_config"] = json!({ "x": { "type": "color" } });
        assert_eq!(paths(&validate_value(&doc)), vec!["user_config.x.type"]);
    }

    #[test]
    fn test_duplicate_tool_names() {
        let mut doc = base();
        doc["tools"] = json!([
            { "name": "query" },
            { "name": "list" },
            { "name": "query" }
        ]);
        let issues = validate_value(&doc);
        assert_eq!(paths(&issues), vec!["tools.2.name"]);
        assert!(issues[0].message.contains("tools.0"));
    }

    #[test]
    fn test_dotted_path() {
        assert_eq!(dotted_path(""), "");
        assert_eq!(dotted_path("/tools/1/name"), "tools.1.name");
        assert_eq!(dotted_path("/user_config/a~1b"), "user_config.a/b");
    }
}
