// Author: laravel-cfg contributors
// License: MIT

use std::fs;
use std::path::Path;

use serde_json::json;

use crate::ast::{ArrayKey, Mapping, Scalar, ValueNode};
use crate::visitor::ConfigVisitor;
use crate::AuditError;

/// Convert a parsed value tree to JSON.
///
/// - Scalars map directly (non-finite floats become `null`)
/// - Arrays with only string keys become objects, others an ordered list of
///   `{"key": .., "value": ..}` entries so integer keys survive
/// - Placeholders become tagged objects: `{"func_call": {"name", "args"}}`,
///   `{"class_const": {"class", "constant"}}`, `{"static_prop": {"class", "property"}}`
///   and `{"unparsed": kind}`
pub fn value_to_json(value: &ValueNode) -> serde_json::Value {
    match value {
        ValueNode::Scalar(Scalar::Null) => serde_json::Value::Null,
        ValueNode::Scalar(Scalar::Bool(b)) => json!(b),
        ValueNode::Scalar(Scalar::Int(i)) => json!(i),
        ValueNode::Scalar(Scalar::Float(f)) => json!(f),
        ValueNode::Scalar(Scalar::String(s)) => json!(s),
        ValueNode::Mapping(mapping) => mapping_to_json(mapping),
        ValueNode::FuncCall(call) => json!({
            "func_call": {
                "name": call.name,
                "args": call.args.iter().map(value_to_json).collect::<Vec<_>>(),
            }
        }),
        ValueNode::ClassConst { class, constant } => json!({
            "class_const": { "class": class, "constant": constant }
        }),
        ValueNode::StaticProp { class, property } => json!({
            "static_prop": { "class": class, "property": property }
        }),
        ValueNode::Unparsed { origin_kind } => json!({ "unparsed": origin_kind }),
    }
}

pub fn mapping_to_json(mapping: &Mapping) -> serde_json::Value {
    let string_keyed = mapping.keys().all(|k| matches!(k, ArrayKey::Str(_)));

    if string_keyed {
        let object = mapping
            .iter()
            .map(|(k, v)| (k.to_string(), value_to_json(v)))
            .collect::<serde_json::Map<_, _>>();
        return serde_json::Value::Object(object);
    }

    let entries = mapping
        .iter()
        .map(|(k, v)| {
            let key = match k {
                ArrayKey::Int(i) => json!(i),
                ArrayKey::Str(s) => json!(s),
            };
            json!({ "key": key, "value": value_to_json(v) })
        })
        .collect::<Vec<_>>();
    serde_json::Value::Array(entries)
}

/// Pretty-printed JSON for a parsed mapping.
pub fn mapping_to_json_string(mapping: &Mapping) -> Result<String, AuditError> {
    serde_json::to_string_pretty(&mapping_to_json(mapping)).map_err(|e| AuditError::SyntaxError {
        message: format!("Failed to serialize JSON: {}", e),
        line: 0,
        column: 0,
        hint: None,
        code: Some(500),
    })
}

/// Read a PHP config file and export the array it returns.
///
/// An unparsable file exports as `{}`, the same as a file returning `[]`.
pub fn export_config_file<P: AsRef<Path>>(path: P) -> Result<String, AuditError> {
    let path = path.as_ref();
    let input = fs::read_to_string(path).map_err(|e| AuditError::FileError {
        message: format!("Failed to read file: {}", e),
        path: path.display().to_string(),
        hint: Some("Check that the file exists and is readable".into()),
        code: Some(301),
    })?;

    mapping_to_json_string(&ConfigVisitor::new().visit(&input))
}
