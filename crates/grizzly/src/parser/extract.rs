//! Flattening of evaluated trees into manifests.

use serde_json::{Map, Value};

use crate::error::{GrizzlyError, Result};

/// A manifest found in an evaluated tree, with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    /// Dotted location inside the tree, e.g. `dashboards.main` or `items[2]`.
    pub path: String,
    pub value: Value,
}

fn is_manifest(obj: &Map<String, Value>) -> bool {
    obj.get("kind").map(Value::is_string).unwrap_or(false)
        && obj.get("apiVersion").map(Value::is_string).unwrap_or(false)
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Walks the tree and collects every object carrying `apiVersion` and `kind`.
///
/// Other objects and arrays are descended into, `null` is skipped and any
/// other primitive is an error.
pub fn extract(tree: &Value) -> Result<Vec<Extracted>> {
    let mut out = Vec::new();
    walk(tree, "", &mut out)?;
    Ok(out)
}

fn walk(value: &Value, path: &str, out: &mut Vec<Extracted>) -> Result<()> {
    match value {
        Value::Object(obj) if is_manifest(obj) => {
            out.push(Extracted {
                path: path.to_string(),
                value: value.clone(),
            });
            Ok(())
        }
        Value::Object(obj) => {
            for (key, child) in obj {
                walk(child, &child_path(path, key), out)?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                walk(child, &format!("{}[{}]", path, i), out)?;
            }
            Ok(())
        }
        Value::Null => Ok(()),
        other => Err(GrizzlyError::Extract {
            path: if path.is_empty() { "<root>".to_string() } else { path.to_string() },
            message: format!("expected an object or array, found {}", other),
        }),
    }
}

/// Replaces every `*List` wrapper with its items.
///
/// Items missing `kind` take the wrapper kind without the `List` suffix,
/// items missing `apiVersion` take the wrapper's, and wrapper metadata other
/// than `name` fills absent item metadata keys.
pub fn unwrap_lists(extracted: Vec<Extracted>) -> Result<Vec<Extracted>> {
    let mut out = Vec::with_capacity(extracted.len());
    for entry in extracted {
        unwrap_entry(entry, &mut out)?;
    }
    Ok(out)
}

fn list_item_kind(obj: &Map<String, Value>) -> Option<String> {
    let kind = obj.get("kind")?.as_str()?;
    let base = kind.strip_suffix("List")?;
    if base.is_empty() || !obj.contains_key("items") {
        return None;
    }
    Some(base.to_string())
}

fn unwrap_entry(entry: Extracted, out: &mut Vec<Extracted>) -> Result<()> {
    let Value::Object(wrapper) = &entry.value else {
        out.push(entry);
        return Ok(());
    };
    let Some(item_kind) = list_item_kind(wrapper) else {
        out.push(entry);
        return Ok(());
    };

    let items = match wrapper.get("items") {
        Some(Value::Array(items)) => items,
        _ => {
            return Err(GrizzlyError::Extract {
                path: entry.path.clone(),
                message: "list wrapper 'items' must be an array".to_string(),
            })
        }
    };
    let api_version = wrapper.get("apiVersion").cloned();
    let wrapper_meta = wrapper
        .get("metadata")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    for (i, item) in items.iter().enumerate() {
        let path = child_path(&entry.path, &format!("items[{}]", i));
        let Value::Object(item) = item else {
            return Err(GrizzlyError::Extract {
                path,
                message: format!("list item must be an object, found {}", item),
            });
        };
        let mut item = item.clone();
        item.entry("kind")
            .or_insert_with(|| Value::String(item_kind.clone()));
        if let Some(api_version) = &api_version {
            item.entry("apiVersion")
                .or_insert_with(|| api_version.clone());
        }
        if !wrapper_meta.is_empty() {
            let meta = item
                .entry("metadata")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(meta) = meta {
                for (key, value) in &wrapper_meta {
                    if key != "name" && !meta.contains_key(key) {
                        meta.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        // Items may themselves be lists
        unwrap_entry(
            Extracted {
                path,
                value: Value::Object(item),
            },
            out,
        )?;
    }
    Ok(())
}
