//! Helper functions exposed to template evaluators.

use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{GrizzlyError, Result};

/// A helper callable from evaluated templates.
pub type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Named helper functions, keyed by the name templates call them with.
#[derive(Clone)]
pub struct NativeFunctions {
    functions: BTreeMap<String, NativeFn>,
}

impl NativeFunctions {
    /// An empty set.
    pub fn empty() -> Self {
        Self {
            functions: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, f: NativeFn) -> Self {
        self.functions.insert(name.into(), f);
        self
    }

    pub fn get(&self, name: &str) -> Option<&NativeFn> {
        self.functions.get(name)
    }

    /// Calls a helper by name.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let f = self
            .get(name)
            .ok_or_else(|| GrizzlyError::Evaluation(format!("unknown native function: {}", name)))?;
        f(args)
    }

    pub fn names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).collect()
    }
}

impl Default for NativeFunctions {
    fn default() -> Self {
        Self::empty()
            .with("parseJson", Arc::new(parse_json))
            .with("parseYaml", Arc::new(parse_yaml))
            .with("manifestJsonFromJson", Arc::new(manifest_json_from_json))
            .with("manifestYamlFromJson", Arc::new(manifest_yaml_from_json))
            .with("escapeStringRegex", Arc::new(escape_string_regex))
            .with("regexMatch", Arc::new(regex_match))
            .with("regexSubst", Arc::new(regex_subst))
            .with("sha256", Arc::new(sha256))
    }
}

fn str_arg<'a>(args: &'a [Value], index: usize, function: &str) -> Result<&'a str> {
    args.get(index).and_then(Value::as_str).ok_or_else(|| {
        GrizzlyError::Evaluation(format!(
            "{}: argument {} must be a string",
            function, index
        ))
    })
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| GrizzlyError::Evaluation(e.to_string()))
}

fn parse_json(args: &[Value]) -> Result<Value> {
    Ok(serde_json::from_str(str_arg(args, 0, "parseJson")?)?)
}

/// Returns every document in the stream as an array.
fn parse_yaml(args: &[Value]) -> Result<Value> {
    let text = str_arg(args, 0, "parseYaml")?;
    let mut docs = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = serde_yaml::Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }
        docs.push(serde_json::to_value(value)?);
    }
    Ok(Value::Array(docs))
}

/// Widest indent `manifestJsonFromJson` renders.
const MAX_INDENT: u64 = 16;

fn manifest_json_from_json(args: &[Value]) -> Result<Value> {
    let text = str_arg(args, 0, "manifestJsonFromJson")?;
    let indent = args
        .get(1)
        .and_then(Value::as_u64)
        .unwrap_or(2)
        .min(MAX_INDENT) as usize;
    let value: Value = serde_json::from_str(text)?;

    let indent_str = " ".repeat(indent);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent_str.as_bytes());
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    let mut rendered = String::from_utf8(out).map_err(|e| GrizzlyError::Evaluation(e.to_string()))?;
    rendered.push('\n');
    Ok(Value::String(rendered))
}

fn manifest_yaml_from_json(args: &[Value]) -> Result<Value> {
    let value: Value = serde_json::from_str(str_arg(args, 0, "manifestYamlFromJson")?)?;
    Ok(Value::String(serde_yaml::to_string(&value)?))
}

fn escape_string_regex(args: &[Value]) -> Result<Value> {
    Ok(Value::String(regex::escape(str_arg(
        args,
        0,
        "escapeStringRegex",
    )?)))
}

fn regex_match(args: &[Value]) -> Result<Value> {
    let re = compile(str_arg(args, 0, "regexMatch")?)?;
    Ok(Value::Bool(re.is_match(str_arg(args, 1, "regexMatch")?)))
}

fn regex_subst(args: &[Value]) -> Result<Value> {
    let re = compile(str_arg(args, 0, "regexSubst")?)?;
    let src = str_arg(args, 1, "regexSubst")?;
    let repl = str_arg(args, 2, "regexSubst")?;
    Ok(Value::String(re.replace_all(src, repl).into_owned()))
}

fn sha256(args: &[Value]) -> Result<Value> {
    let digest = Sha256::digest(str_arg(args, 0, "sha256")?.as_bytes());
    Ok(Value::String(format!("{:x}", digest)))
}
