//! Template evaluation boundary.
//!
//! The template engine itself lives outside this crate. An [`Evaluator`] is
//! handed a bootstrap snippet that imports the entrypoint, the import search
//! path and the native helpers, and returns the evaluated JSON tree.

use std::path::{Path, PathBuf};

use serde_json::Value;

use super::native::NativeFunctions;
use crate::error::{GrizzlyError, Result};

/// Wraps the entrypoint so the whole evaluated file becomes the tree root.
pub fn bootstrap_snippet(entrypoint: &Path) -> String {
    let escaped = entrypoint.to_string_lossy().replace('\\', "\\\\").replace('\'', "\\'");
    format!("local main = (import '{}');\nmain\n", escaped)
}

/// Everything an evaluator needs for one run.
pub struct EvalRequest<'a> {
    /// The file being evaluated.
    pub entrypoint: &'a Path,
    /// Snippet to evaluate, from [`bootstrap_snippet`].
    pub snippet: String,
    /// Import search path, in priority order.
    pub import_paths: &'a [PathBuf],
    /// Helpers callable from templates by name.
    pub native_functions: &'a NativeFunctions,
}

/// An external template engine producing JSON trees.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, request: &EvalRequest<'_>) -> Result<Value>;
}

/// Evaluates plain JSON files, which need no templating.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonEvaluator;

impl Evaluator for JsonEvaluator {
    fn evaluate(&self, request: &EvalRequest<'_>) -> Result<Value> {
        let text =
            std::fs::read_to_string(request.entrypoint).map_err(|source| GrizzlyError::ReadFile {
                path: request.entrypoint.to_path_buf(),
                source,
            })?;
        serde_json::from_str(&text).map_err(|e| {
            GrizzlyError::Evaluation(format!("{}: {}", request.entrypoint.display(), e))
        })
    }
}
