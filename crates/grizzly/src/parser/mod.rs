//! Parsing pipeline: source files to a [`ResourceList`].
//!
//! YAML streams are decoded straight into manifests. Templated sources are
//! handed to an [`Evaluator`](evaluator::Evaluator), and the resulting tree is
//! flattened and list-unwrapped before each manifest is routed to the handler
//! for its kind. Any failure aborts the whole parse.

pub mod evaluator;
pub mod extract;
pub mod native;
pub mod yaml;

use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{GrizzlyError, Result};
use crate::registry::validate_id;
use crate::resource::{Manifest, ResourceList};
use evaluator::{bootstrap_snippet, EvalRequest, Evaluator, JsonEvaluator};

/// How a file is read, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Yaml,
    Jsonnet,
    Json,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Some(SourceFormat::Yaml),
            Some("jsonnet") | Some("libsonnet") => Some(SourceFormat::Jsonnet),
            Some("json") => Some(SourceFormat::Json),
            _ => None,
        }
    }
}

/// A named source that can be re-parsed on demand, used by the watch loop.
pub trait Parser: Send + Sync {
    fn name(&self) -> String;
    fn parse(&self, config: &Config) -> Result<ResourceList>;
}

/// Parses a file or directory path.
#[derive(Debug, Clone)]
pub struct PathParser {
    path: PathBuf,
}

impl PathParser {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Parser for PathParser {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn parse(&self, config: &Config) -> Result<ResourceList> {
        parse(config, &self.path)
    }
}

/// Parses a file by extension, or every supported file below a directory.
pub fn parse(config: &Config, path: &Path) -> Result<ResourceList> {
    let _span = tracing::info_span!("parse", path = %path.display()).entered();
    if path.is_dir() {
        return parse_dir(config, path);
    }
    match SourceFormat::from_path(path) {
        Some(SourceFormat::Yaml) => parse_yaml_file(config, path),
        Some(SourceFormat::Jsonnet) => {
            let evaluator = config
                .parse
                .evaluator
                .clone()
                .ok_or_else(|| GrizzlyError::EvaluatorMissing(path.to_path_buf()))?;
            parse_evaluated_file(config, path, evaluator.as_ref())
        }
        Some(SourceFormat::Json) => match config.parse.evaluator.clone() {
            Some(evaluator) => parse_evaluated_file(config, path, evaluator.as_ref()),
            None => parse_evaluated_file(config, path, &JsonEvaluator),
        },
        None => Err(GrizzlyError::UnsupportedFileType(path.to_path_buf())),
    }
}

fn parse_dir(config: &Config, dir: &Path) -> Result<ResourceList> {
    let mut resources = ResourceList::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
    {
        let entry = entry.map_err(|e| GrizzlyError::FileOperation(e.to_string()))?;
        let path = entry.path();
        if !path.is_file() || SourceFormat::from_path(path).is_none() {
            continue;
        }
        // libsonnet files are imported by others, never entrypoints
        if path.extension().and_then(|e| e.to_str()) == Some("libsonnet") {
            continue;
        }
        log::debug!("Parsing {}", path.display());
        resources.extend(parse(config, path)?)?;
    }
    Ok(resources)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| GrizzlyError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses a multi-document YAML file.
pub fn parse_yaml_file(config: &Config, path: &Path) -> Result<ResourceList> {
    parse_yaml_str(config, &read(path)?, path)
}

/// Parses YAML text; `path` names the source in errors and resources.
pub fn parse_yaml_str(config: &Config, text: &str, path: &Path) -> Result<ResourceList> {
    let manifests = yaml::parse_manifests(text, path)?;
    let source = path.display().to_string();
    route(
        config,
        manifests.into_iter().map(|m| (m, String::new())),
        &source,
    )
}

/// Evaluates a templated file and parses the resulting tree.
pub fn parse_evaluated_file(
    config: &Config,
    path: &Path,
    evaluator: &dyn Evaluator,
) -> Result<ResourceList> {
    let request = EvalRequest {
        entrypoint: path,
        snippet: bootstrap_snippet(path),
        import_paths: &config.parse.import_paths,
        native_functions: &config.parse.native_functions,
    };
    let tree = evaluator.evaluate(&request)?;
    parse_tree(config, &tree, path)
}

/// Extracts, unwraps and routes every manifest in an evaluated tree.
pub fn parse_tree(config: &Config, tree: &Value, path: &Path) -> Result<ResourceList> {
    let extracted = extract::unwrap_lists(extract::extract(tree)?)?;
    let mut manifests = Vec::with_capacity(extracted.len());
    for entry in extracted {
        let manifest =
            Manifest::from_value(entry.value).map_err(|e| GrizzlyError::InvalidManifest {
                path: path.to_path_buf(),
                message: format!("{}: {}", entry.path, e),
            })?;
        manifests.push((manifest, entry.path));
    }
    route(config, manifests.into_iter(), &path.display().to_string())
}

/// Hands each manifest to the handler for its kind.
///
/// Resources without a uid are collected and reported together; every other
/// failure returns immediately.
fn route(
    config: &Config,
    manifests: impl Iterator<Item = (Manifest, String)>,
    source: &str,
) -> Result<ResourceList> {
    let mut resources = ResourceList::new();
    let mut missing: Vec<String> = Vec::new();

    for (manifest, json_path) in manifests {
        let handler = config.registry.handler_for_kind(&manifest.kind)?;
        let parsed = match handler.parse(&manifest) {
            Ok(parsed) => parsed,
            Err(GrizzlyError::MissingUids(names)) => {
                missing.extend(names);
                continue;
            }
            Err(e) => return Err(e),
        };

        for mut resource in parsed {
            if resource.uid.is_empty() {
                missing.push(if resource.filename.is_empty() {
                    source.to_string()
                } else {
                    resource.filename.clone()
                });
                continue;
            }
            validate_id(&resource.uid)?;
            if resource.filename.is_empty() {
                resource.filename = source.to_string();
            }
            if resource.json_path.is_empty() {
                resource.json_path = json_path.clone();
            }
            resources.insert(resource)?;
        }
    }

    if !missing.is_empty() {
        return Err(GrizzlyError::MissingUids(missing));
    }
    Ok(resources)
}
