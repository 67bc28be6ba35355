//! Handler registry and UID addressing.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{GrizzlyError, Result};
use crate::handler::Handler;

/// A UID split into its handler name and resource id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUid {
    pub handler: String,
    pub id: String,
}

/// Splits `<handler>.<id>` or `<provider>.<subtype>.<id>`.
///
/// Ids never contain dots; the pipeline rejects resources whose uid does.
pub fn parse_uid(uid: &str) -> Result<ParsedUid> {
    let parts: Vec<&str> = uid.split('.').collect();
    let (handler, id) = match parts.as_slice() {
        [handler, id] => (handler.to_string(), *id),
        [provider, subtype, id] => (format!("{}.{}", provider, subtype), *id),
        _ => return Err(GrizzlyError::InvalidUid(uid.to_string())),
    };
    if handler.split('.').any(str::is_empty) || id.is_empty() {
        return Err(GrizzlyError::InvalidUid(uid.to_string()));
    }
    Ok(ParsedUid {
        handler,
        id: id.to_string(),
    })
}

/// Checks a resource id before it is addressed or used as a file name.
///
/// Ids may not contain dots (they would change how the UID splits) or path
/// separators (export writes `<Kind>/<id>.<ext>`).
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty()
        || id.contains(&['.', '/', '\\'][..])
        || std::path::Path::new(id).is_absolute()
    {
        return Err(GrizzlyError::InvalidUid(id.to_string()));
    }
    Ok(())
}

/// Maps handler names to handlers. Read-only once built.
#[derive(Default, Clone)]
pub struct Registry {
    handlers: HashMap<String, Arc<dyn Handler>>,
    kinds: HashMap<String, Arc<dyn Handler>>,
    order: Vec<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler, indexed by its name and its kind.
    ///
    /// A later handler with the same name replaces the earlier one. A later
    /// handler with the same kind takes over that kind, with a warning.
    pub fn with_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        let name = handler.name().to_string();
        if !self.handlers.contains_key(&name) {
            self.order.push(name.clone());
        }
        let previous = self
            .kinds
            .insert(handler.kind().to_string(), Arc::clone(&handler));
        if let Some(previous) = previous.filter(|p| p.name() != name) {
            log::warn!(
                "Handler {} replaces {} for kind {}",
                name,
                previous.name(),
                handler.kind()
            );
        }
        self.handlers.insert(name, handler);
        self
    }

    /// Exact lookup by handler name.
    pub fn get_handler(&self, name: &str) -> Result<Arc<dyn Handler>> {
        self.handlers
            .get(name)
            .cloned()
            .ok_or_else(|| GrizzlyError::HandlerNotFound(name.to_string()))
    }

    /// Exact lookup by resource kind.
    pub fn handler_for_kind(&self, kind: &str) -> Result<Arc<dyn Handler>> {
        self.kinds
            .get(kind)
            .cloned()
            .ok_or_else(|| GrizzlyError::HandlerNotFound(kind.to_string()))
    }

    /// Resolves a UID to its handler and id.
    pub fn resolve_uid(&self, uid: &str) -> Result<(Arc<dyn Handler>, String)> {
        let parsed = parse_uid(uid)?;
        let handler = self.get_handler(&parsed.handler)?;
        Ok((handler, parsed.id))
    }

    /// Registered handler names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("handlers", &self.order)
            .finish()
    }
}
