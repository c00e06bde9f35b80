//! Plugin hook surface for the host bundler.
//!
//! Provides a Rollup-compatible plugin interface: the host calls `options`
//! once with its input declaration, `resolve_id` for each import specifier,
//! and `transform` for each module needing compilation. Hooks signal
//! "not my concern" with `Ok(None)`; hard failures are `PluginError`.

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::diagnostics::DiagnosticSink;

/// Result type for plugin hooks.
pub type HookResult<T> = Result<T, PluginError>;

/// Error from a plugin.
#[derive(Debug)]
pub struct PluginError {
    /// Plugin name that caused the error.
    pub plugin: String,
    /// Hook that failed.
    pub hook: &'static str,
    /// Error message.
    pub message: String,
}

impl PluginError {
    /// Create a new plugin error.
    #[must_use]
    pub fn new(plugin: impl Into<String>, hook: &'static str, message: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            hook,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.plugin, self.hook, self.message)
    }
}

impl std::error::Error for PluginError {}

/// The bundler's input declaration, as it appears in its configuration:
/// a single entry path, a sequence of paths, or a mapping of output names
/// to paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BundleInput {
    /// One entry point.
    Single(PathBuf),
    /// An ordered sequence of entry points.
    Sequence(Vec<PathBuf>),
    /// Output name → entry point, insertion-ordered.
    Named(IndexMap<String, PathBuf>),
}

impl BundleInput {
    /// Normalize to a flat ordered sequence of entry paths.
    #[must_use]
    pub fn into_entry_points(self) -> Vec<PathBuf> {
        match self {
            Self::Single(path) => vec![path],
            Self::Sequence(paths) => paths,
            Self::Named(map) => map.into_values().collect(),
        }
    }
}

/// Context passed to plugin hooks.
#[derive(Default)]
pub struct PluginContext {
    /// Working directory.
    pub cwd: PathBuf,
    /// Live diagnostic sink; present only during `transform`.
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl PluginContext {
    /// Create a new plugin context.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self { cwd, sink: None }
    }

    /// Attach a live diagnostic sink for the duration of a transform.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// The live diagnostic sink, if any.
    #[must_use]
    pub fn sink(&self) -> Option<&dyn DiagnosticSink> {
        self.sink.as_deref()
    }
}

/// Result of transform hook.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformResult {
    /// Transformed code.
    pub code: String,
    /// Parsed source map object, if one was produced.
    pub map: Option<serde_json::Value>,
}

impl TransformResult {
    /// Create a transform result with code only.
    #[must_use]
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            map: None,
        }
    }

    /// Set the parsed source map.
    #[must_use]
    pub fn with_map(mut self, map: serde_json::Value) -> Self {
        self.map = Some(map);
        self
    }
}

/// The main plugin trait.
///
/// All methods have default implementations that do nothing, so a plugin
/// only implements the hooks it cares about.
pub trait Plugin: Send + Sync {
    /// Plugin name for debugging and error messages.
    fn name(&self) -> &str;

    /// Called once with the bundler's input declaration.
    ///
    /// `None` means the host supplied no input information; a plugin
    /// capturing entry points must treat that as "no new information",
    /// not as a reset.
    fn options(&self, _input: Option<&BundleInput>) -> HookResult<()> {
        Ok(())
    }

    /// Resolve a module specifier to an absolute on-disk path.
    ///
    /// Return `Some(path)` to handle this resolution, or `None` to let the
    /// next plugin or the default resolver handle it.
    fn resolve_id(
        &self,
        _specifier: &str,
        _importer: Option<&Path>,
        _ctx: &PluginContext,
    ) -> HookResult<Option<PathBuf>> {
        Ok(None)
    }

    /// Transform module source code.
    ///
    /// Return `Some(result)` to transform the code, or `None` to decline.
    fn transform(
        &self,
        _code: &str,
        _id: &Path,
        _ctx: &PluginContext,
    ) -> HookResult<Option<TransformResult>> {
        Ok(None)
    }
}

/// A container dispatching hooks across multiple plugins, in insertion
/// order. First `Some` wins for `resolve_id`; `transform` chains.
#[derive(Default)]
pub struct PluginContainer {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginContainer {
    /// Create an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin.
    pub fn add(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Deliver the input declaration to all plugins.
    pub fn options(&self, input: Option<&BundleInput>) -> HookResult<()> {
        for plugin in &self.plugins {
            plugin.options(input)?;
        }
        Ok(())
    }

    /// Try to resolve a module ID through plugins.
    /// Returns `None` if no plugin handled the resolution.
    pub fn resolve_id(
        &self,
        specifier: &str,
        importer: Option<&Path>,
        ctx: &PluginContext,
    ) -> HookResult<Option<PathBuf>> {
        for plugin in &self.plugins {
            if let Some(resolved) = plugin.resolve_id(specifier, importer, ctx)? {
                return Ok(Some(resolved));
            }
        }
        Ok(None)
    }

    /// Transform code through all plugins.
    /// Each plugin's output is passed to the next plugin.
    pub fn transform(
        &self,
        code: &str,
        id: &Path,
        ctx: &PluginContext,
    ) -> HookResult<TransformResult> {
        let mut current = TransformResult::code(code);
        for plugin in &self.plugins {
            if let Some(result) = plugin.transform(&current.code, id, ctx)? {
                current = result;
            }
        }
        Ok(current)
    }
}
