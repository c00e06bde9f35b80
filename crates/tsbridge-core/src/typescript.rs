//! The TypeScript integration plugin.
//!
//! Wires configuration resolution, module resolution, the whole-program
//! context and single-file transpilation behind the bundler's hook surface.
//! Build-scoped state is exactly three memoized values owned by the plugin
//! instance — entry points, resolved configuration, program snapshot — each
//! written at most once (first successful call wins) and read-only after.

use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::compiler::CompilerService;
use crate::config::{self, CompilerOptions};
use crate::diagnostics;
use crate::plugin::{BundleInput, HookResult, Plugin, PluginContext, PluginError, TransformResult};
use crate::program::ProgramHost;
use crate::resolver::{self, ModuleResolver, ResolutionStrategy};

/// Caller-supplied plugin options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypescriptPluginOptions {
    /// Explicit compiler options; when present, tsconfig loading is skipped
    /// entirely.
    pub compiler_options: Option<serde_json::Value>,
    /// Path to a config file other than the conventional `tsconfig.json`.
    pub tsconfig: Option<PathBuf>,
    /// Which resolution strategy to run.
    pub resolution: ResolutionStrategy,
}

/// TypeScript plugin for the bundler.
pub struct TypescriptPlugin {
    options: TypescriptPluginOptions,
    service: Arc<dyn CompilerService>,
    resolver: ModuleResolver,
    cwd: PathBuf,
    host: ProgramHost,
    entry_points: RwLock<Vec<PathBuf>>,
    config: OnceCell<CompilerOptions>,
}

impl TypescriptPlugin {
    /// Create a plugin with default options, rooted at the current working
    /// directory.
    #[must_use]
    pub fn new(service: Arc<dyn CompilerService>) -> Self {
        Self::with_options(service, TypescriptPluginOptions::default())
    }

    /// Create a plugin with explicit options.
    #[must_use]
    pub fn with_options(service: Arc<dyn CompilerService>, options: TypescriptPluginOptions) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            resolver: ModuleResolver::new(options.resolution),
            host: ProgramHost::new(cwd.clone()),
            options,
            service,
            cwd,
            entry_points: RwLock::new(Vec::new()),
            config: OnceCell::new(),
        }
    }

    /// Re-root the plugin at a different project directory.
    #[must_use]
    pub fn with_cwd(mut self, cwd: PathBuf) -> Self {
        self.host = ProgramHost::new(cwd.clone());
        self.cwd = cwd;
        self
    }

    /// The entry points captured from the `options` hook so far.
    #[must_use]
    pub fn entry_points(&self) -> Vec<PathBuf> {
        self.entry_points.read().unwrap().clone()
    }

    /// Resolve the compiler configuration once per build.
    ///
    /// On failure the diagnostics are reported through the live sink and
    /// the build continues in degraded mode with overlay-over-default
    /// options. Degradation is tolerated here; only per-file program
    /// diagnostics abort a transform.
    fn resolved_options(&self, ctx: &PluginContext) -> &CompilerOptions {
        self.config.get_or_init(|| {
            match config::resolve_configuration(
                &self.cwd,
                self.options.tsconfig.as_deref(),
                self.options.compiler_options.as_ref(),
                &*self.service,
            ) {
                Ok(options) => options,
                Err(found) => {
                    if let Err(e) = diagnostics::report(&found, ctx.sink()) {
                        tracing::warn!(
                            error = %e,
                            "configuration resolution failed; continuing with default options"
                        );
                    }
                    CompilerOptions::default().with_forced_overlay()
                }
            }
        })
    }

    fn hook_error(&self, hook: &'static str, message: impl Into<String>) -> PluginError {
        PluginError::new(self.name(), hook, message)
    }
}

impl Plugin for TypescriptPlugin {
    fn name(&self) -> &str {
        "typescript"
    }

    fn options(&self, input: Option<&BundleInput>) -> HookResult<()> {
        // Absent input carries no new information; never clear what a
        // previous invocation captured.
        if let Some(input) = input {
            let entries = input.clone().into_entry_points();
            tracing::debug!(count = entries.len(), "captured entry points");
            *self.entry_points.write().unwrap() = entries;
        }
        Ok(())
    }

    fn resolve_id(
        &self,
        specifier: &str,
        importer: Option<&Path>,
        _ctx: &PluginContext,
    ) -> HookResult<Option<PathBuf>> {
        Ok(self.resolver.resolve_id(specifier, importer))
    }

    fn transform(
        &self,
        code: &str,
        id: &Path,
        ctx: &PluginContext,
    ) -> HookResult<Option<TransformResult>> {
        if !resolver::is_typescript_file(id) {
            return Ok(None);
        }

        let options = self.resolved_options(ctx);

        let entries = self.entry_points();
        let program = self
            .host
            .ensure_program(&entries, options, &*self.service)
            .map_err(|e| self.hook_error("transform", e.to_string()))?;

        if program.contains(id) {
            let found = program.pre_emit_diagnostics(id);
            diagnostics::report(&found, ctx.sink())
                .map_err(|e| self.hook_error("transform", e.to_string()))?;
        } else {
            tracing::debug!(id = %id.display(), "file outside program snapshot, transpile only");
        }

        // Code generation is deliberately file-local: type information needs
        // the whole program, emit does not.
        let output = self
            .service
            .transpile(code, id, options)
            .map_err(|e| self.hook_error("transform", e.to_string()))?;

        let map = output
            .source_map
            .as_deref()
            .map(serde_json::from_str::<serde_json::Value>)
            .transpose()
            .map_err(|e| self.hook_error("transform", format!("invalid source map: {e}")))?;

        Ok(Some(TransformResult {
            code: output.code,
            map,
        }))
    }
}
