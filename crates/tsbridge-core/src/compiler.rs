//! External compiler service abstraction.
//!
//! This module provides a trait-based abstraction over the TypeScript
//! compiler. The integration layer never parses, type-checks, or generates
//! code itself; it delegates all of that to a [`CompilerService`]
//! implementation. The design allows for swappable backends without changing
//! the rest of the plugin.
//!
//! Two units of work are distinguished:
//!
//! - **Whole-program analysis** ([`Program`]): expensive, built once per
//!   build, required for cross-file type information.
//! - **Single-file transpilation** ([`CompilerService::transpile`]): cheap,
//!   file-local, no type information.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::CompilerOptions;
use crate::diagnostics::Diagnostic;

/// Module output format (tsconfig `module`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    /// CommonJS (require/module.exports).
    CommonJS,
    /// ECMAScript 2015 modules.
    ES2015,
    /// ECMAScript 2020 modules (adds dynamic import, import.meta).
    ES2020,
    /// ECMAScript 2022 modules.
    ES2022,
    /// Latest module syntax.
    #[default]
    ESNext,
    /// Preserve original module syntax.
    Preserve,
}

impl ModuleKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CommonJS => "commonjs",
            Self::ES2015 => "es2015",
            Self::ES2020 => "es2020",
            Self::ES2022 => "es2022",
            Self::ESNext => "esnext",
            Self::Preserve => "preserve",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Module resolution mode (tsconfig `moduleResolution`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModuleResolutionKind {
    /// Legacy TypeScript resolution.
    Classic,
    /// Node.js CommonJS resolution.
    Node,
    /// Bundler-style resolution: extensionless imports, no `require` lookup.
    #[default]
    Bundler,
}

impl ModuleResolutionKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Node => "node",
            Self::Bundler => "bundler",
        }
    }
}

impl fmt::Display for ModuleResolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// ECMAScript target version (tsconfig `target`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EsTarget {
    #[serde(rename = "es5")]
    ES5,
    #[serde(rename = "es2015")]
    ES2015,
    #[serde(rename = "es2016")]
    ES2016,
    #[serde(rename = "es2017")]
    ES2017,
    #[serde(rename = "es2018")]
    ES2018,
    #[serde(rename = "es2019")]
    ES2019,
    #[serde(rename = "es2020")]
    ES2020,
    #[serde(rename = "es2021")]
    ES2021,
    #[default]
    #[serde(rename = "es2022")]
    ES2022,
    #[serde(rename = "esnext")]
    ESNext,
}

impl EsTarget {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ES5 => "es5",
            Self::ES2015 => "es2015",
            Self::ES2016 => "es2016",
            Self::ES2017 => "es2017",
            Self::ES2018 => "es2018",
            Self::ES2019 => "es2019",
            Self::ES2020 => "es2020",
            Self::ES2021 => "es2021",
            Self::ES2022 => "es2022",
            Self::ESNext => "esnext",
        }
    }
}

impl fmt::Display for EsTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// JSX emit mode (tsconfig `jsx`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum JsxMode {
    /// Keep JSX as-is for a downstream transform.
    #[default]
    Preserve,
    /// Classic `React.createElement` output.
    React,
    /// Automatic runtime (`react/jsx-runtime`).
    ReactJsx,
}

impl JsxMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preserve => "preserve",
            Self::React => "react",
            Self::ReactJsx => "react-jsx",
        }
    }
}

impl fmt::Display for JsxMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output from a successful single-file transpilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranspileOutput {
    /// Generated JavaScript code.
    pub code: String,
    /// Source map JSON text (if generated).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_map: Option<String>,
}

impl TranspileOutput {
    /// Create a new transpile output.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            source_map: None,
        }
    }

    /// Set the source map text.
    #[must_use]
    pub fn with_source_map(mut self, source_map: impl Into<String>) -> Self {
        self.source_map = Some(source_map.into());
        self
    }
}

/// Error during compilation.
#[derive(Debug)]
pub struct CompilerError {
    /// Error code.
    pub code: &'static str,
    /// Human-readable error message.
    pub message: String,
    /// Compiler diagnostics (if available).
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilerError {
    /// Create a new compiler error.
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            diagnostics: Vec::new(),
        }
    }

    /// Create an error with diagnostics.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Create a program-construction error.
    #[must_use]
    pub fn program_error(message: impl Into<String>) -> Self {
        Self::new("COMPILER_PROGRAM_ERROR", message)
    }

    /// Create a transpile error.
    #[must_use]
    pub fn transpile_error(message: impl Into<String>) -> Self {
        Self::new("COMPILER_TRANSPILE_ERROR", message)
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        for diag in &self.diagnostics {
            write!(f, "\n  - {}: {}", diag.severity.as_str(), diag.message())?;
            if let (Some(file), Some(start)) = (diag.file.as_ref(), diag.start) {
                write!(f, " at {}@{}", file.display(), start)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for CompilerError {}

/// An immutable whole-program type-checking context.
///
/// Spans a fixed set of root files with full knowledge of their
/// cross-references. Built once per build and only queried afterwards.
pub trait Program: Send + Sync {
    /// The root files the program was constructed over, in order.
    fn root_files(&self) -> &[PathBuf];

    /// Whether the program has a source-file entry for `file`.
    fn contains(&self, file: &Path) -> bool;

    /// Pre-emit diagnostics (syntax and type errors) scoped to `file`.
    fn pre_emit_diagnostics(&self, file: &Path) -> Vec<Diagnostic>;
}

/// Compiler service trait: the external compiler this layer delegates to.
///
/// The trait is `Send + Sync` to allow use across threads.
pub trait CompilerService: Send + Sync {
    /// Get the service name (e.g., "tsc", "fake").
    fn name(&self) -> &'static str;

    /// Parse tsconfig text (JSON with comments) into a JSON value.
    ///
    /// # Errors
    ///
    /// Returns the parse diagnostic if the text is not valid JSONC.
    fn parse_config_text(
        &self,
        file_name: &Path,
        text: &str,
    ) -> Result<serde_json::Value, Diagnostic> {
        let stripped = crate::config::strip_jsonc(text);
        serde_json::from_str(&stripped).map_err(|e| {
            Diagnostic::error(format!("Failed to parse '{}': {e}.", file_name.display()))
                .with_code(5014)
        })
    }

    /// Validate and convert raw JSON compiler options into typed options.
    ///
    /// Returns the converted options along with any conversion diagnostics
    /// (unknown options, invalid values).
    fn convert_options(&self, raw: &serde_json::Value) -> (CompilerOptions, Vec<Diagnostic>) {
        crate::config::convert_options(raw)
    }

    /// Construct a whole-program type-checking context over `root_files`.
    ///
    /// # Errors
    ///
    /// Returns a `CompilerError` if the program cannot be constructed
    /// (e.g., a root file cannot be read).
    fn create_program(
        &self,
        root_files: &[PathBuf],
        options: &CompilerOptions,
    ) -> Result<Arc<dyn Program>, CompilerError>;

    /// Transpile a single file in isolation, with no cross-file type
    /// information.
    ///
    /// # Errors
    ///
    /// Returns a `CompilerError` if code generation fails.
    fn transpile(
        &self,
        source: &str,
        file: &Path,
        options: &CompilerOptions,
    ) -> Result<TranspileOutput, CompilerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&ModuleKind::ESNext).unwrap(),
            "\"esnext\""
        );
        assert_eq!(
            serde_json::to_string(&ModuleKind::CommonJS).unwrap(),
            "\"commonjs\""
        );
        let parsed: ModuleKind = serde_json::from_str("\"es2020\"").unwrap();
        assert_eq!(parsed, ModuleKind::ES2020);
    }

    #[test]
    fn test_module_resolution_default_is_bundler() {
        assert_eq!(ModuleResolutionKind::default(), ModuleResolutionKind::Bundler);
        assert_eq!(
            serde_json::to_string(&ModuleResolutionKind::Bundler).unwrap(),
            "\"bundler\""
        );
    }

    #[test]
    fn test_es_target_serialization() {
        assert_eq!(serde_json::to_string(&EsTarget::ES2022).unwrap(), "\"es2022\"");
        let parsed: EsTarget = serde_json::from_str("\"esnext\"").unwrap();
        assert_eq!(parsed, EsTarget::ESNext);
    }

    #[test]
    fn test_jsx_mode_serialization() {
        assert_eq!(
            serde_json::to_string(&JsxMode::ReactJsx).unwrap(),
            "\"react-jsx\""
        );
    }

    #[test]
    fn test_transpile_output_builder() {
        let output = TranspileOutput::new("const x = 1;").with_source_map("{\"version\":3}");
        assert_eq!(output.code, "const x = 1;");
        assert_eq!(output.source_map, Some("{\"version\":3}".to_string()));
    }

    #[test]
    fn test_compiler_error_display() {
        let error = CompilerError::transpile_error("Unexpected token");
        assert!(error.to_string().contains("COMPILER_TRANSPILE_ERROR"));
        assert!(error.to_string().contains("Unexpected token"));
    }

    #[test]
    fn test_compiler_error_with_diagnostics() {
        let diag = Diagnostic::error("Missing semicolon")
            .at(std::path::PathBuf::from("src/app.ts"), 42);
        let error = CompilerError::program_error("Check failed").with_diagnostics(vec![diag]);

        let display = error.to_string();
        assert!(display.contains("src/app.ts"));
        assert!(display.contains("Missing semicolon"));
    }
}
