//! Compiler configuration resolution.
//!
//! Configuration comes from one of two places, never both: explicit
//! `compilerOptions` supplied by the caller, or a `tsconfig.json` read from
//! the working directory. Either way a fixed overlay is merged on top last —
//! the bundler owns module format, module resolution, source maps, and
//! helper imports, so user values for those keys never win.
//!
//! Failure is a sequence of diagnostics, not a scalar error: the caller
//! reports them and continues the build in degraded mode.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

use crate::compiler::{CompilerService, EsTarget, JsxMode, ModuleKind, ModuleResolutionKind};
use crate::diagnostics::Diagnostic;

/// Conventional configuration file name.
pub const TSCONFIG_FILENAME: &str = "tsconfig.json";

/// Typed compiler options following the tsconfig `compilerOptions` schema.
///
/// Unknown keys are captured in `extra` and surfaced as warning diagnostics
/// during conversion rather than rejected outright.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<EsTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<ModuleKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_resolution: Option<ModuleResolutionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jsx: Option<JsxMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_map: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_helpers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declaration: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_js: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub es_module_interop: Option<bool>,
    /// Unrecognized option keys, kept verbatim.
    #[serde(flatten, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CompilerOptions {
    /// Apply the fixed overlay. Always merged last; wins on key collision.
    ///
    /// Module format, module resolution, source maps and helper imports are
    /// the bundler's contract with the compiler, not user policy.
    #[must_use]
    pub fn with_forced_overlay(mut self) -> Self {
        self.module = Some(ModuleKind::ESNext);
        self.module_resolution = Some(ModuleResolutionKind::Bundler);
        self.source_map = Some(true);
        self.import_helpers = Some(true);
        self
    }
}

/// On-disk tsconfig shape: compiler options plus file inclusion patterns.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TsConfigFile {
    pub compiler_options: Option<serde_json::Value>,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub files: Option<Vec<String>>,
}

/// Strip `//` and `/* */` comments from JSONC text, string-aware.
///
/// Comment bytes are replaced with spaces so character offsets reported
/// against the original text stay valid. Trailing commas before a closing
/// bracket are also blanked, since tsconfig tolerates them.
#[must_use]
pub fn strip_jsonc(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = bytes.to_vec();
    let mut i = 0;
    let mut in_string = false;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == b'"' {
                in_string = false;
            }
            i += 1;
        } else if b == b'"' {
            in_string = true;
            i += 1;
        } else if b == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            while i < bytes.len() && bytes[i] != b'\n' {
                out[i] = b' ';
                i += 1;
            }
        } else if b == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
            out[i] = b' ';
            out[i + 1] = b' ';
            i += 2;
            while i < bytes.len() {
                if bytes[i] == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                    out[i] = b' ';
                    out[i + 1] = b' ';
                    i += 2;
                    break;
                }
                if bytes[i] != b'\n' {
                    out[i] = b' ';
                }
                i += 1;
            }
        } else if b == b',' {
            // Blank the comma if the next significant byte closes a scope.
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < bytes.len() && (bytes[j] == b'}' || bytes[j] == b']') {
                out[i] = b' ';
            }
            i += 1;
        } else {
            i += 1;
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Convert raw JSON compiler options into typed [`CompilerOptions`],
/// accumulating conversion diagnostics.
#[must_use]
pub fn convert_options(raw: &serde_json::Value) -> (CompilerOptions, Vec<Diagnostic>) {
    match serde_json::from_value::<CompilerOptions>(raw.clone()) {
        Ok(options) => {
            let diagnostics = options
                .extra
                .keys()
                .map(|key| {
                    Diagnostic::warning(format!("Unknown compiler option '{key}'."))
                        .with_code(5023)
                })
                .collect();
            (options, diagnostics)
        }
        Err(e) => (
            CompilerOptions::default(),
            vec![Diagnostic::error(format!("Invalid compiler options: {e}.")).with_code(5024)],
        ),
    }
}

fn validate_patterns(kind: &str, patterns: Option<&[String]>, diagnostics: &mut Vec<Diagnostic>) {
    let Some(patterns) = patterns else { return };
    for pattern in patterns {
        if let Err(e) = globset::Glob::new(pattern) {
            diagnostics.push(
                Diagnostic::error(format!(
                    "Invalid file pattern '{pattern}' in '{kind}': {e}."
                ))
                .with_code(5010),
            );
        }
    }
}

/// Resolve the compiler configuration for a build.
///
/// When `explicit` is given it entirely substitutes for file-based loading.
/// Otherwise `tsconfig.json` (or the `tsconfig` override path) is read from
/// `cwd`: a missing file is tolerated, any other read failure, a parse
/// failure, or config-level diagnostics abort resolution.
///
/// # Errors
///
/// Returns every accumulated diagnostic. The caller is responsible for
/// reporting them and treating the build as degraded, continuing
/// best-effort.
pub fn resolve_configuration(
    cwd: &Path,
    tsconfig: Option<&Path>,
    explicit: Option<&serde_json::Value>,
    service: &dyn CompilerService,
) -> Result<CompilerOptions, Vec<Diagnostic>> {
    let mut diagnostics = Vec::new();

    let base = if let Some(raw) = explicit {
        let (options, conversion) = service.convert_options(raw);
        diagnostics.extend(conversion);
        options
    } else {
        let path: PathBuf = tsconfig
            .map_or_else(|| cwd.join(TSCONFIG_FILENAME), Path::to_path_buf);
        match tsbridge_util::read_to_string_lossy(&path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no tsconfig found, using empty base");
                CompilerOptions::default()
            }
            Err(e) => {
                diagnostics.push(
                    Diagnostic::error(format!("Failed to read '{}': {e}.", path.display()))
                        .with_code(5083),
                );
                return Err(diagnostics);
            }
            Ok(text) => match service.parse_config_text(&path, &text) {
                Err(diagnostic) => {
                    diagnostics.push(diagnostic);
                    return Err(diagnostics);
                }
                Ok(value) => resolve_config_file(&value, service, &mut diagnostics),
            },
        }
    };

    if !diagnostics.is_empty() {
        return Err(diagnostics);
    }

    Ok(base.with_forced_overlay())
}

fn resolve_config_file(
    value: &serde_json::Value,
    service: &dyn CompilerService,
    diagnostics: &mut Vec<Diagnostic>,
) -> CompilerOptions {
    let file = match serde_json::from_value::<TsConfigFile>(value.clone()) {
        Ok(file) => file,
        Err(e) => {
            diagnostics
                .push(Diagnostic::error(format!("Invalid tsconfig contents: {e}.")).with_code(5024));
            return CompilerOptions::default();
        }
    };

    validate_patterns("include", file.include.as_deref(), diagnostics);
    validate_patterns("exclude", file.exclude.as_deref(), diagnostics);

    match file.compiler_options.as_ref() {
        Some(raw) => {
            let (options, conversion) = service.convert_options(raw);
            diagnostics.extend(conversion);
            options
        }
        None => CompilerOptions::default(),
    }
}
