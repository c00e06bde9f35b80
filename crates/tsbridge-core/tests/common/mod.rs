//! Shared test doubles: a scriptable compiler service and a recording sink.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tsbridge_core::compiler::{CompilerError, CompilerService, Program, TranspileOutput};
use tsbridge_core::config::CompilerOptions;
use tsbridge_core::diagnostics::{Diagnostic, DiagnosticSink, SourceLocation};

/// Canonicalize a path the way the plugin does internally.
pub fn canon(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap()
}

struct FakeProgram {
    roots: Vec<PathBuf>,
    scripted: HashMap<PathBuf, Vec<Diagnostic>>,
}

impl Program for FakeProgram {
    fn root_files(&self) -> &[PathBuf] {
        &self.roots
    }

    fn contains(&self, file: &Path) -> bool {
        self.roots.iter().any(|r| r == file)
    }

    fn pre_emit_diagnostics(&self, file: &Path) -> Vec<Diagnostic> {
        self.scripted.get(file).cloned().unwrap_or_default()
    }
}

/// A compiler service whose program diagnostics are scripted per file and
/// whose transpile step echoes the source with a minimal valid source map.
#[derive(Default)]
pub struct FakeCompiler {
    scripted: Mutex<HashMap<PathBuf, Vec<Diagnostic>>>,
}

impl FakeCompiler {
    pub fn script_diagnostics(&self, file: PathBuf, diagnostics: Vec<Diagnostic>) {
        self.scripted.lock().unwrap().insert(file, diagnostics);
    }
}

impl CompilerService for FakeCompiler {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn create_program(
        &self,
        root_files: &[PathBuf],
        _options: &CompilerOptions,
    ) -> Result<Arc<dyn Program>, CompilerError> {
        Ok(Arc::new(FakeProgram {
            roots: root_files.to_vec(),
            scripted: self.scripted.lock().unwrap().clone(),
        }))
    }

    fn transpile(
        &self,
        source: &str,
        file: &Path,
        options: &CompilerOptions,
    ) -> Result<TranspileOutput, CompilerError> {
        let mut output = TranspileOutput::new(source);
        if options.source_map == Some(true) {
            let map = serde_json::json!({
                "version": 3,
                "file": file.file_name().and_then(|n| n.to_str()).unwrap_or("module"),
                "sources": [file.display().to_string()],
                "names": [],
                "mappings": "AAAA",
            });
            output = output.with_source_map(map.to_string());
        }
        Ok(output)
    }
}

/// A sink that records everything it is handed.
#[derive(Default)]
pub struct RecordingSink {
    pub errors: Mutex<Vec<(String, Option<SourceLocation>)>>,
    pub warnings: Mutex<Vec<(String, Option<SourceLocation>)>>,
}

impl RecordingSink {
    pub fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.lock().unwrap().len()
    }
}

impl DiagnosticSink for RecordingSink {
    fn error(&self, message: &str, location: Option<&SourceLocation>) {
        self.errors
            .lock()
            .unwrap()
            .push((message.to_string(), location.cloned()));
    }

    fn warn(&self, message: &str, location: Option<&SourceLocation>) {
        self.warnings
            .lock()
            .unwrap()
            .push((message.to_string(), location.cloned()));
    }
}
