#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::return_self_not_must_use)]

pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod plugin;
pub mod program;
pub mod resolver;
pub mod typescript;

pub use compiler::{
    CompilerError, CompilerService, EsTarget, JsxMode, ModuleKind, ModuleResolutionKind, Program,
    TranspileOutput,
};
pub use config::{resolve_configuration, CompilerOptions, TsConfigFile, TSCONFIG_FILENAME};
pub use diagnostics::{
    report, Diagnostic, DiagnosticError, DiagnosticSeverity, DiagnosticSink, SourceLocation,
};
pub use plugin::{
    BundleInput, HookResult, Plugin, PluginContainer, PluginContext, PluginError, TransformResult,
};
pub use program::ProgramHost;
pub use resolver::{is_typescript_file, ModuleResolver, ResolutionStrategy, TS_EXTENSIONS};
pub use typescript::{TypescriptPlugin, TypescriptPluginOptions};
