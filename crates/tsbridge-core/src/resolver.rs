//! Extension-aware import specifier resolution.
//!
//! Resolution only applies when the importing file itself is a TypeScript
//! source; anything else is deferred to the host bundler's own resolution.
//! A miss is a normal outcome, never an error.
//!
//! Two mutually exclusive strategies exist, selected per plugin instance:
//!
//! - [`ResolutionStrategy::ExtensionPreserving`]: bare specifiers only;
//!   candidate extensions are tried in preference order, then a
//!   directory-index fallback.
//! - [`ResolutionStrategy::ExtensionRemapping`]: specifiers carrying a plain
//!   script extension are rewritten to the paired TypeScript extension and
//!   accepted only if the rewritten path exists.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Recognized TypeScript source extensions, in resolution preference order.
pub const TS_EXTENSIONS: [&str; 4] = ["ts", "tsx", "cts", "mts"];

/// Plain script extension → paired TypeScript extension.
const EXTENSION_REMAP: [(&str, &str); 4] = [
    ("js", "ts"),
    ("jsx", "tsx"),
    ("cjs", "cts"),
    ("mjs", "mts"),
];

/// Whether a file belongs to this plugin by extension.
#[must_use]
pub fn is_typescript_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| TS_EXTENSIONS.contains(&ext))
}

/// Which resolution strategy is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionStrategy {
    /// Resolve bare specifiers by appending candidate extensions.
    #[default]
    ExtensionPreserving,
    /// Rewrite plain script extensions to their TypeScript pairs.
    ExtensionRemapping,
}

/// Import resolver for TypeScript sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleResolver {
    strategy: ResolutionStrategy,
}

impl ModuleResolver {
    /// Create a resolver with the given strategy.
    #[must_use]
    pub fn new(strategy: ResolutionStrategy) -> Self {
        Self { strategy }
    }

    /// The active strategy.
    #[must_use]
    pub fn strategy(&self) -> ResolutionStrategy {
        self.strategy
    }

    /// Resolve `importee` relative to `importer`.
    ///
    /// Returns the canonical absolute path of an existing file, or `None`
    /// to defer to the next resolver.
    #[must_use]
    pub fn resolve_id(&self, importee: &str, importer: Option<&Path>) -> Option<PathBuf> {
        let importer = importer?;
        if !is_typescript_file(importer) {
            return None;
        }
        let base = importer.parent().unwrap_or_else(|| Path::new("."));

        let resolved = match self.strategy {
            ResolutionStrategy::ExtensionPreserving => resolve_preserving(importee, base),
            ResolutionStrategy::ExtensionRemapping => resolve_remapping(importee, base),
        };
        if let Some(path) = &resolved {
            tracing::debug!(importee, path = %path.display(), "resolved import");
        }
        resolved
    }
}

fn accept(candidate: PathBuf) -> Option<PathBuf> {
    if candidate.is_file() {
        dunce::canonicalize(candidate).ok()
    } else {
        None
    }
}

fn resolve_preserving(importee: &str, base: &Path) -> Option<PathBuf> {
    // Bare specifiers only; an explicit extension is someone else's concern.
    if Path::new(importee).extension().is_some() {
        return None;
    }

    for ext in TS_EXTENSIONS {
        if let Some(found) = accept(base.join(format!("{importee}.{ext}"))) {
            return Some(found);
        }
    }

    // Directory-index fallback.
    for ext in TS_EXTENSIONS {
        if let Some(found) = accept(base.join(importee).join(format!("index.{ext}"))) {
            return Some(found);
        }
    }

    None
}

fn resolve_remapping(importee: &str, base: &Path) -> Option<PathBuf> {
    let (stem, ext) = importee.rsplit_once('.')?;
    let (_, ts_ext) = EXTENSION_REMAP.iter().find(|(plain, _)| *plain == ext)?;
    accept(base.join(format!("{stem}.{ts_ext}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        std::fs::write(path, "export {};").unwrap();
    }

    #[test]
    fn test_is_typescript_file() {
        assert!(is_typescript_file(Path::new("a.ts")));
        assert!(is_typescript_file(Path::new("a.tsx")));
        assert!(is_typescript_file(Path::new("a.cts")));
        assert!(is_typescript_file(Path::new("a.mts")));
        assert!(!is_typescript_file(Path::new("a.js")));
        assert!(!is_typescript_file(Path::new("a.d")));
        assert!(!is_typescript_file(Path::new("a")));
    }

    #[test]
    fn test_preserving_resolves_bare_specifier() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("utils.ts"));
        let importer = dir.path().join("index.ts");
        touch(&importer);

        let resolver = ModuleResolver::new(ResolutionStrategy::ExtensionPreserving);
        let resolved = resolver.resolve_id("./utils", Some(&importer)).unwrap();
        assert!(resolved.ends_with("utils.ts"));
        assert!(resolved.is_absolute());
    }

    #[test]
    fn test_preserving_extension_preference_order() {
        let dir = tempdir().unwrap();
        // Both candidates exist; .ts must win over .tsx.
        touch(&dir.path().join("widget.ts"));
        touch(&dir.path().join("widget.tsx"));
        let importer = dir.path().join("index.ts");
        touch(&importer);

        let resolver = ModuleResolver::new(ResolutionStrategy::ExtensionPreserving);
        let resolved = resolver.resolve_id("./widget", Some(&importer)).unwrap();
        assert!(resolved.ends_with("widget.ts"));
    }

    #[test]
    fn test_preserving_directory_index_fallback() {
        let dir = tempdir().unwrap();
        let lib = dir.path().join("lib");
        std::fs::create_dir(&lib).unwrap();
        touch(&lib.join("index.ts"));
        let importer = dir.path().join("index.ts");
        touch(&importer);

        let resolver = ModuleResolver::new(ResolutionStrategy::ExtensionPreserving);
        let resolved = resolver.resolve_id("./lib", Some(&importer)).unwrap();
        assert!(resolved.ends_with("lib/index.ts") || resolved.ends_with("lib\\index.ts"));
    }

    #[test]
    fn test_preserving_declines_specifier_with_extension() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("utils.ts"));
        let importer = dir.path().join("index.ts");
        touch(&importer);

        let resolver = ModuleResolver::new(ResolutionStrategy::ExtensionPreserving);
        assert!(resolver.resolve_id("./utils.js", Some(&importer)).is_none());
    }

    #[test]
    fn test_preserving_miss_defers() {
        let dir = tempdir().unwrap();
        let importer = dir.path().join("index.ts");
        touch(&importer);

        let resolver = ModuleResolver::new(ResolutionStrategy::ExtensionPreserving);
        assert!(resolver.resolve_id("./missing", Some(&importer)).is_none());
        assert!(resolver.resolve_id("lodash", Some(&importer)).is_none());
    }

    #[test]
    fn test_non_typescript_importer_defers() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("utils.ts"));
        let importer = dir.path().join("index.js");
        touch(&importer);

        let resolver = ModuleResolver::new(ResolutionStrategy::ExtensionPreserving);
        assert!(resolver.resolve_id("./utils", Some(&importer)).is_none());
        assert!(resolver.resolve_id("./utils", None).is_none());
    }

    #[test]
    fn test_remapping_rewrites_each_pair() {
        let dir = tempdir().unwrap();
        let importer = dir.path().join("app.ts");
        touch(&importer);

        for (plain, typed) in [("js", "ts"), ("jsx", "tsx"), ("cjs", "cts"), ("mjs", "mts")] {
            touch(&dir.path().join(format!("mod_{plain}.{typed}")));
            let resolver = ModuleResolver::new(ResolutionStrategy::ExtensionRemapping);
            let resolved = resolver
                .resolve_id(&format!("./mod_{plain}.{plain}"), Some(&importer))
                .unwrap();
            assert!(resolved.to_str().unwrap().ends_with(&format!("mod_{plain}.{typed}")));
        }
    }

    #[test]
    fn test_remapping_missing_target_defers() {
        let dir = tempdir().unwrap();
        let importer = dir.path().join("app.ts");
        touch(&importer);

        let resolver = ModuleResolver::new(ResolutionStrategy::ExtensionRemapping);
        assert!(resolver.resolve_id("./missing.js", Some(&importer)).is_none());
    }

    #[test]
    fn test_remapping_ignores_bare_and_typescript_specifiers() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("utils.ts"));
        let importer = dir.path().join("app.ts");
        touch(&importer);

        let resolver = ModuleResolver::new(ResolutionStrategy::ExtensionRemapping);
        // No extension at all: not remapping's concern.
        assert!(resolver.resolve_id("./utils", Some(&importer)).is_none());
        // Already a TypeScript extension: not in the remap table.
        assert!(resolver.resolve_id("./utils.ts", Some(&importer)).is_none());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("dep.ts"));
        let importer = dir.path().join("index.ts");
        touch(&importer);

        let resolver = ModuleResolver::new(ResolutionStrategy::ExtensionPreserving);
        let first = resolver.resolve_id("./dep", Some(&importer));
        let second = resolver.resolve_id("./dep", Some(&importer));
        assert_eq!(first, second);
    }
}
