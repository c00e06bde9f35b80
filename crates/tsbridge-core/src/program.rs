//! Whole-program compilation context management.
//!
//! Constructing a type-checking program is expensive and needs full
//! cross-file knowledge, so it happens once per build: the first transform
//! pays the cost, every later transform reuses the snapshot. The snapshot is
//! frozen at first use — entry points discovered after that point do not get
//! whole-program diagnostics. That is an intentional policy, not an
//! oversight; rebuilding mid-build would change the performance profile.

use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::Arc;

use crate::compiler::{CompilerError, CompilerService, Program};
use crate::config::CompilerOptions;

/// Owns the lazily built, build-scoped program snapshot.
pub struct ProgramHost {
    root: PathBuf,
    program: OnceCell<Arc<dyn Program>>,
}

impl ProgramHost {
    /// Create a host scoped to the given project root.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            program: OnceCell::new(),
        }
    }

    /// Build the program on first call; serve the cached snapshot after.
    ///
    /// The root file set is the union of all ambient declaration files
    /// under the project root (dependency cache excluded, sorted) followed
    /// by the entry points, in that order.
    ///
    /// # Errors
    ///
    /// Returns the service's `CompilerError` if program construction fails.
    /// A failed construction is not cached; the next call retries.
    pub fn ensure_program(
        &self,
        entry_points: &[PathBuf],
        options: &CompilerOptions,
        service: &dyn CompilerService,
    ) -> Result<&Arc<dyn Program>, CompilerError> {
        self.program.get_or_try_init(|| {
            let mut roots = tsbridge_util::find_declaration_files(&self.root);
            for entry in entry_points {
                let entry = dunce::canonicalize(entry).unwrap_or_else(|_| entry.clone());
                if !roots.contains(&entry) {
                    roots.push(entry);
                }
            }
            tracing::debug!(
                service = service.name(),
                files = roots.len(),
                "building whole-program context"
            );
            service.create_program(&roots, options)
        })
    }
}
