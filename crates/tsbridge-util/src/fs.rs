use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Read a file to string, replacing invalid UTF-8 sequences with the replacement character.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn read_to_string_lossy(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Recursively collect ambient declaration files (`*.d.ts`) under `root`.
///
/// The `node_modules` subtree is pruned entirely: dependency typings are the
/// package manager's concern, not part of the project's ambient declarations.
/// Results are sorted so the returned order is deterministic across platforms.
///
/// Unreadable directory entries are skipped rather than failing the scan.
pub fn find_declaration_files(root: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.file_name() != "node_modules")
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(".d.ts"))
        })
        .map(walkdir::DirEntry::into_path)
        .collect();

    found.sort();
    found
}
