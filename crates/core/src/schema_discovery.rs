//! Discovery of schema and migration files inside a checked-out repository.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Whether a file name looks like a schema definition or a migration.
///
/// The `.sql` suffix is matched case-sensitively; the `schema` and
/// `migration` markers are not.
fn is_schema_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    if name.ends_with(".sql") || lower.contains("schema") {
        return true;
    }
    lower.contains("migration") && (lower.ends_with(".py") || lower.ends_with(".js"))
}

/// Collect every schema-like file under `repo`, sorted by path.
///
/// Every directory is searched, including `.git` and installed
/// dependencies. A missing or unreadable repository yields an empty list.
pub fn find_schema_files(repo: &Path) -> Vec<PathBuf> {
    WalkDir::new(repo)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_str().is_some_and(is_schema_file))
        .map(walkdir::DirEntry::into_path)
        .collect()
}
