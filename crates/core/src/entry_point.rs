//! Entry-point resolution for a classified repository.
//!
//! Resolution order:
//!
//! 1. An entry point declared by the operator.
//! 2. The first conventional file name present for the runtime family.
//! 3. The manifest `main` field (Node) or the first Python file carrying a
//!    run-as-script guard.
//! 4. A per-family default file name.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::{DirEntry, WalkDir};

use crate::app_kind::{AppKind, NODE_MANIFEST};

/// Conventional Node.js start files, in priority order.
pub const NODE_CANDIDATES: [&str; 4] = ["server.js", "app.js", "index.js", "main.js"];

/// Conventional Python start files, in priority order.
pub const PYTHON_CANDIDATES: [&str; 5] = ["app.py", "main.py", "run.py", "server.py", "manage.py"];

/// Guard line marking a Python module that is meant to be executed directly.
const SCRIPT_MARKER: &str = "if __name__ == '__main__'";

/// Django's management script.
const DJANGO_MANAGE: &str = "manage.py";

/// Directories never descended into while scanning for the script marker.
const SKIPPED_DIRS: [&str; 4] = ["node_modules", "venv", "__pycache__", "site-packages"];

/// How an entry point was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySource {
    Declared,
    Candidate,
    ManifestMain,
    ScriptMarker,
    Default,
}

impl fmt::Display for EntrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Declared => "declared",
            Self::Candidate => "conventional file name",
            Self::ManifestMain => "package.json main",
            Self::ScriptMarker => "__main__ guard",
            Self::Default => "default",
        };
        f.write_str(label)
    }
}

/// Resolved start file, relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub path: PathBuf,
    pub source: EntrySource,
}

impl EntryPoint {
    fn new(path: impl Into<PathBuf>, source: EntrySource) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }

    /// Whether this is a Django `manage.py` that needs server arguments.
    pub fn is_django_manage(&self) -> bool {
        self.path.file_name().is_some_and(|name| name == DJANGO_MANAGE)
    }
}

#[derive(Deserialize)]
struct PackageManifest {
    main: Option<String>,
}

/// Pick the file the runner should launch for `repo`.
pub fn resolve_entry_point(repo: &Path, kind: AppKind, declared: Option<&str>) -> EntryPoint {
    if let Some(declared) = declared.map(str::trim).filter(|d| !d.is_empty()) {
        return EntryPoint::new(declared, EntrySource::Declared);
    }

    let candidates: &[&str] = match kind {
        AppKind::Node => &NODE_CANDIDATES,
        AppKind::Python => &PYTHON_CANDIDATES,
    };
    if let Some(found) = candidates.iter().find(|name| repo.join(name).is_file()) {
        return EntryPoint::new(*found, EntrySource::Candidate);
    }

    match kind {
        AppKind::Node => manifest_main(repo)
            .map(|main| EntryPoint::new(main, EntrySource::ManifestMain))
            .unwrap_or_else(|| EntryPoint::new("index.js", EntrySource::Default)),
        AppKind::Python => find_script_marker(repo)
            .map(|path| EntryPoint::new(path, EntrySource::ScriptMarker))
            .unwrap_or_else(|| EntryPoint::new("app.py", EntrySource::Default)),
    }
}

/// Read the `main` field of the package manifest, ignoring unreadable files.
fn manifest_main(repo: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(repo.join(NODE_MANIFEST)).ok()?;
    match serde_json::from_str::<PackageManifest>(&contents) {
        Ok(manifest) => manifest.main.filter(|main| !main.is_empty()),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed package.json");
            None
        }
    }
}

/// First `.py` file (in sorted walk order) containing the run-as-script guard.
fn find_script_marker(repo: &Path) -> Option<PathBuf> {
    WalkDir::new(repo)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "py"))
        .find(|entry| {
            std::fs::read_to_string(entry.path())
                .map(|contents| contents.contains(SCRIPT_MARKER))
                .unwrap_or(false)
        })
        .and_then(|entry| entry.path().strip_prefix(repo).ok().map(Path::to_path_buf))
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&&*name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn declared_entry_point_wins() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app.py", "");
        let entry = resolve_entry_point(dir.path(), AppKind::Python, Some("bin/serve.py"));
        assert_eq!(entry, EntryPoint::new("bin/serve.py", EntrySource::Declared));
    }

    #[test]
    fn blank_declaration_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.py", "");
        let entry = resolve_entry_point(dir.path(), AppKind::Python, Some("  "));
        assert_eq!(entry, EntryPoint::new("main.py", EntrySource::Candidate));
    }

    #[test]
    fn earlier_candidate_wins_over_later() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.js", "");
        write(dir.path(), "app.js", "");
        write(dir.path(), "main.js", "");
        let entry = resolve_entry_point(dir.path(), AppKind::Node, None);
        assert_eq!(entry.path, PathBuf::from("app.js"));
        assert_eq!(entry.source, EntrySource::Candidate);
    }

    #[test]
    fn python_candidates_follow_priority() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "manage.py", "");
        write(dir.path(), "run.py", "");
        let entry = resolve_entry_point(dir.path(), AppKind::Python, None);
        assert_eq!(entry.path, PathBuf::from("run.py"));
    }

    #[test]
    fn node_falls_back_to_manifest_main() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "package.json", r#"{"name":"x","main":"dist/boot.js"}"#);
        let entry = resolve_entry_point(dir.path(), AppKind::Node, None);
        assert_eq!(entry, EntryPoint::new("dist/boot.js", EntrySource::ManifestMain));
    }

    #[test]
    fn node_defaults_to_index_with_malformed_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "package.json", "{ not json");
        let entry = resolve_entry_point(dir.path(), AppKind::Node, None);
        assert_eq!(entry, EntryPoint::new("index.js", EntrySource::Default));
    }

    #[test]
    fn python_scans_for_main_guard() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "pkg/helpers.py", "def f():\n    pass\n");
        write(
            dir.path(),
            "pkg/service.py",
            "def main():\n    pass\n\nif __name__ == '__main__':\n    main()\n",
        );
        let entry = resolve_entry_point(dir.path(), AppKind::Python, None);
        assert_eq!(
            entry,
            EntryPoint::new(PathBuf::from("pkg").join("service.py"), EntrySource::ScriptMarker)
        );
    }

    #[test]
    fn python_scan_skips_virtualenvs() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            ".venv/lib/tool.py",
            "if __name__ == '__main__':\n    pass\n",
        );
        let entry = resolve_entry_point(dir.path(), AppKind::Python, None);
        assert_eq!(entry, EntryPoint::new("app.py", EntrySource::Default));
    }

    #[test]
    fn manage_py_is_detected_as_django() {
        assert!(EntryPoint::new("manage.py", EntrySource::Candidate).is_django_manage());
        assert!(!EntryPoint::new("app.py", EntrySource::Candidate).is_django_manage());
    }
}
