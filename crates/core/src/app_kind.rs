//! Runtime family classification of a checked-out repository.

use std::fmt;
use std::path::Path;

/// Package manifest marking a Node.js application.
pub const NODE_MANIFEST: &str = "package.json";

/// Dependency files marking a Python application.
const PYTHON_MANIFESTS: [&str; 2] = ["requirements.txt", "setup.py"];

/// Framework entry files that also mark a Python application.
const PYTHON_FRAMEWORK_FILES: [&str; 2] = ["app.py", "manage.py"];

/// The two runtime families the runner knows how to launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppKind {
    Node,
    Python,
}

impl AppKind {
    /// Classify `repo` by the marker files at its root.
    ///
    /// A package manifest wins over every other marker. Without any marker
    /// the repository is treated as Python.
    pub fn detect(repo: &Path) -> Self {
        if repo.join(NODE_MANIFEST).is_file() {
            return Self::Node;
        }

        let has_python_marker = PYTHON_MANIFESTS
            .iter()
            .chain(PYTHON_FRAMEWORK_FILES.iter())
            .any(|name| repo.join(name).is_file());

        if !has_python_marker {
            tracing::debug!(repo = %repo.display(), "No runtime markers found, assuming python");
        }

        Self::Python
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Node => "nodejs",
            Self::Python => "python",
        }
    }
}

impl fmt::Display for AppKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
