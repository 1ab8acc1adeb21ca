//! File store entries.

use super::project::Scope;

/// An entry in the platform's file store.
///
/// Folder markers are listed alongside files; the only way to tell them
/// apart is that a file's path carries an extension.
///
/// # Examples
///
/// ```
/// use i2r_core::{FileStoreEntry, Scope};
///
/// let file = FileStoreEntry::new(Scope::Account, "values", "values.yaml", "/charts/values.yaml");
/// assert!(file.is_file());
/// let folder = FileStoreEntry::new(Scope::Account, "charts", "charts", "/charts");
/// assert!(!folder.is_file());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileStoreEntry {
    /// Where the entry lives.
    pub scope: Scope,
    /// Entry identifier, used to download it.
    pub identifier: String,
    /// Display name.
    pub name: String,
    /// Path relative to the scope root, usually with a leading `/`.
    pub path: String,
}

impl FileStoreEntry {
    /// Creates a new entry.
    #[must_use]
    pub fn new(
        scope: Scope,
        identifier: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            scope,
            identifier: identifier.into(),
            name: name.into(),
            path: path.into(),
        }
    }

    /// Returns `true` if this entry is a file rather than a folder marker.
    #[inline]
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.path.contains('.')
    }

    /// Returns the path with any leading separators removed.
    #[must_use]
    pub fn relative_path(&self) -> &str {
        self.path.trim_start_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_strips_leading_slash() {
        let entry = FileStoreEntry::new(Scope::Account, "f", "f.txt", "//dir/f.txt");
        assert_eq!(entry.relative_path(), "dir/f.txt");
    }

    #[test]
    fn test_dot_anywhere_counts_as_file() {
        let entry = FileStoreEntry::new(Scope::Account, "v", "v1.2", "/releases/v1.2/notes");
        assert!(entry.is_file());
    }
}
