use crate::ignore_rules::IgnoreMatcher;
use scaffold_parser::SourceLanguage;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Enumerates the source files of one indexing run.
///
/// The state directory and everything the [`IgnoreMatcher`] flags are
/// pruned; ignored directories are not descended into.
pub struct FileScanner {
    root: PathBuf,
    language: SourceLanguage,
    state_dir: PathBuf,
    matcher: IgnoreMatcher,
}

impl FileScanner {
    pub fn new(
        root: impl AsRef<Path>,
        language: SourceLanguage,
        state_dir: &str,
        ignore_file: &str,
    ) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            state_dir: root.join(state_dir),
            matcher: IgnoreMatcher::new(&root, ignore_file),
            root,
            language,
        }
    }

    /// Source files under the root, sorted by path
    pub fn scan(&self) -> Vec<PathBuf> {
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| self.keep(entry));

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.language.matches_path(entry.path()) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => log::warn!("Skipping unreadable entry: {e}"),
            }
        }

        log::debug!(
            "Scanned {} {} files under {}",
            files.len(),
            self.language,
            self.root.display()
        );
        files
    }

    fn keep(&self, entry: &DirEntry) -> bool {
        let path = entry.path();
        if entry.depth() == 0 {
            return true;
        }
        if path.starts_with(&self.state_dir) {
            return false;
        }
        !self
            .matcher
            .is_ignored_with_hint(path, Some(entry.file_type().is_dir()))
    }
}
