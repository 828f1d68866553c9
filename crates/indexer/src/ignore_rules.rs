use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::Match;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Decides whether a path under the project root is excluded from indexing.
///
/// For a candidate path, every ignore-rule file between the project root and
/// the path's containing directory contributes its lines, root first. The
/// combined set is evaluated with gitignore semantics, anchored at the root.
///
/// Rule sets are cached per directory; call [`invalidate`](Self::invalidate)
/// after an ignore-rule file changes.
#[derive(Debug)]
pub struct IgnoreMatcher {
    root: PathBuf,
    file_name: String,
    cache: Mutex<HashMap<PathBuf, Arc<Gitignore>>>,
}

impl IgnoreMatcher {
    pub fn new(root: impl AsRef<Path>, file_name: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            file_name: file_name.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Whether `path` (absolute or root-relative) is ignored.
    ///
    /// Paths outside the root and the root itself are never ignored.
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.is_ignored_with_hint(path, None)
    }

    pub fn is_ignored_with_hint(&self, path: &Path, is_dir_hint: Option<bool>) -> bool {
        let abs = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        if abs == self.root || !abs.starts_with(&self.root) {
            return false;
        }
        let Some(dir) = abs.parent() else {
            return false;
        };
        let is_dir = is_dir_hint.unwrap_or_else(|| abs.is_dir());
        let rules = self.rules_for(dir);
        matches!(
            rules.matched_path_or_any_parents(&abs, is_dir),
            Match::Ignore(_)
        )
    }

    /// Whether `path` is one of the ignore-rule files themselves
    pub fn is_rule_file(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name == self.file_name)
    }

    /// Drop every cached rule set
    pub fn invalidate(&self) {
        self.lock_cache().clear();
    }

    fn rules_for(&self, dir: &Path) -> Arc<Gitignore> {
        if let Some(rules) = self.lock_cache().get(dir) {
            return Arc::clone(rules);
        }
        let rules = Arc::new(self.build_rules(dir));
        self.lock_cache()
            .insert(dir.to_path_buf(), Arc::clone(&rules));
        rules
    }

    fn build_rules(&self, dir: &Path) -> Gitignore {
        let mut builder = GitignoreBuilder::new(&self.root);
        for rule_file in self.rule_files(dir) {
            let Ok(content) = std::fs::read_to_string(&rule_file) else {
                continue;
            };
            for line in content.lines().map(str::trim) {
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Err(e) = builder.add_line(Some(rule_file.clone()), line) {
                    log::warn!("{}: skipping pattern '{line}': {e}", rule_file.display());
                }
            }
        }
        builder.build().unwrap_or_else(|e| {
            log::warn!("Failed to build ignore rules for {}: {e}", dir.display());
            Gitignore::empty()
        })
    }

    /// Existing rule files from the root down to `dir`
    fn rule_files(&self, dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = dir
            .ancestors()
            .take_while(|ancestor| ancestor.starts_with(&self.root))
            .map(|ancestor| ancestor.join(&self.file_name))
            .filter(|candidate| candidate.is_file())
            .collect();
        files.reverse();
        files
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<Gitignore>>> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
