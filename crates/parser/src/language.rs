use crate::error::{ParseError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Source language analyzed during one indexing run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    Python,
}

impl SourceLanguage {
    /// Resolve a configured language name
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "python" | "py" => Ok(Self::Python),
            other => Err(ParseError::UnsupportedLanguage(other.to_string())),
        }
    }

    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "py" => Some(Self::Python),
            _ => None,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Python => "python",
        }
    }

    /// Extension of source files, without the dot
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Python => "py",
        }
    }

    /// File that turns a directory into an importable package
    pub const fn package_init_file(self) -> &'static str {
        match self {
            Self::Python => "__init__.py",
        }
    }

    /// Whether `path` is a source file of this language
    pub fn matches_path(self, path: impl AsRef<Path>) -> bool {
        Self::from_path(path) == Some(self)
    }

    /// Candidate file paths for a dotted module reference.
    ///
    /// `a.b.c` maps to `a/b/c.py` and `a/b/c/__init__.py`, in that order.
    pub fn module_candidates(self, module: &str) -> [String; 2] {
        let base = module.trim().replace('.', "/");
        [
            format!("{base}.{}", self.extension()),
            format!("{base}/{}", self.package_init_file()),
        ]
    }

    /// Get Tree-sitter language instance
    pub fn tree_sitter_language(self) -> tree_sitter::Language {
        match self {
            Self::Python => tree_sitter_python::LANGUAGE.into(),
        }
    }
}

impl std::fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::SourceLanguage;

    #[test]
    fn test_from_name() {
        assert_eq!(
            SourceLanguage::from_name("python").unwrap(),
            SourceLanguage::Python
        );
        assert_eq!(
            SourceLanguage::from_name(" Python ").unwrap(),
            SourceLanguage::Python
        );
        assert!(SourceLanguage::from_name("cobol").is_err());
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            SourceLanguage::from_path("src/main.py"),
            Some(SourceLanguage::Python)
        );
        assert_eq!(SourceLanguage::from_path("lib.rs"), None);
        assert_eq!(SourceLanguage::from_path("no_extension"), None);
        assert!(SourceLanguage::Python.matches_path("pkg/MOD.PY"));
    }

    #[test]
    fn test_module_candidates() {
        let [module, package] = SourceLanguage::Python.module_candidates("a.b.c");
        assert_eq!(module, "a/b/c.py");
        assert_eq!(package, "a/b/c/__init__.py");
    }

    #[test]
    fn test_tree_sitter_language_loads() {
        let mut parser = tree_sitter::Parser::new();
        assert!(parser
            .set_language(&SourceLanguage::Python.tree_sitter_language())
            .is_ok());
    }
}
