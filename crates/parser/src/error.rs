use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Failed to load grammar: {0}")]
    Grammar(String),

    #[error("Parser produced no syntax tree")]
    NoTree,

    #[error("Syntax error at line {line}")]
    Syntax { line: usize },

    #[error("{kind} at line {line} has no name")]
    UnnamedDeclaration { kind: &'static str, line: usize },

    #[error("Cannot determine callee name of call at line {line}")]
    UnnamedCall { line: usize },

    #[error("Scope '{scope}' has no registered parent scope")]
    OrphanScope { scope: String },
}

impl ParseError {
    /// Faults in the extractor's own bookkeeping rather than in the analyzed source.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::OrphanScope { .. } | Self::Grammar(_))
    }
}
