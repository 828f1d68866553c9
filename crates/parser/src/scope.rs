//! Per-file scope table: dotted scope paths <-> small integer ids.

use crate::error::{ParseError, Result};
use std::collections::HashMap;

/// Local id of a scope inside one file
pub type ScopeId = usize;

/// The module itself; every file has it and it has no parent
pub const ROOT_SCOPE: ScopeId = 0;

/// Join scope segments into a dotted scope path
pub fn scope_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(".")
}

/// Bidirectional map between dotted scope paths and local ids.
///
/// Ids are handed out sequentially in first-seen order; the empty path is
/// always [`ROOT_SCOPE`].
#[derive(Debug, Clone)]
pub struct ScopeTable {
    scope_to_id: HashMap<String, ScopeId>,
    id_to_scope: Vec<String>,
}

impl Default for ScopeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTable {
    #[must_use]
    pub fn new() -> Self {
        let mut scope_to_id = HashMap::new();
        scope_to_id.insert(String::new(), ROOT_SCOPE);
        Self {
            scope_to_id,
            id_to_scope: vec![String::new()],
        }
    }

    /// Id for `segments`, registering the path if unseen
    pub fn intern<S: AsRef<str>>(&mut self, segments: &[S]) -> ScopeId {
        let path = scope_path(segments);
        if let Some(&id) = self.scope_to_id.get(&path) {
            return id;
        }
        let id = self.id_to_scope.len();
        self.id_to_scope.push(path.clone());
        self.scope_to_id.insert(path, id);
        id
    }

    #[must_use]
    pub fn id_of<S: AsRef<str>>(&self, segments: &[S]) -> Option<ScopeId> {
        self.scope_to_id.get(&scope_path(segments)).copied()
    }

    #[must_use]
    pub fn path_of(&self, id: ScopeId) -> Option<&str> {
        self.id_to_scope.get(id).map(String::as_str)
    }

    /// Id of the scope one level above `segments`.
    ///
    /// The parent must already be registered. A miss means the walker pushed
    /// a scope it never registered, which is a bug in the walker rather than in
    /// the analyzed source.
    pub fn parent_id<S: AsRef<str>>(&self, segments: &[S]) -> Result<ScopeId> {
        let Some((_, parent)) = segments.split_last() else {
            return Ok(ROOT_SCOPE);
        };
        self.id_of(parent).ok_or_else(|| ParseError::OrphanScope {
            scope: scope_path(segments),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.id_to_scope.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id_to_scope.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_scope_is_preregistered() {
        let table = ScopeTable::new();
        assert_eq!(table.id_of::<&str>(&[]), Some(ROOT_SCOPE));
        assert_eq!(table.path_of(ROOT_SCOPE), Some(""));
        assert!(table.is_empty());
    }

    #[test]
    fn intern_is_stable_and_bidirectional() {
        let mut table = ScopeTable::new();
        let a = table.intern(&["A"]);
        let method = table.intern(&["A", "method"]);
        let b = table.intern(&["B"]);

        assert_eq!(table.intern(&["A", "method"]), method);
        assert_eq!((a, method, b), (1, 2, 3));
        assert_eq!(table.path_of(method), Some("A.method"));
        assert_eq!(table.path_of(a), Some("A"));
    }

    #[test]
    fn parent_lookup_requires_registered_parent() {
        let mut table = ScopeTable::new();
        let a = table.intern(&["A"]);

        assert_eq!(table.parent_id(&["A"]).unwrap(), ROOT_SCOPE);
        assert_eq!(table.parent_id(&["A", "m"]).unwrap(), a);

        let err = table.parent_id(&["B", "m"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::OrphanScope {
                scope: "B.m".to_string()
            }
        );
        assert!(err.is_internal());
    }
}
