//! Local (scope-id keyed) graph produced by extracting one file

use crate::error::Result;
use crate::scope::{ScopeId, ScopeTable, ROOT_SCOPE};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

/// Kind of a declaration found inside a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Class,
    Function,
}

impl ElementKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Function => "function",
        }
    }
}

/// Relation between two scopes of the same file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalRelationKind {
    Define,
    Use,
}

/// A declaration or call target, with 1-based inclusive line range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeElement {
    pub name: String,
    pub kind: ElementKind,
    pub start_line: usize,
    pub end_line: usize,
    pub docstring: Option<String>,
}

/// Edge owned by `parent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalRelation {
    pub kind: LocalRelationKind,
    pub parent: ScopeId,
    pub child: ScopeId,
}

/// Everything extracted from one file
#[derive(Debug, Clone)]
pub struct FileGraph {
    path: String,
    line_count: usize,
    docstring: Option<String>,
    scopes: ScopeTable,
    elements: BTreeMap<ScopeId, CodeElement>,
    placeholders: BTreeSet<ScopeId>,
    relations: BTreeMap<ScopeId, Vec<LocalRelation>>,
}

impl FileGraph {
    pub fn new(path: impl Into<String>, line_count: usize) -> Self {
        Self {
            path: path.into(),
            line_count,
            docstring: None,
            scopes: ScopeTable::new(),
            elements: BTreeMap::new(),
            placeholders: BTreeSet::new(),
            relations: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn docstring(&self) -> Option<&str> {
        self.docstring.as_deref()
    }

    pub fn set_docstring(&mut self, docstring: Option<String>) {
        self.docstring = docstring;
    }

    pub fn scopes(&self) -> &ScopeTable {
        &self.scopes
    }

    /// Register a declaration at `scope` (its full path, own name last).
    ///
    /// A DEFINE edge is added from the scope one level up. A placeholder left
    /// at the same path by an earlier call is replaced, keeping its id so USE
    /// edges already pointing at it now reach the declaration. Re-declaring
    /// the same path (e.g. a redefinition) keeps the first declaration.
    pub fn declare<S: AsRef<str>>(&mut self, scope: &[S], element: CodeElement) -> Result<ScopeId> {
        let parent = self.scopes.parent_id(scope)?;
        let id = self.scopes.intern(scope);
        if self.is_placeholder(id) {
            self.placeholders.remove(&id);
            self.elements.insert(id, element);
        } else {
            self.elements.entry(id).or_insert(element);
        }
        self.relate(LocalRelationKind::Define, parent, id);
        Ok(id)
    }

    /// Register a call target that matched nothing visible
    pub fn add_placeholder<S: AsRef<str>>(&mut self, scope: &[S], element: CodeElement) -> ScopeId {
        let id = self.scopes.intern(scope);
        if let Entry::Vacant(slot) = self.elements.entry(id) {
            slot.insert(element);
            self.placeholders.insert(id);
        }
        id
    }

    /// Whether `id` is still a call-site placeholder with no declaration
    pub fn is_placeholder(&self, id: ScopeId) -> bool {
        self.placeholders.contains(&id)
    }

    /// USE edge from the calling scope to the call target
    pub fn add_use(&mut self, caller: ScopeId, target: ScopeId) {
        self.relate(LocalRelationKind::Use, caller, target);
    }

    /// Find `name` by searching `frames`, innermost scope first.
    ///
    /// Tries `frames[..k] + [name]` for `k` from `frames.len()` down to 0 and
    /// returns the first registered element.
    pub fn find_visible<S: AsRef<str>>(&self, frames: &[S], name: &str) -> Option<ScopeId> {
        let mut candidate: Vec<&str> = frames.iter().map(AsRef::as_ref).collect();
        loop {
            candidate.push(name);
            if let Some(id) = self.scopes.id_of(&candidate) {
                if self.elements.contains_key(&id) {
                    return Some(id);
                }
            }
            candidate.pop();
            if candidate.pop().is_none() {
                return None;
            }
        }
    }

    pub fn element(&self, id: ScopeId) -> Option<&CodeElement> {
        self.elements.get(&id)
    }

    /// Elements in registration order
    pub fn elements(&self) -> impl Iterator<Item = (ScopeId, &CodeElement)> {
        self.elements.iter().map(|(id, element)| (*id, element))
    }

    /// Relations grouped by owning parent, parents in id order
    pub fn relations(&self) -> impl Iterator<Item = &LocalRelation> {
        self.relations.values().flatten()
    }

    pub fn relations_of(&self, parent: ScopeId) -> &[LocalRelation] {
        self.relations.get(&parent).map_or(&[], Vec::as_slice)
    }

    /// Direct DEFINE children of the module scope
    pub fn top_level(&self) -> impl Iterator<Item = (ScopeId, &CodeElement)> {
        self.relations_of(ROOT_SCOPE)
            .iter()
            .filter(|rel| rel.kind == LocalRelationKind::Define)
            .filter_map(|rel| self.elements.get(&rel.child).map(|e| (rel.child, e)))
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    fn relate(&mut self, kind: LocalRelationKind, parent: ScopeId, child: ScopeId) {
        let relation = LocalRelation {
            kind,
            parent,
            child,
        };
        let owned = self.relations.entry(parent).or_default();
        if !owned.contains(&relation) {
            owned.push(relation);
        }
    }
}
