//! Closed mapping from graph node kinds and relations onto store labels and
//! named edge collections.

use crate::error::{Result, StoreError};
use scaffold_graph::{NodeKind, RelationType};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Store-side label of a node kind
pub const fn node_label(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Folder => "FolderNode",
        NodeKind::File => "FileNode",
        NodeKind::Class => "ClassNode",
        NodeKind::Function => "FunctionNode",
    }
}

/// Named relationship collection of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeCollection {
    DefinesFolders,
    DefinesFiles,
    DefinesClasses,
    DefinesFunctions,
    UsesClasses,
    UsesFunctions,
    ImportsFiles,
    ImportsClasses,
    ImportsFunctions,
}

impl EdgeCollection {
    pub const ALL: [Self; 9] = [
        Self::DefinesFolders,
        Self::DefinesFiles,
        Self::DefinesClasses,
        Self::DefinesFunctions,
        Self::UsesClasses,
        Self::UsesFunctions,
        Self::ImportsFiles,
        Self::ImportsClasses,
        Self::ImportsFunctions,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DefinesFolders => "defines_folders",
            Self::DefinesFiles => "defines_files",
            Self::DefinesClasses => "defines_classes",
            Self::DefinesFunctions => "defines_functions",
            Self::UsesClasses => "uses_classes",
            Self::UsesFunctions => "uses_functions",
            Self::ImportsFiles => "imports_files",
            Self::ImportsClasses => "imports_classes",
            Self::ImportsFunctions => "imports_functions",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl std::fmt::Display for EdgeCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(parent kind, child kind, relation)`
pub type EdgeKey = (NodeKind, NodeKind, RelationType);

const STANDARD_ENTRIES: &[(EdgeKey, EdgeCollection)] = {
    use EdgeCollection as C;
    use NodeKind::{Class, File, Folder, Function};
    use RelationType::{Define, Import, Use};
    &[
        ((Folder, Folder, Define), C::DefinesFolders),
        ((Folder, File, Define), C::DefinesFiles),
        ((File, Class, Define), C::DefinesClasses),
        ((File, Function, Define), C::DefinesFunctions),
        ((Class, Class, Define), C::DefinesClasses),
        ((Class, Function, Define), C::DefinesFunctions),
        ((Function, Class, Define), C::DefinesClasses),
        ((Function, Function, Define), C::DefinesFunctions),
        ((File, Class, Use), C::UsesClasses),
        ((File, Function, Use), C::UsesFunctions),
        ((Class, Class, Use), C::UsesClasses),
        ((Class, Function, Use), C::UsesFunctions),
        ((Function, Class, Use), C::UsesClasses),
        ((Function, Function, Use), C::UsesFunctions),
        ((File, File, Import), C::ImportsFiles),
        ((File, Class, Import), C::ImportsClasses),
        ((File, Function, Import), C::ImportsFunctions),
    ]
};

/// Which `(parent, child, relation)` triples may be written, and where
#[derive(Debug, Clone)]
pub struct CompatibilityTable {
    entries: Vec<(EdgeKey, EdgeCollection)>,
    index: HashMap<EdgeKey, EdgeCollection>,
}

impl CompatibilityTable {
    /// The schema every graph this pipeline builds must fit
    #[must_use]
    pub fn standard() -> Self {
        Self::from_entries(STANDARD_ENTRIES.iter().copied())
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (EdgeKey, EdgeCollection)>) -> Self {
        let entries: Vec<_> = entries.into_iter().collect();
        let index = entries.iter().copied().collect();
        Self { entries, index }
    }

    #[must_use]
    pub fn lookup(&self, key: EdgeKey) -> Option<EdgeCollection> {
        self.index.get(&key).copied()
    }

    /// Collection for a triple, or the fatal schema violation naming it
    pub fn collection_for(
        &self,
        parent: NodeKind,
        child: NodeKind,
        relation: RelationType,
    ) -> Result<EdgeCollection> {
        self.lookup((parent, child, relation))
            .ok_or(StoreError::SchemaViolation {
                parent,
                child,
                relation,
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &(EdgeKey, EdgeCollection)> {
        self.entries.iter()
    }

    /// Startup check: no key listed twice, every node kind and relation type
    /// covered
    pub fn verify(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (key, _) in &self.entries {
            if !seen.insert(*key) {
                let (parent, child, relation) = key;
                return Err(StoreError::IncompleteSchema(format!(
                    "duplicate entry for {parent} -[{relation}]-> {child}"
                )));
            }
        }

        for kind in NodeKind::ALL {
            let covered = self
                .entries
                .iter()
                .any(|((parent, child, _), _)| *parent == kind || *child == kind);
            if !covered {
                return Err(StoreError::IncompleteSchema(format!(
                    "node kind {kind} never appears"
                )));
            }
        }

        for relation in RelationType::ALL {
            if !self.entries.iter().any(|((_, _, r), _)| *r == relation) {
                return Err(StoreError::IncompleteSchema(format!(
                    "relation {relation} never appears"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_verifies() {
        let table = CompatibilityTable::standard();
        assert!(table.verify().is_ok());
        assert_eq!(table.len(), 17);
    }

    #[test]
    fn known_triples_map_to_named_collections() {
        let table = CompatibilityTable::standard();
        let cases = [
            ((NodeKind::Folder, NodeKind::Folder, RelationType::Define), "defines_folders"),
            ((NodeKind::File, NodeKind::Class, RelationType::Define), "defines_classes"),
            ((NodeKind::File, NodeKind::Class, RelationType::Use), "uses_classes"),
            ((NodeKind::File, NodeKind::File, RelationType::Import), "imports_files"),
            ((NodeKind::Class, NodeKind::Function, RelationType::Define), "defines_functions"),
        ];
        for (key, name) in cases {
            assert_eq!(table.lookup(key).map(EdgeCollection::as_str), Some(name));
        }
    }

    #[test]
    fn missing_triple_is_a_schema_violation() {
        let table = CompatibilityTable::standard();
        let err = table
            .collection_for(NodeKind::Folder, NodeKind::Class, RelationType::Define)
            .unwrap_err();
        assert!(matches!(err, StoreError::SchemaViolation { .. }));
        assert_eq!(
            err.to_string(),
            "No edge collection for FOLDER -[DEFINE]-> CLASS"
        );
    }

    #[test]
    fn verify_flags_gaps_and_duplicates() {
        let no_imports = CompatibilityTable::from_entries(
            CompatibilityTable::standard()
                .entries()
                .copied()
                .filter(|((_, _, rel), _)| *rel != RelationType::Import),
        );
        assert!(matches!(
            no_imports.verify(),
            Err(StoreError::IncompleteSchema(_))
        ));

        let key = (NodeKind::Folder, NodeKind::File, RelationType::Define);
        let duplicated = CompatibilityTable::from_entries(
            CompatibilityTable::standard()
                .entries()
                .copied()
                .chain([(key, EdgeCollection::DefinesFiles)]),
        );
        assert!(matches!(
            duplicated.verify(),
            Err(StoreError::IncompleteSchema(_))
        ));
    }

    #[test]
    fn collection_names_round_trip() {
        for collection in EdgeCollection::ALL {
            assert_eq!(EdgeCollection::from_name(collection.as_str()), Some(collection));
        }
        assert_eq!(node_label(NodeKind::Class), "ClassNode");
    }
}
