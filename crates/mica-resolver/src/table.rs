//! Module table: the output of graph construction
//!
//! One `ModuleRecord` exists per distinct module key. Local keys are
//! canonical absolute paths, library keys are flat names; the two kinds
//! carry different bookkeeping, so the record is a tagged union rather
//! than a struct with optional fields.

use mica_ast::{FileId, Program};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Key identifying one module: the canonical absolute path of a local
/// module, or the bare name of a library module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModuleKey {
    Local(String),
    Library(String),
}

impl ModuleKey {
    /// Reads back a canonical key string, as written into rewritten
    /// source literals: local keys always start with '/'.
    pub fn from_canonical(text: &str) -> Self {
        if text.starts_with('/') {
            ModuleKey::Local(text.to_string())
        } else {
            ModuleKey::Library(text.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ModuleKey::Local(path) => path,
            ModuleKey::Library(name) => name,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, ModuleKey::Local(_))
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A local module: its parsed tree plus dependency bookkeeping.
#[derive(Debug, Clone)]
pub struct LocalModule {
    /// Canonical absolute path.
    pub path: String,
    /// File id assigned at parse time; spans in `program` carry it.
    pub file_id: FileId,
    /// Original source text, kept for diagnostics.
    pub source: String,
    /// Parsed tree. Import/export source literals have been rewritten to
    /// canonical module keys.
    pub program: Program,
    /// Modules this module imports from, in first-reference order,
    /// deduplicated.
    pub dependencies: Vec<ModuleKey>,
    /// Number of modules that import this one. Written by the graph
    /// builder, read (via a snapshot) by the sorter.
    pub indegree: usize,
}

/// A library module: an opaque leaf with a fixed export set.
#[derive(Debug, Clone)]
pub struct LibraryModule {
    pub name: String,
    pub exports: BTreeSet<String>,
    /// Pre-compiled bundle text, passed through for the downstream
    /// evaluator; the resolver never inspects it.
    pub bundle: String,
}

/// One module record, local or library.
#[derive(Debug, Clone)]
pub enum ModuleRecord {
    Local(LocalModule),
    Library(LibraryModule),
}

/// All modules reachable from the entry, keyed by module key.
#[derive(Debug, Clone)]
pub struct ModuleTable {
    pub records: HashMap<ModuleKey, ModuleRecord>,
    pub entry: ModuleKey,
    /// File id to canonical path, in discovery order.
    pub file_paths: Vec<String>,
}

impl ModuleTable {
    pub fn get(&self, key: &ModuleKey) -> Option<&ModuleRecord> {
        self.records.get(key)
    }

    pub fn get_local(&self, key: &ModuleKey) -> Option<&LocalModule> {
        match self.records.get(key) {
            Some(ModuleRecord::Local(module)) => Some(module),
            _ => None,
        }
    }

    /// Number of local modules in the table.
    pub fn local_count(&self) -> usize {
        self.records
            .values()
            .filter(|r| matches!(r, ModuleRecord::Local(_)))
            .count()
    }

    /// Resolves a span's file id back to the path it was parsed from.
    pub fn path_of(&self, file_id: FileId) -> Option<&str> {
        self.file_paths.get(file_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
