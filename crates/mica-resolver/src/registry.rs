//! Library module registry
//!
//! Library modules are resolved by name against an external registry of
//! pre-compiled bundles. The lookup is asynchronous: real registries sit
//! behind a filesystem or network fetch.

use std::collections::{BTreeSet, HashMap};

/// What the registry knows about one library module: the names it
/// exports plus its opaque bundle text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LibraryBundle {
    pub exports: BTreeSet<String>,
    pub bundle: String,
}

/// Source of library module metadata. `None` means the name is unknown.
///
/// The graph builder drives all lookups from a single task, so the
/// returned futures do not need to be `Send`.
#[allow(async_fn_in_trait)]
pub trait LibraryRegistry {
    async fn lookup(&self, name: &str) -> Option<LibraryBundle>;
}

/// In-memory registry, used by tests and by drivers that preload their
/// registry directory.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    libraries: HashMap<String, LibraryBundle>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a library with the given export names.
    pub fn add<'a>(
        &mut self,
        name: &str,
        exports: impl IntoIterator<Item = &'a str>,
        bundle: &str,
    ) {
        self.libraries.insert(
            name.to_string(),
            LibraryBundle {
                exports: exports.into_iter().map(str::to_string).collect(),
                bundle: bundle.to_string(),
            },
        );
    }
}

impl LibraryRegistry for StaticRegistry {
    async fn lookup(&self, name: &str) -> Option<LibraryBundle> {
        self.libraries.get(name).cloned()
    }
}
