//! Graph Builder: transitive module discovery
//!
//! Starting from the entry path, parses every transitively imported
//! local file and fetches export sets for every imported library module.
//! All dependencies of one module are dispatched together and awaited as
//! a group, so unrelated branches of the graph make progress
//! concurrently.
//!
//! Claiming a module key is atomic with respect to concurrent
//! discoverers: the first branch to reach a key installs a completion
//! channel under the state mutex and becomes its owner; later branches
//! wait on that channel instead of re-parsing. A module's record is
//! published (and its claim released) *before* its dependencies are
//! dispatched, so dependency cycles flow through to the sorter instead
//! of deadlocking the builder.

use crate::error::{LinkError, SourceLoc, SyntaxError};
use crate::paths;
use crate::registry::LibraryRegistry;
use crate::table::{LibraryModule, LocalModule, ModuleKey, ModuleRecord, ModuleTable};
use futures::future::try_join_all;
use mica_ast::{FileId, ModuleItem, Program};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::{watch, Mutex};

/// Builds the module table for `entry` over the given virtual file
/// table. `parse` turns one file's text into a syntax tree; `registry`
/// answers library module lookups.
pub async fn build<P, R>(
    files: &HashMap<String, String>,
    entry: &str,
    parse: P,
    registry: &R,
) -> Result<ModuleTable, LinkError>
where
    P: Fn(&str, FileId) -> Result<Program, SyntaxError>,
    R: LibraryRegistry,
{
    paths::check_specifier(entry).map_err(|reason| LinkError::InvalidPath {
        specifier: entry.to_string(),
        reason,
        importer: None,
    })?;
    let entry_path = paths::normalize(entry).map_err(|reason| LinkError::InvalidPath {
        specifier: entry.to_string(),
        reason,
        importer: None,
    })?;
    let entry_key = ModuleKey::Local(entry_path);

    let builder = Builder {
        files,
        parse,
        registry,
        state: Mutex::new(State::default()),
    };
    builder.visit(entry_key.clone(), None).await?;

    let state = builder.state.into_inner();
    Ok(ModuleTable {
        records: state.records,
        entry: entry_key,
        file_paths: state.file_paths,
    })
}

#[derive(Default)]
struct State {
    records: HashMap<ModuleKey, ModuleRecord>,
    /// One completion channel per module key currently being processed.
    claims: HashMap<ModuleKey, watch::Receiver<bool>>,
    file_paths: Vec<String>,
}

/// Outcome of the claim step for one module key.
enum Claim {
    /// Record already exists; nothing to do.
    Done,
    /// This branch owns processing; it must complete the channel.
    Owner(watch::Sender<bool>),
    /// Another branch owns processing; wait for it.
    Waiter(watch::Receiver<bool>),
}

struct Builder<'a, P, R> {
    files: &'a HashMap<String, String>,
    parse: P,
    registry: &'a R,
    state: Mutex<State>,
}

impl<'a, P, R> Builder<'a, P, R>
where
    P: Fn(&str, FileId) -> Result<Program, SyntaxError>,
    R: LibraryRegistry,
{
    fn visit(
        &self,
        key: ModuleKey,
        origin: Option<SourceLoc>,
    ) -> Pin<Box<dyn Future<Output = Result<(), LinkError>> + '_>> {
        Box::pin(async move {
            let claim = {
                let mut state = self.state.lock().await;
                if state.records.contains_key(&key) {
                    Claim::Done
                } else if let Some(rx) = state.claims.get(&key) {
                    Claim::Waiter(rx.clone())
                } else {
                    let (tx, rx) = watch::channel(false);
                    state.claims.insert(key.clone(), rx);
                    Claim::Owner(tx)
                }
            };

            let tx = match claim {
                Claim::Done => return Ok(()),
                Claim::Waiter(mut rx) => {
                    // A closed channel means the owner finished (or failed,
                    // in which case its branch carries the error).
                    let _ = rx.wait_for(|done| *done).await;
                    return Ok(());
                }
                Claim::Owner(tx) => tx,
            };

            let outcome = self.process(&key, origin).await;

            {
                let mut state = self.state.lock().await;
                state.claims.remove(&key);
            }
            let _ = tx.send(true);

            let dependencies = outcome?;

            // Fan out: all edges of this module explored as a group.
            try_join_all(
                dependencies
                    .iter()
                    .map(|(dep, loc)| self.visit(dep.clone(), Some(loc.clone()))),
            )
            .await?;

            // Count each edge exactly once, after the dependency's own
            // parse has completed. Library modules carry no indegree.
            let mut state = self.state.lock().await;
            for (dep, _) in &dependencies {
                if let Some(ModuleRecord::Local(module)) = state.records.get_mut(dep) {
                    module.indegree += 1;
                }
            }
            Ok(())
        })
    }

    /// Parses (or fetches) one module and publishes its record. Returns
    /// the module's outgoing edges; library modules are leaves.
    async fn process(
        &self,
        key: &ModuleKey,
        origin: Option<SourceLoc>,
    ) -> Result<Vec<(ModuleKey, SourceLoc)>, LinkError> {
        match key {
            ModuleKey::Library(name) => {
                let bundle = self.registry.lookup(name).await.ok_or_else(|| {
                    LinkError::LibraryNotFound {
                        name: name.clone(),
                        importer: origin,
                    }
                })?;

                let mut state = self.state.lock().await;
                state.records.insert(
                    key.clone(),
                    ModuleRecord::Library(LibraryModule {
                        name: name.clone(),
                        exports: bundle.exports,
                        bundle: bundle.bundle,
                    }),
                );
                Ok(Vec::new())
            }

            ModuleKey::Local(path) => {
                let source =
                    self.files
                        .get(path)
                        .ok_or_else(|| LinkError::ModuleNotFound {
                            specifier: path.clone(),
                            importer: origin,
                        })?;

                let file_id = {
                    let mut state = self.state.lock().await;
                    state.file_paths.push(path.clone());
                    state.file_paths.len() - 1
                };

                let mut program =
                    (self.parse)(source, file_id).map_err(|error| LinkError::Syntax {
                        path: path.clone(),
                        error,
                    })?;

                let dependencies = resolve_sources(&mut program, key, path)?;

                let mut state = self.state.lock().await;
                state.records.insert(
                    key.clone(),
                    ModuleRecord::Local(LocalModule {
                        path: path.clone(),
                        file_id,
                        source: source.clone(),
                        program,
                        dependencies: dependencies.iter().map(|(k, _)| k.clone()).collect(),
                        indegree: 0,
                    }),
                );
                Ok(dependencies)
            }
        }
    }
}

/// Resolves every import/re-export source in `program` to a canonical
/// module key, rewriting the literal in place so later phases never
/// re-resolve paths. Returns the deduplicated edge list in
/// first-reference order.
fn resolve_sources(
    program: &mut Program,
    self_key: &ModuleKey,
    path: &str,
) -> Result<Vec<(ModuleKey, SourceLoc)>, LinkError> {
    let mut dependencies: Vec<(ModuleKey, SourceLoc)> = Vec::new();

    for item in &mut program.items {
        let source = match &mut item.value {
            ModuleItem::Import(import) => &mut import.source,
            ModuleItem::Export(export) => match export.source_mut() {
                Some(source) => source,
                None => continue,
            },
            ModuleItem::Stmt(_) => continue,
        };

        let specifier = source.value.clone();
        let loc = SourceLoc::new(path, source.span);

        let dep_key = if paths::is_local(&specifier) {
            paths::check_specifier(&specifier).map_err(|reason| LinkError::InvalidPath {
                specifier: specifier.clone(),
                reason,
                importer: Some(loc.clone()),
            })?;
            let resolved =
                paths::resolve(&specifier, path).map_err(|reason| LinkError::InvalidPath {
                    specifier: specifier.clone(),
                    reason,
                    importer: Some(loc.clone()),
                })?;
            ModuleKey::Local(resolved)
        } else {
            paths::check_library_name(&specifier).map_err(|reason| {
                LinkError::InvalidPath {
                    specifier: specifier.clone(),
                    reason,
                    importer: Some(loc.clone()),
                }
            })?;
            ModuleKey::Library(specifier.clone())
        };

        if dep_key == *self_key {
            return Err(LinkError::SelfImport {
                path: path.to_string(),
                loc,
            });
        }

        source.value = dep_key.to_string();

        if !dependencies.iter().any(|(k, _)| k == &dep_key) {
            dependencies.push((dep_key, loc));
        }
    }

    Ok(dependencies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StaticRegistry;
    use crate::test_support::{file_table, parse_file};

    async fn build_table(
        files: &[(&str, &str)],
        entry: &str,
    ) -> Result<ModuleTable, LinkError> {
        let registry = {
            let mut r = StaticRegistry::new();
            r.add("strings", ["upper", "lower"], "");
            r
        };
        build(&file_table(files), entry, parse_file, &registry).await
    }

    #[tokio::test]
    async fn test_single_module() {
        let table = build_table(&[("/a.mica", "const x = 1;")], "/a.mica")
            .await
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.entry, ModuleKey::Local("/a.mica".to_string()));
    }

    #[tokio::test]
    async fn test_transitive_discovery_and_rewrite() {
        let table = build_table(
            &[
                ("/a.mica", "import { b } from \"./b.mica\";"),
                ("/b.mica", "import { c } from \"./sub/c.mica\";\nexport const b = 1;"),
                ("/sub/c.mica", "export const c = 2;"),
            ],
            "/a.mica",
        )
        .await
        .unwrap();

        assert_eq!(table.len(), 3);

        // Source literals are canonicalized in place.
        let a = table
            .get_local(&ModuleKey::Local("/a.mica".to_string()))
            .unwrap();
        match &a.program.items[0].value {
            ModuleItem::Import(import) => assert_eq!(import.source.value, "/b.mica"),
            other => panic!("Expected import, got {:?}", other),
        }

        // Every file id assigned during discovery maps back to its path.
        for key in ["/a.mica", "/b.mica", "/sub/c.mica"] {
            let module = table.get_local(&ModuleKey::Local(key.to_string())).unwrap();
            assert_eq!(table.path_of(module.file_id), Some(key));
        }
    }

    #[tokio::test]
    async fn test_same_file_two_spellings_one_record() {
        let table = build_table(
            &[
                (
                    "/main.mica",
                    "import { u } from \"./lib/util.mica\";\nimport { o } from \"./lib/other.mica\";",
                ),
                ("/lib/util.mica", "export const u = 1;"),
                (
                    "/lib/other.mica",
                    "import { u } from \"../lib/util.mica\";\nexport const o = u;",
                ),
            ],
            "/main.mica",
        )
        .await
        .unwrap();

        assert_eq!(table.len(), 3);
        let util = table
            .get_local(&ModuleKey::Local("/lib/util.mica".to_string()))
            .unwrap();
        assert_eq!(util.indegree, 2);
    }

    #[tokio::test]
    async fn test_missing_module() {
        let err = build_table(&[("/a.mica", "import { b } from \"./b.mica\";")], "/a.mica")
            .await
            .unwrap_err();
        match err {
            LinkError::ModuleNotFound { specifier, importer } => {
                assert_eq!(specifier, "/b.mica");
                assert_eq!(importer.unwrap().path, "/a.mica");
            }
            other => panic!("Expected ModuleNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_library() {
        let err = build_table(&[("/a.mica", "import { x } from \"nope\";")], "/a.mica")
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::LibraryNotFound { ref name, .. } if name == "nope"));
    }

    #[tokio::test]
    async fn test_known_library_is_leaf() {
        let table = build_table(
            &[("/a.mica", "import { upper } from \"strings\";")],
            "/a.mica",
        )
        .await
        .unwrap();

        match table.get(&ModuleKey::Library("strings".to_string())) {
            Some(ModuleRecord::Library(lib)) => {
                assert!(lib.exports.contains("upper"));
            }
            other => panic!("Expected library record, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_self_import_rejected() {
        let err = build_table(&[("/a.mica", "import { a } from \"./a.mica\";")], "/a.mica")
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::SelfImport { ref path, .. } if path == "/a.mica"));
    }

    #[tokio::test]
    async fn test_cycle_does_not_deadlock_builder() {
        let table = build_table(
            &[
                ("/a.mica", "import { b } from \"./b.mica\";\nexport const a = 1;"),
                ("/b.mica", "import { a } from \"./a.mica\";\nexport const b = 2;"),
            ],
            "/a.mica",
        )
        .await
        .unwrap();

        // The builder records the cycle; the sorter reports it.
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_path_characters() {
        let err = build_table(&[("/a.mica", "import { b } from \"./b!.mica\";")], "/a.mica")
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::InvalidPath { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_imports_one_edge() {
        let table = build_table(
            &[
                (
                    "/a.mica",
                    "import { x } from \"./b.mica\";\nimport { y } from \"./b.mica\";",
                ),
                ("/b.mica", "export const x = 1;\nexport const y = 2;"),
            ],
            "/a.mica",
        )
        .await
        .unwrap();

        let a = table
            .get_local(&ModuleKey::Local("/a.mica".to_string()))
            .unwrap();
        assert_eq!(a.dependencies.len(), 1);
        let b = table
            .get_local(&ModuleKey::Local("/b.mica".to_string()))
            .unwrap();
        assert_eq!(b.indegree, 1);
    }
}
