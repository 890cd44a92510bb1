//! Export set computation and binding validation.
//!
//! Walks modules in initialization order so every re-export source has
//! its export set computed before its dependents need it. Duplicate
//! export names are always an error; import-side binding checks run
//! only in strict mode.

use crate::error::LinkError;
use crate::table::{ModuleKey, ModuleRecord, ModuleTable};
use mica_ast::{ExportDecl, ImportSpecifier, ModuleItem, Span};
use std::collections::{BTreeSet, HashMap};

/// A module table whose export sets are known and whose bindings have
/// been checked.
#[derive(Debug)]
pub struct ResolvedModuleTable {
    pub table: ModuleTable,
    pub exports: HashMap<ModuleKey, BTreeSet<String>>,
}

impl ResolvedModuleTable {
    pub fn exports_of(&self, key: &ModuleKey) -> Option<&BTreeSet<String>> {
        self.exports.get(key)
    }
}

/// Computes every module's export set, rejects duplicate export names,
/// and (in strict mode) checks every import against the exporting
/// module's set. Errors are accumulated so a driver can report them all
/// at once.
pub fn validate(
    table: ModuleTable,
    order: &[ModuleKey],
    strict: bool,
) -> Result<ResolvedModuleTable, Vec<LinkError>> {
    let mut errors: Vec<LinkError> = Vec::new();
    let mut exports: HashMap<ModuleKey, BTreeSet<String>> = HashMap::new();

    for key in order {
        match table.records.get(key) {
            Some(ModuleRecord::Library(lib)) => {
                exports.insert(key.clone(), lib.exports.clone());
            }
            Some(ModuleRecord::Local(module)) => {
                let set = collect_exports(key, &module.program, &exports, &mut errors);
                exports.insert(key.clone(), set);
            }
            None => continue,
        }
    }

    if strict {
        for key in order {
            if let Some(ModuleRecord::Local(module)) = table.records.get(key) {
                check_bindings(key, &module.program, &exports, &mut errors);
            }
        }
    }

    if errors.is_empty() {
        Ok(ResolvedModuleTable { table, exports })
    } else {
        Err(errors)
    }
}

/// One module's contributed export names, with the span of each
/// contributing declaration so duplicates can cite both sites.
fn collect_exports(
    key: &ModuleKey,
    program: &mica_ast::Program,
    exports: &HashMap<ModuleKey, BTreeSet<String>>,
    errors: &mut Vec<LinkError>,
) -> BTreeSet<String> {
    let mut contributions: Vec<(String, Span)> = Vec::new();

    for item in &program.items {
        let export = match &item.value {
            ModuleItem::Export(export) => export,
            _ => continue,
        };
        match export {
            ExportDecl::Decl(stmt) => {
                if let Some(name) = stmt.value.declared_name() {
                    contributions.push((name.name.clone(), stmt.span));
                }
            }
            ExportDecl::Named { specifiers, .. } => {
                for spec in specifiers {
                    contributions.push((spec.exported_name().name.clone(), spec.local.span));
                }
            }
            ExportDecl::Default(expr) => {
                contributions.push(("default".to_string(), expr.span));
            }
            ExportDecl::DefaultDecl(stmt) => {
                contributions.push(("default".to_string(), stmt.span));
            }
            ExportDecl::All { source, as_name } => match as_name {
                Some(ns) => contributions.push((ns.value.name.clone(), ns.span)),
                None => {
                    // Star re-exports never forward the default binding.
                    let source_key = ModuleKey::from_canonical(&source.value);
                    if let Some(set) = exports.get(&source_key) {
                        for name in set {
                            if name != "default" {
                                contributions.push((name.clone(), source.span));
                            }
                        }
                    }
                }
            },
        }
    }

    let mut set: BTreeSet<String> = BTreeSet::new();
    let mut reported: BTreeSet<&str> = BTreeSet::new();
    for (name, _) in &contributions {
        if !set.insert(name.clone()) && reported.insert(name) {
            let spans: Vec<Span> = contributions
                .iter()
                .filter(|(n, _)| n == name)
                .map(|(_, span)| *span)
                .collect();
            errors.push(LinkError::DuplicateExport {
                module: key.clone(),
                name: name.clone(),
                spans,
            });
        }
    }
    set
}

/// Strict-mode import checks: every named import must name an export of
/// its source, default imports need a default export, and namespace
/// imports need a non-empty set.
fn check_bindings(
    key: &ModuleKey,
    program: &mica_ast::Program,
    exports: &HashMap<ModuleKey, BTreeSet<String>>,
    errors: &mut Vec<LinkError>,
) {
    for item in &program.items {
        match &item.value {
            ModuleItem::Import(import) => {
                let target = ModuleKey::from_canonical(&import.source.value);
                let set = match exports.get(&target) {
                    Some(set) => set,
                    None => continue,
                };
                for spec in &import.specifiers {
                    match spec {
                        ImportSpecifier::Named { imported, .. } => {
                            if !set.contains(&imported.value.name) {
                                errors.push(LinkError::UndefinedImport {
                                    module: key.clone(),
                                    target: target.clone(),
                                    name: imported.value.name.clone(),
                                    span: imported.span,
                                });
                            }
                        }
                        ImportSpecifier::Default(name) => {
                            if !set.contains("default") {
                                errors.push(LinkError::UndefinedDefaultImport {
                                    module: key.clone(),
                                    target: target.clone(),
                                    span: name.span,
                                });
                            }
                        }
                        ImportSpecifier::Namespace(name) => {
                            if set.is_empty() {
                                errors.push(LinkError::UndefinedNamespaceImport {
                                    module: key.clone(),
                                    target: target.clone(),
                                    span: name.span,
                                });
                            }
                        }
                    }
                }
            }
            ModuleItem::Export(ExportDecl::Named {
                specifiers,
                source: Some(source),
            }) => {
                let target = ModuleKey::from_canonical(&source.value);
                let set = match exports.get(&target) {
                    Some(set) => set,
                    None => continue,
                };
                for spec in specifiers {
                    if !set.contains(&spec.local.value.name) {
                        errors.push(LinkError::UndefinedImport {
                            module: key.clone(),
                            target: target.clone(),
                            name: spec.local.value.name.clone(),
                            span: spec.local.span,
                        });
                    }
                }
            }
            _ => {}
        }
    }
}
