//! Module Linker: collapses a resolved module graph into one program.
//!
//! Each local module becomes a unit function whose parameters are the
//! result values of its dependencies and whose return value packages
//! the module's exports: a two-element array of the default export (or
//! null) and a name/value pair list. The output program binds library
//! results first, then invokes units in initialization order, and
//! finally runs the entry module's body at top level. Three runtime
//! helpers are assumed in scope: `__access`, `__namespace` and
//! `__library`.

use crate::hoist;
use crate::mangle;
use crate::table::{LocalModule, ModuleKey, ModuleRecord};
use crate::validate::ResolvedModuleTable;
use mica_ast::{
    Expr, ExportDecl, FunctionDecl, Ident, ImportSpecifier, Literal, ModuleItem, Node, Program,
    Span, Stmt, VarDecl, VarDeclKind,
};
use std::collections::{BTreeSet, HashMap};

/// Binds the default export of a module inside its own unit so the
/// packaged return can reference it after evaluation in source order.
const DEFAULT_SLOT: &str = "__default__";

pub fn link(resolved: ResolvedModuleTable, order: &[ModuleKey]) -> Program {
    let ResolvedModuleTable { mut table, exports } = resolved;
    let mut items: Vec<Node<ModuleItem>> = Vec::new();

    // Library results come first; units reference them as arguments.
    for key in order {
        if let Some(ModuleRecord::Library(lib)) = table.records.get(key) {
            items.push(const_item(
                &mangle::result_name(key),
                call(mangle::LIBRARY_LOADER, vec![string_lit(&lib.name)]),
            ));
        }
    }

    let inline_entry = order.last() == Some(&table.entry);

    for key in order {
        let module = match table.records.remove(key) {
            Some(ModuleRecord::Local(module)) => module,
            _ => continue,
        };
        if inline_entry && *key == table.entry {
            items.extend(lower_entry(module));
        } else {
            items.extend(lower_unit(key, module, &exports));
        }
    }

    Program {
        items,
        span: Span::synthesized(),
    }
}

/// Synthesizes one module's unit function and its invocation binding.
fn lower_unit(
    key: &ModuleKey,
    mut module: LocalModule,
    exports: &HashMap<ModuleKey, BTreeSet<String>>,
) -> Vec<Node<ModuleItem>> {
    hoist::hoist_imports(&mut module.program);

    let mut body: Vec<Node<Stmt>> = Vec::new();
    let mut pairs: Vec<(String, Node<Expr>)> = Vec::new();
    let mut default: Option<Node<Expr>> = None;

    for item in module.program.items {
        match item.value {
            ModuleItem::Import(import) => {
                lower_import(&import, &mut body);
            }
            ModuleItem::Export(export) => {
                lower_export(export, exports, &mut body, &mut pairs, &mut default);
            }
            ModuleItem::Stmt(stmt) => body.push(stmt),
        }
    }

    let pair_exprs: Vec<Node<Expr>> = pairs
        .into_iter()
        .map(|(name, expr)| {
            Node::synthesized(Expr::Array(vec![string_lit(&name), expr]))
        })
        .collect();
    let packaged = Expr::Array(vec![
        default.unwrap_or_else(|| Node::synthesized(Expr::Literal(Literal::Null))),
        Node::synthesized(Expr::Array(pair_exprs)),
    ]);
    body.push(Node::synthesized(Stmt::Return(Some(Node::synthesized(
        packaged,
    )))));

    let params: Vec<Node<Ident>> = module
        .dependencies
        .iter()
        .map(|dep| Node::synthesized(Ident::new(mangle::result_name(dep))))
        .collect();
    let args: Vec<Node<Expr>> = module
        .dependencies
        .iter()
        .map(|dep| ident_expr(&mangle::result_name(dep)))
        .collect();

    let unit = Node::synthesized(ModuleItem::Stmt(Node::synthesized(Stmt::Function(
        FunctionDecl {
            name: Node::synthesized(Ident::new(mangle::unit_name(key))),
            params,
            body,
        },
    ))));
    let invocation = const_item(
        &mangle::result_name(key),
        call(&mangle::unit_name(key), args),
    );
    vec![unit, invocation]
}

/// The entry module runs at top level: imports are lowered against the
/// already-bound dependency results and export wrappers are stripped,
/// keeping declarations and side effects.
fn lower_entry(mut module: LocalModule) -> Vec<Node<ModuleItem>> {
    hoist::hoist_imports(&mut module.program);

    let mut body: Vec<Node<Stmt>> = Vec::new();
    for item in module.program.items {
        match item.value {
            ModuleItem::Import(import) => lower_import(&import, &mut body),
            ModuleItem::Export(export) => match export {
                ExportDecl::Decl(stmt) | ExportDecl::DefaultDecl(stmt) => body.push(*stmt),
                ExportDecl::Default(expr) => body.push(Node::synthesized(Stmt::Expr(expr))),
                ExportDecl::Named { .. } | ExportDecl::All { .. } => {}
            },
            ModuleItem::Stmt(stmt) => body.push(stmt),
        }
    }

    body.into_iter()
        .map(|stmt| Node::synthesized(ModuleItem::Stmt(stmt)))
        .collect()
}

/// `import { a as b } from M` becomes `const b = __access(R, "a")`,
/// where R is the result binding of M (a unit parameter, or the
/// top-level binding when lowering the entry).
fn lower_import(import: &mica_ast::ImportDecl, body: &mut Vec<Node<Stmt>>) {
    let result = mangle::result_name(&ModuleKey::from_canonical(&import.source.value));
    for spec in &import.specifiers {
        let (local, init) = match spec {
            ImportSpecifier::Named { imported, local } => (
                local.as_ref().unwrap_or(imported).value.name.clone(),
                call(
                    mangle::ACCESSOR,
                    vec![ident_expr(&result), string_lit(&imported.value.name)],
                ),
            ),
            ImportSpecifier::Default(name) => (
                name.value.name.clone(),
                call(
                    mangle::ACCESSOR,
                    vec![ident_expr(&result), string_lit("default")],
                ),
            ),
            ImportSpecifier::Namespace(name) => (
                name.value.name.clone(),
                call(mangle::NAMESPACE, vec![ident_expr(&result)]),
            ),
        };
        body.push(const_stmt(&local, init));
    }
}

fn lower_export(
    export: ExportDecl,
    exports: &HashMap<ModuleKey, BTreeSet<String>>,
    body: &mut Vec<Node<Stmt>>,
    pairs: &mut Vec<(String, Node<Expr>)>,
    default: &mut Option<Node<Expr>>,
) {
    match export {
        ExportDecl::Decl(stmt) => {
            if let Some(name) = stmt.value.declared_name() {
                pairs.push((name.name.clone(), ident_expr(&name.name)));
            }
            body.push(*stmt);
        }
        ExportDecl::Named {
            specifiers,
            source: None,
        } => {
            for spec in specifiers {
                pairs.push((
                    spec.exported_name().name.clone(),
                    ident_expr(&spec.local.value.name),
                ));
            }
        }
        ExportDecl::Named {
            specifiers,
            source: Some(source),
        } => {
            let result = mangle::result_name(&ModuleKey::from_canonical(&source.value));
            for spec in specifiers {
                pairs.push((
                    spec.exported_name().name.clone(),
                    call(
                        mangle::ACCESSOR,
                        vec![ident_expr(&result), string_lit(&spec.local.value.name)],
                    ),
                ));
            }
        }
        ExportDecl::Default(expr) => {
            // Evaluated in source position, packaged at the end.
            body.push(const_stmt(DEFAULT_SLOT, expr));
            *default = Some(ident_expr(DEFAULT_SLOT));
        }
        ExportDecl::DefaultDecl(stmt) => {
            if let Some(name) = stmt.value.declared_name() {
                *default = Some(ident_expr(&name.name));
            }
            body.push(*stmt);
        }
        ExportDecl::All { source, as_name } => {
            let source_key = ModuleKey::from_canonical(&source.value);
            let result = mangle::result_name(&source_key);
            match as_name {
                Some(ns) => pairs.push((
                    ns.value.name.clone(),
                    call(mangle::NAMESPACE, vec![ident_expr(&result)]),
                )),
                None => {
                    if let Some(set) = exports.get(&source_key) {
                        for name in set {
                            if name != "default" {
                                pairs.push((
                                    name.clone(),
                                    call(
                                        mangle::ACCESSOR,
                                        vec![ident_expr(&result), string_lit(name)],
                                    ),
                                ));
                            }
                        }
                    }
                }
            }
        }
    }
}

fn ident_expr(name: &str) -> Node<Expr> {
    Node::synthesized(Expr::Ident(Ident::new(name)))
}

fn string_lit(value: &str) -> Node<Expr> {
    Node::synthesized(Expr::Literal(Literal::String(value.to_string())))
}

fn call(callee: &str, args: Vec<Node<Expr>>) -> Node<Expr> {
    Node::synthesized(Expr::Call {
        callee: Box::new(ident_expr(callee)),
        args,
    })
}

fn const_stmt(name: &str, init: Node<Expr>) -> Node<Stmt> {
    Node::synthesized(Stmt::VarDecl(VarDecl {
        kind: VarDeclKind::Const,
        name: Node::synthesized(Ident::new(name)),
        init: Some(init),
    }))
}

fn const_item(name: &str, init: Node<Expr>) -> Node<ModuleItem> {
    Node::synthesized(ModuleItem::Stmt(const_stmt(name, init)))
}
