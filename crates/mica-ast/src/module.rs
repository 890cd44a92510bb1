//! Module system definitions for the AST

use super::*;

/// Module item (top-level in a module)
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleItem {
    /// Import declaration
    Import(ImportDecl),

    /// Export declaration
    Export(ExportDecl),

    /// Statement
    Stmt(Node<Stmt>),
}

/// Import declaration
///
/// `source` holds the module specifier as written; the graph builder
/// rewrites it in place to the canonical module key once resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub specifiers: Vec<ImportSpecifier>,
    pub source: Node<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    /// import name from "module"
    Default(Node<Ident>),

    /// import * as name from "module"
    Namespace(Node<Ident>),

    /// import { name } from "module" or import { name as alias } from "module"
    Named {
        imported: Node<Ident>,
        local: Option<Node<Ident>>,
    },
}

impl ImportSpecifier {
    /// The identifier this specifier binds in the importing module.
    pub fn local_name(&self) -> &Ident {
        match self {
            ImportSpecifier::Default(name) => &name.value,
            ImportSpecifier::Namespace(name) => &name.value,
            ImportSpecifier::Named { imported, local } => {
                &local.as_ref().unwrap_or(imported).value
            }
        }
    }
}

/// Export declaration
#[derive(Debug, Clone, PartialEq)]
pub enum ExportDecl {
    /// export { name } / export { name } from "module"
    Named {
        specifiers: Vec<ExportSpecifier>,
        source: Option<Node<String>>,
    },

    /// export default expr
    Default(Node<Expr>),

    /// export default function f() {}
    DefaultDecl(Box<Node<Stmt>>),

    /// export * from "module" / export * as ns from "module"
    All {
        source: Node<String>,
        as_name: Option<Node<Ident>>,
    },

    /// export declaration (export const x = e; / export function f() {})
    Decl(Box<Node<Stmt>>),
}

impl ExportDecl {
    /// The re-export source, if this declaration reads from another module.
    pub fn source(&self) -> Option<&Node<String>> {
        match self {
            ExportDecl::Named { source, .. } => source.as_ref(),
            ExportDecl::All { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Mutable access to the re-export source, for canonicalization.
    pub fn source_mut(&mut self) -> Option<&mut Node<String>> {
        match self {
            ExportDecl::Named { source, .. } => source.as_mut(),
            ExportDecl::All { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    pub local: Node<Ident>,
    pub exported: Option<Node<Ident>>,
}

impl ExportSpecifier {
    /// The name importers see.
    pub fn exported_name(&self) -> &Ident {
        &self.exported.as_ref().unwrap_or(&self.local).value
    }
}

/// Root AST node - represents a complete source file
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub items: Vec<Node<ModuleItem>>,
    pub span: Span,
}
