//! Link error taxonomy
//!
//! Three families: resolution errors (unknown path, unknown library,
//! invalid specifier), structural errors (self-import, circular import,
//! conflicting exports), and binding errors (undefined named/default/
//! namespace imports, only raised under strict validation).

use crate::table::ModuleKey;
use mica_ast::Span;
use std::fmt;

/// A source position attached to an error: the file the offending
/// specifier appears in plus its span.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLoc {
    pub path: String,
    pub span: Span,
}

impl SourceLoc {
    pub fn new(path: impl Into<String>, span: Span) -> Self {
        Self {
            path: path.into(),
            span,
        }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}..{}", self.path, self.span.start, self.span.end)
    }
}

/// A syntax error surfaced by the external parse function.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub message: String,
    pub span: Span,
}

/// Errors produced anywhere in the link pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkError {
    /// An import names a local path absent from the file table.
    ModuleNotFound {
        specifier: String,
        importer: Option<SourceLoc>,
    },

    /// An import names a library module the registry does not know.
    LibraryNotFound {
        name: String,
        importer: Option<SourceLoc>,
    },

    /// A specifier contains characters outside the accepted path grammar,
    /// consecutive separators, or escapes the table root.
    InvalidPath {
        specifier: String,
        reason: String,
        importer: Option<SourceLoc>,
    },

    /// The parse function rejected a module's source text.
    Syntax { path: String, error: SyntaxError },

    /// A module imports itself: a degenerate one-element cycle.
    SelfImport { path: String, loc: SourceLoc },

    /// A dependency cycle among local modules. The stored sequence is in
    /// import order: each module imports the next, and the last imports
    /// the first.
    CircularImport { cycle: Vec<ModuleKey> },

    /// The same export name is introduced by more than one declaration in
    /// one module (directly or via re-export).
    DuplicateExport {
        module: ModuleKey,
        name: String,
        spans: Vec<Span>,
    },

    /// A named import (or named re-export) of a symbol the target module
    /// does not export.
    UndefinedImport {
        module: ModuleKey,
        target: ModuleKey,
        name: String,
        span: Span,
    },

    /// A default import from a module without a default export.
    UndefinedDefaultImport {
        module: ModuleKey,
        target: ModuleKey,
        span: Span,
    },

    /// A namespace import from a module with an empty export set.
    UndefinedNamespaceImport {
        module: ModuleKey,
        target: ModuleKey,
        span: Span,
    },
}

impl LinkError {
    /// The span and file to point a diagnostic label at, when one exists.
    pub fn location(&self) -> Option<SourceLoc> {
        match self {
            LinkError::ModuleNotFound { importer, .. }
            | LinkError::LibraryNotFound { importer, .. }
            | LinkError::InvalidPath { importer, .. } => importer.clone(),
            LinkError::Syntax { path, error } => {
                Some(SourceLoc::new(path.clone(), error.span))
            }
            LinkError::SelfImport { loc, .. } => Some(loc.clone()),
            LinkError::CircularImport { .. } => None,
            LinkError::DuplicateExport { module, spans, .. } => spans
                .first()
                .map(|span| SourceLoc::new(module.to_string(), *span)),
            LinkError::UndefinedImport { module, span, .. }
            | LinkError::UndefinedDefaultImport { module, span, .. }
            | LinkError::UndefinedNamespaceImport { module, span, .. } => {
                Some(SourceLoc::new(module.to_string(), *span))
            }
        }
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::ModuleNotFound { specifier, importer } => {
                write!(f, "module not found: '{}'", specifier)?;
                if let Some(loc) = importer {
                    write!(f, " (imported from {})", loc)?;
                }
                Ok(())
            }
            LinkError::LibraryNotFound { name, importer } => {
                write!(f, "unknown library module '{}'", name)?;
                if let Some(loc) = importer {
                    write!(f, " (imported from {})", loc)?;
                }
                Ok(())
            }
            LinkError::InvalidPath {
                specifier,
                reason,
                importer,
            } => {
                write!(f, "invalid module path '{}': {}", specifier, reason)?;
                if let Some(loc) = importer {
                    write!(f, " (at {})", loc)?;
                }
                Ok(())
            }
            LinkError::Syntax { path, error } => {
                write!(f, "syntax error in {}: {}", path, error.message)
            }
            LinkError::SelfImport { path, .. } => {
                write!(f, "module '{}' imports itself", path)
            }
            LinkError::CircularImport { cycle } => {
                write!(f, "circular import: ")?;
                for key in cycle {
                    write!(f, "{} -> ", key)?;
                }
                match cycle.first() {
                    Some(first) => write!(f, "{}", first),
                    None => Ok(()),
                }
            }
            LinkError::DuplicateExport { module, name, .. } => {
                write!(
                    f,
                    "module '{}' exports '{}' more than once",
                    module, name
                )
            }
            LinkError::UndefinedImport {
                module,
                target,
                name,
                ..
            } => {
                write!(
                    f,
                    "module '{}' imports '{}' from '{}', which does not export it",
                    module, name, target
                )
            }
            LinkError::UndefinedDefaultImport { module, target, .. } => {
                write!(
                    f,
                    "module '{}' imports the default export of '{}', which has none",
                    module, target
                )
            }
            LinkError::UndefinedNamespaceImport { module, target, .. } => {
                write!(
                    f,
                    "module '{}' imports '{}' as a namespace, but it exports nothing",
                    module, target
                )
            }
        }
    }
}

impl std::error::Error for LinkError {}
