//! # Mica AST
//!
//! Abstract Syntax Tree definitions for the Mica teaching language.
//! The resolver consumes and rewrites these trees; the lexer and parser
//! produce them.

use std::fmt;

// =============================================================================
// Core Types (kept in lib.rs - used by all modules)
// =============================================================================

/// Identifier for the source file a span points into. Assigned by whoever
/// parses a batch of files (the graph builder numbers files in discovery
/// order); `SYNTHETIC` marks nodes the linker fabricated.
pub type FileId = usize;

/// Source location information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub file_id: FileId,
}

impl Span {
    pub const SYNTHETIC: FileId = usize::MAX;

    pub fn new(start: usize, end: usize, file_id: FileId) -> Self {
        Self { start, end, file_id }
    }

    /// Span for nodes synthesized by the linker, with no source position.
    pub fn synthesized() -> Self {
        Self::new(0, 0, Self::SYNTHETIC)
    }

    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            file_id: self.file_id,
        }
    }
}

/// AST node wrapper that includes span information
#[derive(Debug, Clone, PartialEq)]
pub struct Node<T> {
    pub span: Span,
    pub value: T,
}

impl<T> Node<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { span, value }
    }

    /// Node carrying a synthesized span.
    pub fn synthesized(value: T) -> Self {
        Self::new(value, Span::synthesized())
    }
}

/// Identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub name: String,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// =============================================================================
// Module Declarations
// =============================================================================

pub mod expr;
pub mod module;
pub mod stmt;

pub use expr::*;
pub use module::*;
pub use stmt::*;

// =============================================================================
// Tests
// =============================================================================
