//! Statement definitions for the AST

use super::*;

/// Statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Variable declaration: let x = e; / const x = e;
    VarDecl(VarDecl),

    /// Function declaration: function f(a, b) { ... }
    Function(FunctionDecl),

    /// Return statement
    Return(Option<Node<Expr>>),

    /// If statement
    If {
        cond: Node<Expr>,
        then_branch: Box<Node<Stmt>>,
        else_branch: Option<Box<Node<Stmt>>>,
    },

    /// While loop
    While {
        cond: Node<Expr>,
        body: Box<Node<Stmt>>,
    },

    /// Block statement
    Block(Vec<Node<Stmt>>),

    /// Expression statement
    Expr(Node<Expr>),
}

/// Variable declaration kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarDeclKind {
    Let,
    Const,
}

impl fmt::Display for VarDeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarDeclKind::Let => write!(f, "let"),
            VarDeclKind::Const => write!(f, "const"),
        }
    }
}

/// Variable declaration (single declarator)
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: VarDeclKind,
    pub name: Node<Ident>,
    pub init: Option<Node<Expr>>,
}

/// Function declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Node<Ident>,
    pub params: Vec<Node<Ident>>,
    pub body: Vec<Node<Stmt>>,
}

impl Stmt {
    /// The name a declaration statement binds, if any. Import/export
    /// lowering and export-set computation both key off this.
    pub fn declared_name(&self) -> Option<&Ident> {
        match self {
            Stmt::VarDecl(decl) => Some(&decl.name.value),
            Stmt::Function(func) => Some(&func.name.value),
            _ => None,
        }
    }
}
