//! Renders an AST back to Mica source text.
//!
//! Used to write linked programs to disk. Nested expressions are
//! parenthesized unconditionally, so operator precedence never needs
//! reconstructing; the output is meant to be executed, not admired.

use mica_ast::{
    Expr, ExportDecl, ImportSpecifier, Literal, ModuleItem, Node, Program, Stmt, VarDecl,
};
use std::fmt::Write;

pub fn program(program: &Program) -> String {
    let mut out = String::new();
    for item in &program.items {
        item_text(&item.value, 0, &mut out);
    }
    out
}

fn item_text(item: &ModuleItem, indent: usize, out: &mut String) {
    match item {
        ModuleItem::Stmt(stmt) => stmt_text(&stmt.value, indent, out),
        ModuleItem::Import(import) => {
            pad(indent, out);
            out.push_str("import ");
            let mut named: Vec<String> = Vec::new();
            let mut lead: Vec<String> = Vec::new();
            for spec in &import.specifiers {
                match spec {
                    ImportSpecifier::Default(name) => lead.push(name.value.name.clone()),
                    ImportSpecifier::Namespace(name) => {
                        lead.push(format!("* as {}", name.value.name))
                    }
                    ImportSpecifier::Named { imported, local } => named.push(match local {
                        Some(local) => {
                            format!("{} as {}", imported.value.name, local.value.name)
                        }
                        None => imported.value.name.clone(),
                    }),
                }
            }
            let mut parts = lead;
            if !named.is_empty() {
                parts.push(format!("{{ {} }}", named.join(", ")));
            }
            if !parts.is_empty() {
                out.push_str(&parts.join(", "));
                out.push_str(" from ");
            }
            let _ = writeln!(out, "{:?};", import.source.value);
        }
        ModuleItem::Export(export) => export_text(export, indent, out),
    }
}

fn export_text(export: &ExportDecl, indent: usize, out: &mut String) {
    match export {
        ExportDecl::Decl(stmt) => {
            pad(indent, out);
            out.push_str("export ");
            stmt_inline(&stmt.value, indent, out);
        }
        ExportDecl::Default(expr) => {
            pad(indent, out);
            let _ = writeln!(out, "export default {};", expr_text(&expr.value));
        }
        ExportDecl::DefaultDecl(stmt) => {
            pad(indent, out);
            out.push_str("export default ");
            stmt_inline(&stmt.value, indent, out);
        }
        ExportDecl::Named { specifiers, source } => {
            pad(indent, out);
            let specs: Vec<String> = specifiers
                .iter()
                .map(|spec| match &spec.exported {
                    Some(exported) => {
                        format!("{} as {}", spec.local.value.name, exported.value.name)
                    }
                    None => spec.local.value.name.clone(),
                })
                .collect();
            match source {
                Some(source) => {
                    let _ = writeln!(out, "export {{ {} }} from {:?};", specs.join(", "), source.value);
                }
                None => {
                    let _ = writeln!(out, "export {{ {} }};", specs.join(", "));
                }
            }
        }
        ExportDecl::All { source, as_name } => {
            pad(indent, out);
            match as_name {
                Some(ns) => {
                    let _ = writeln!(out, "export * as {} from {:?};", ns.value.name, source.value);
                }
                None => {
                    let _ = writeln!(out, "export * from {:?};", source.value);
                }
            }
        }
    }
}

fn stmt_text(stmt: &Stmt, indent: usize, out: &mut String) {
    pad(indent, out);
    stmt_inline(stmt, indent, out);
}

/// Writes a statement assuming indentation is already in place.
fn stmt_inline(stmt: &Stmt, indent: usize, out: &mut String) {
    match stmt {
        Stmt::VarDecl(VarDecl { kind, name, init }) => match init {
            Some(init) => {
                let _ = writeln!(out, "{} {} = {};", kind, name.value.name, expr_text(&init.value));
            }
            None => {
                let _ = writeln!(out, "{} {};", kind, name.value.name);
            }
        },
        Stmt::Function(func) => {
            let params: Vec<&str> = func.params.iter().map(|p| p.value.name.as_str()).collect();
            let _ = writeln!(out, "function {}({}) {{", func.name.value.name, params.join(", "));
            for stmt in &func.body {
                stmt_text(&stmt.value, indent + 1, out);
            }
            pad(indent, out);
            out.push_str("}\n");
        }
        Stmt::Return(expr) => match expr {
            Some(expr) => {
                let _ = writeln!(out, "return {};", expr_text(&expr.value));
            }
            None => out.push_str("return;\n"),
        },
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        } => {
            let _ = writeln!(out, "if ({}) {{", expr_text(&cond.value));
            block_body(then_branch, indent, out);
            pad(indent, out);
            match else_branch {
                Some(else_branch) => {
                    out.push_str("} else {\n");
                    block_body(else_branch, indent, out);
                    pad(indent, out);
                    out.push_str("}\n");
                }
                None => out.push_str("}\n"),
            }
        }
        Stmt::While { cond, body } => {
            let _ = writeln!(out, "while ({}) {{", expr_text(&cond.value));
            block_body(body, indent, out);
            pad(indent, out);
            out.push_str("}\n");
        }
        Stmt::Block(stmts) => {
            out.push_str("{\n");
            for stmt in stmts {
                stmt_text(&stmt.value, indent + 1, out);
            }
            pad(indent, out);
            out.push_str("}\n");
        }
        Stmt::Expr(expr) => {
            let _ = writeln!(out, "{};", expr_text(&expr.value));
        }
    }
}

/// Emits the statements of an `if`/`while` arm. Explicit blocks flatten
/// into the surrounding braces the header already opened.
fn block_body(branch: &Node<Stmt>, indent: usize, out: &mut String) {
    match &branch.value {
        Stmt::Block(stmts) => {
            for stmt in stmts {
                stmt_text(&stmt.value, indent + 1, out);
            }
        }
        other => stmt_text(other, indent + 1, out),
    }
}

fn expr_text(expr: &Expr) -> String {
    match expr {
        Expr::Literal(lit) => literal_text(lit),
        Expr::Ident(ident) => ident.name.clone(),
        Expr::Array(elements) => {
            let parts: Vec<String> = elements.iter().map(|e| expr_text(&e.value)).collect();
            format!("[{}]", parts.join(", "))
        }
        Expr::Call { callee, args } => {
            let parts: Vec<String> = args.iter().map(|a| expr_text(&a.value)).collect();
            format!("{}({})", callee_text(&callee.value), parts.join(", "))
        }
        Expr::Member { object, property } => {
            format!("{}.{}", callee_text(&object.value), property.value.name)
        }
        Expr::Index { object, index } => {
            format!(
                "{}[{}]",
                callee_text(&object.value),
                expr_text(&index.value)
            )
        }
        Expr::Unary { op, operand } => format!("{}{}", op, callee_text(&operand.value)),
        Expr::Binary { op, left, right } => format!(
            "{} {} {}",
            callee_text(&left.value),
            op,
            callee_text(&right.value)
        ),
    }
}

/// Like `expr_text` but wraps operator expressions in parentheses so
/// they compose without precedence bookkeeping.
fn callee_text(expr: &Expr) -> String {
    match expr {
        Expr::Binary { .. } | Expr::Unary { .. } => format!("({})", expr_text(expr)),
        other => expr_text(other),
    }
}

fn literal_text(lit: &Literal) -> String {
    match lit {
        Literal::Number(n) => {
            if n.fract() == 0.0 && n.is_finite() {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Literal::String(s) => format!("{:?}", s),
        Literal::Bool(b) => b.to_string(),
        Literal::Null => "null".to_string(),
    }
}

fn pad(indent: usize, out: &mut String) {
    for _ in 0..indent {
        out.push_str("    ");
    }
}
