//! # Mica Parser
//!
//! Recursive descent parser for the Mica teaching language. Produces
//! `mica_ast::Program` trees for the module resolver. Disallowed
//! import shapes (a wildcard import without a namespace binding) are
//! rejected here, before the resolver ever sees them.

pub mod error;
pub mod expr;
pub mod parser;
pub mod stmt;

pub use error::{ParseError, ParseResult};
pub use parser::Parser;

use mica_ast::Program;
use mica_lexer::{Lexer, TokenKind};

/// Lexes and parses a whole source file in one call.
pub fn parse_source(source: &str, file_id: usize) -> Result<Program, Vec<ParseError>> {
    let mut lexer = Lexer::with_file_id(source, file_id);
    let tokens = lexer.tokenize();

    let lex_errors: Vec<ParseError> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Error)
        .map(|t| ParseError {
            message: t.value.clone(),
            span: t.span,
        })
        .collect();
    if !lex_errors.is_empty() {
        return Err(lex_errors);
    }

    Parser::new(tokens).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mica_ast::*;

    fn parse(source: &str) -> Program {
        parse_source(source, 0).expect("parse failed")
    }

    #[test]
    fn test_parse_const_decl() {
        let program = parse("const x = 1 + 2;");
        assert_eq!(program.items.len(), 1);
        match &program.items[0].value {
            ModuleItem::Stmt(stmt) => match &stmt.value {
                Stmt::VarDecl(decl) => {
                    assert_eq!(decl.kind, VarDeclKind::Const);
                    assert_eq!(decl.name.value.name, "x");
                    assert!(matches!(
                        decl.init.as_ref().unwrap().value,
                        Expr::Binary { op: BinaryOp::Add, .. }
                    ));
                }
                other => panic!("Expected var decl, got {:?}", other),
            },
            other => panic!("Expected statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_named_import() {
        let program = parse("import { a, b as c } from \"./m.mica\";");
        match &program.items[0].value {
            ModuleItem::Import(import) => {
                assert_eq!(import.source.value, "./m.mica");
                assert_eq!(import.specifiers.len(), 2);
                assert_eq!(import.specifiers[0].local_name().name, "a");
                assert_eq!(import.specifiers[1].local_name().name, "c");
            }
            other => panic!("Expected import, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_default_and_namespace_import() {
        let program = parse("import d from \"m\";\nimport * as ns from \"m\";");
        assert!(matches!(
            &program.items[0].value,
            ModuleItem::Import(ImportDecl { specifiers, .. })
                if matches!(specifiers[0], ImportSpecifier::Default(_))
        ));
        assert!(matches!(
            &program.items[1].value,
            ModuleItem::Import(ImportDecl { specifiers, .. })
                if matches!(specifiers[0], ImportSpecifier::Namespace(_))
        ));
    }

    #[test]
    fn test_wildcard_import_without_namespace_rejected() {
        let result = parse_source("import * from \"m\";", 0);
        let errors = result.expect_err("wildcard import without `as` must fail");
        assert!(errors[0].message.contains("as"));
    }

    #[test]
    fn test_parse_export_forms() {
        let program = parse(
            "export const x = 1;\n\
             export function f() { return 1; }\n\
             export { x as y };\n\
             export { z } from \"./z.mica\";\n\
             export default 42;\n\
             export * from \"./w.mica\";\n\
             export * as w from \"./w.mica\";",
        );

        let exports: Vec<&ExportDecl> = program
            .items
            .iter()
            .filter_map(|item| match &item.value {
                ModuleItem::Export(e) => Some(e),
                _ => None,
            })
            .collect();
        assert_eq!(exports.len(), 7);
        assert!(matches!(exports[0], ExportDecl::Decl(_)));
        assert!(matches!(exports[1], ExportDecl::Decl(_)));
        assert!(matches!(exports[2], ExportDecl::Named { source: None, .. }));
        assert!(matches!(exports[3], ExportDecl::Named { source: Some(_), .. }));
        assert!(matches!(exports[4], ExportDecl::Default(_)));
        assert!(matches!(exports[5], ExportDecl::All { as_name: None, .. }));
        assert!(matches!(exports[6], ExportDecl::All { as_name: Some(_), .. }));
    }

    #[test]
    fn test_parse_export_default_function() {
        let program = parse("export default function main() { return 0; }");
        match &program.items[0].value {
            ModuleItem::Export(ExportDecl::DefaultDecl(stmt)) => {
                assert!(matches!(stmt.value, Stmt::Function(_)));
            }
            other => panic!("Expected default function export, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_side_effect_import() {
        let program = parse("import \"./side.mica\";");
        match &program.items[0].value {
            ModuleItem::Import(import) => assert!(import.specifiers.is_empty()),
            other => panic!("Expected import, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_control_flow() {
        let program = parse(
            "function f(n) {\n\
               if (n < 2) { return n; }\n\
               while (n > 0) { f(n); }\n\
               return f(n - 1) + f(n - 2);\n\
             }",
        );
        assert_eq!(program.items.len(), 1);
    }

    #[test]
    fn test_error_recovery_collects_multiple() {
        let result = parse_source("const = 1;\nconst = 2;", 0);
        let errors = result.expect_err("should fail");
        assert!(errors.len() >= 2);
    }
}
