//! Import normalization before linking.
//!
//! A module may scatter imports between statements and repeat a source
//! across several declarations. The linker lowers each import source to
//! one parameter binding, so this pass merges declarations that share a
//! canonical source and moves all imports ahead of the module body.
//! First-reference order of sources is preserved.

use mica_ast::{ImportDecl, ModuleItem, Node, Program};

pub fn hoist_imports(program: &mut Program) {
    let mut imports: Vec<Node<ModuleItem>> = Vec::new();
    let mut rest: Vec<Node<ModuleItem>> = Vec::new();

    for item in program.items.drain(..) {
        match item.value {
            ModuleItem::Import(decl) => merge(&mut imports, decl, item.span),
            other => rest.push(Node {
                span: item.span,
                value: other,
            }),
        }
    }

    imports.extend(rest);
    program.items = imports;
}

fn merge(imports: &mut Vec<Node<ModuleItem>>, decl: ImportDecl, span: mica_ast::Span) {
    for existing in imports.iter_mut() {
        if let ModuleItem::Import(prior) = &mut existing.value {
            if prior.source.value == decl.source.value {
                prior.specifiers.extend(decl.specifiers);
                return;
            }
        }
    }
    imports.push(Node {
        span,
        value: ModuleItem::Import(decl),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::parse_file;

    fn sources(program: &Program) -> Vec<(String, usize)> {
        program
            .items
            .iter()
            .filter_map(|item| match &item.value {
                ModuleItem::Import(decl) => {
                    Some((decl.source.value.clone(), decl.specifiers.len()))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_merges_same_source_and_hoists() {
        let mut program = parse_file(
            "import { a } from \"/x.mica\";\nconst mid = 1;\nimport { b } from \"/y.mica\";\nimport { c } from \"/x.mica\";",
            0,
        )
        .unwrap();
        hoist_imports(&mut program);

        assert_eq!(
            sources(&program),
            vec![("/x.mica".to_string(), 2), ("/y.mica".to_string(), 1)]
        );
        // Imports precede the body.
        assert!(matches!(program.items[0].value, ModuleItem::Import(_)));
        assert!(matches!(program.items[1].value, ModuleItem::Import(_)));
        assert!(matches!(program.items[2].value, ModuleItem::Stmt(_)));
    }

    #[test]
    fn test_noop_without_imports() {
        let mut program = parse_file("const a = 1;\nconst b = 2;", 0).unwrap();
        let before = program.items.len();
        hoist_imports(&mut program);
        assert_eq!(program.items.len(), before);
    }
}
