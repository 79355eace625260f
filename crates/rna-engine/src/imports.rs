//! Import specifier scanning and in-place rewriting for compiled modules.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    ExportAllDeclaration, ExportNamedDeclaration, Expression, ImportDeclaration,
    ImportExpression, StringLiteral,
};
use oxc_ast_visit::{Visit, walk};
use oxc_parser::Parser;
use oxc_span::SourceType;
use rna_plugin::EngineError;

/// A module specifier found in source, with the byte range of its text
/// (quotes excluded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpecifier {
    pub specifier: String,
    pub start: usize,
    pub end: usize,
    /// `import('...')` rather than a static declaration.
    pub dynamic: bool,
}

#[derive(Default)]
struct ImportCollector {
    found: Vec<ImportSpecifier>,
}

impl ImportCollector {
    fn push(&mut self, literal: &StringLiteral<'_>, dynamic: bool) {
        let span = literal.span;
        // Spans cover the quotes.
        if span.end <= span.start + 1 {
            return;
        }
        self.found.push(ImportSpecifier {
            specifier: literal.value.to_string(),
            start: span.start as usize + 1,
            end: span.end as usize - 1,
            dynamic,
        });
    }
}

impl<'a> Visit<'a> for ImportCollector {
    fn visit_import_declaration(&mut self, it: &ImportDeclaration<'a>) {
        if !it.import_kind.is_type() {
            self.push(&it.source, false);
        }
    }

    fn visit_export_named_declaration(&mut self, it: &ExportNamedDeclaration<'a>) {
        match &it.source {
            Some(source) if !it.export_kind.is_type() => self.push(source, false),
            _ => walk::walk_export_named_declaration(self, it),
        }
    }

    fn visit_export_all_declaration(&mut self, it: &ExportAllDeclaration<'a>) {
        if !it.export_kind.is_type() {
            self.push(&it.source, false);
        }
    }

    fn visit_import_expression(&mut self, it: &ImportExpression<'a>) {
        if let Expression::StringLiteral(literal) = &it.source {
            self.push(literal, true);
        }
        walk::walk_import_expression(self, it);
    }
}

/// Every static import, re-export and literal dynamic import in `code`, in
/// source order.
pub fn scan_imports(code: &str, path: &Path) -> Result<Vec<ImportSpecifier>, EngineError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, SourceType::mjs()).parse();
    if let Some(error) = ret.errors.first() {
        return Err(EngineError::Transform {
            path: path.to_path_buf(),
            message: format!("{error:?}"),
        });
    }

    let mut collector = ImportCollector::default();
    collector.visit_program(&ret.program);
    collector.found.sort_by_key(|import| import.start);
    Ok(collector.found)
}

/// Replace specifier text by span. Replacements must not overlap.
pub fn rewrite_imports(code: &str, replacements: &[(ImportSpecifier, String)]) -> String {
    let mut ordered: Vec<_> = replacements.iter().collect();
    ordered.sort_by_key(|(import, _)| import.start);

    let mut out = String::with_capacity(code.len());
    let mut cursor = 0;
    for (import, replacement) in ordered {
        if import.start < cursor || import.end > code.len() {
            continue;
        }
        out.push_str(&code[cursor..import.start]);
        out.push_str(replacement);
        cursor = import.end;
    }
    out.push_str(&code[cursor..]);
    out
}
