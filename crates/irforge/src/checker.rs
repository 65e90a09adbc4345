//! Reports type arguments written where none can be accepted: on a
//! reference to a type parameter, and on a package used as a qualifier.
//!
//! Resolution has already dropped such arguments from the resolved types,
//! so the checker goes back to the syntax tree to find them. All traversal
//! goes through [`SourceTree`], which makes the materialized and the
//! flyweight tree report identical spans.

use std::collections::BTreeSet;

use tracing::trace;

use crate::resolve::{ConeType, QualifiedAccess, Receiver, ResolvedFile, ResolvedTypeRef, TypeProjection};
use crate::source_tree::{SourceTree, TextRange};
use crate::syntax_kind::SyntaxKind;

pub const TYPE_ARGUMENTS_NOT_ALLOWED_CODE: &str = "IRF-TYPEARGS-0001";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    TypeArgumentsNotAllowed,
}

impl DiagnosticKind {
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::TypeArgumentsNotAllowed => "TYPE_ARGUMENTS_NOT_ALLOWED",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::TypeArgumentsNotAllowed => TYPE_ARGUMENTS_NOT_ALLOWED_CODE,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            DiagnosticKind::TypeArgumentsNotAllowed => "type arguments are not allowed here",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceSpan {
    pub unit: String,
    pub start: u32,
    pub end: u32,
}

pub trait DiagnosticReporter {
    fn report(&mut self, kind: DiagnosticKind, span: SourceSpan);
}

impl DiagnosticReporter for Vec<(DiagnosticKind, SourceSpan)> {
    fn report(&mut self, kind: DiagnosticKind, span: SourceSpan) {
        self.push((kind, span));
    }
}

/// Checks one compilation unit. A span is reported at most once, however
/// many resolved elements lead to it.
#[derive(Debug, Clone)]
pub struct TypeArgumentsChecker {
    unit: String,
    reported: BTreeSet<TextRange>,
}

impl TypeArgumentsChecker {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            reported: BTreeSet::new(),
        }
    }

    pub fn check_file<T: SourceTree>(
        &mut self,
        tree: &T,
        resolved: &ResolvedFile,
        reporter: &mut dyn DiagnosticReporter,
    ) {
        for type_ref in &resolved.declared_types {
            self.check_type_ref(tree, type_ref, reporter);
        }
        for access in &resolved.accesses {
            self.check_qualified_access(tree, access, reporter);
        }
    }

    pub fn check_qualified_access<T: SourceTree>(
        &mut self,
        tree: &T,
        access: &QualifiedAccess,
        reporter: &mut dyn DiagnosticReporter,
    ) {
        for argument in &access.type_arguments {
            if let TypeProjection::WithVariance { type_ref, .. } = argument {
                self.check_type_ref(tree, type_ref, reporter);
            }
        }

        let Some(Receiver::ResolvedQualifier {
            symbol: None,
            source,
            path,
        }) = &access.explicit_receiver
        else {
            return;
        };
        let Some(node) = tree.find_node(source.range, source.kind) else {
            return;
        };
        if let Some(last) = tree.last_child(node) {
            if tree.kind(last) == SyntaxKind::TypeArgumentList {
                trace!(package = %path, callee = %access.callee_name, "type arguments on package qualifier");
                self.report(tree.range(last), reporter);
            }
        }
    }

    /// A type-parameter reference must not carry type arguments; class
    /// types are checked through their arguments.
    pub fn check_type_ref<T: SourceTree>(
        &mut self,
        tree: &T,
        type_ref: &ResolvedTypeRef,
        reporter: &mut dyn DiagnosticReporter,
    ) {
        match &type_ref.ty {
            ConeType::TypeParameter { name } => {
                let Some(source) = type_ref.source else {
                    return;
                };
                if source.kind == SyntaxKind::Error {
                    trace!(type_parameter = %name, "skipped: source is an error node");
                    return;
                }
                let Some(node) = tree.find_node(source.range, source.kind) else {
                    return;
                };
                let Some(list) = tree
                    .find_child(node, SyntaxKind::ReferenceExpression)
                    .and_then(|reference| tree.next_sibling(reference))
                    .filter(|sibling| tree.kind(*sibling) == SyntaxKind::TypeArgumentList)
                else {
                    return;
                };
                trace!(type_parameter = %name, "type arguments on type parameter");
                self.report(tree.range(list), reporter);
            }
            ConeType::Class { arguments, .. } => {
                for argument in arguments {
                    if let TypeProjection::WithVariance { type_ref, .. } = argument {
                        self.check_type_ref(tree, type_ref, reporter);
                    }
                }
            }
            ConeType::Error { .. } => {}
        }
    }

    fn report(&mut self, range: TextRange, reporter: &mut dyn DiagnosticReporter) {
        if !self.reported.insert(range) {
            return;
        }
        reporter.report(
            DiagnosticKind::TypeArgumentsNotAllowed,
            SourceSpan {
                unit: self.unit.clone(),
                start: range.start,
                end: range.end,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_tree::ParseTree;
    use crate::parser::parse;
    use crate::resolve::resolve_file;

    fn spans(source: &str) -> Vec<(u32, u32)> {
        let tree = ParseTree::build(source, &parse(source).events);
        let resolved = resolve_file(&tree, &[]);
        let mut found: Vec<(DiagnosticKind, SourceSpan)> = Vec::new();
        TypeArgumentsChecker::new("t.kt").check_file(&tree, &resolved, &mut found);
        found.into_iter().map(|(_, s)| (s.start, s.end)).collect()
    }

    #[test]
    fn nested_type_argument_on_type_parameter() {
        let source = "class C<T> { val x: List<T<Int>> }";
        let start = source.find("<Int>").expect("segment") as u32;
        assert_eq!(spans(source), vec![(start, start + 5)]);
    }

    #[test]
    fn class_type_arguments_are_fine() {
        assert!(spans("class C<T> { val x: List<T> }").is_empty());
    }

    #[test]
    fn same_span_is_reported_once() {
        let mut checker = TypeArgumentsChecker::new("u");
        let mut found: Vec<(DiagnosticKind, SourceSpan)> = Vec::new();
        checker.report(TextRange::new(1, 3), &mut found);
        checker.report(TextRange::new(1, 3), &mut found);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0.name(), "TYPE_ARGUMENTS_NOT_ALLOWED");
    }
}
