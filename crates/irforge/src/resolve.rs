//! A small, error-tolerant name resolver producing the model the checker
//! works on. It is written against [`SourceTree`] and never keeps tree
//! nodes: every resolved element points back into the source through a
//! tree-independent [`SourceElement`].

use std::collections::BTreeSet;

use tracing::trace;

use crate::ir::Variance;
use crate::source_tree::{SourceTree, TextRange};
use crate::syntax_kind::SyntaxKind;

pub const BUILTIN_CLASSES: &[&str] = &[
    "Any", "Unit", "Nothing", "Int", "Boolean", "String", "List", "Map", "Array",
];

/// Where a resolved element came from: enough to find the node again in
/// either tree built from the same source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceElement {
    pub range: TextRange,
    pub kind: SyntaxKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConeType {
    TypeParameter { name: String },
    Class { name: String, arguments: Vec<TypeProjection> },
    Error { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTypeRef {
    pub ty: ConeType,
    pub source: Option<SourceElement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeProjection {
    Star,
    /// `_`: the argument is left to inference.
    Placeholder,
    WithVariance {
        variance: Variance,
        type_ref: ResolvedTypeRef,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// A package (`symbol` is `None`) or class name used as a qualifier.
    /// `source` is the node of the last qualifier segment.
    ResolvedQualifier {
        path: String,
        symbol: Option<String>,
        source: SourceElement,
    },
    Expression {
        source: SourceElement,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedAccess {
    pub source: SourceElement,
    pub callee_name: String,
    pub type_arguments: Vec<TypeProjection>,
    pub explicit_receiver: Option<Receiver>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFile {
    pub package: String,
    pub accesses: Vec<QualifiedAccess>,
    /// Declared types of properties, parameters, returns, bounds and
    /// super types, in source order.
    pub declared_types: Vec<ResolvedTypeRef>,
}

pub fn resolve_file<T: SourceTree>(tree: &T, known_packages: &[String]) -> ResolvedFile {
    let root = tree.root();
    let package = tree
        .find_child(root, SyntaxKind::PackageDirective)
        .map(|directive| dotted_name(tree, directive))
        .unwrap_or_default();

    let mut packages = BTreeSet::new();
    for name in known_packages
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(package.as_str()))
    {
        let mut prefix = String::new();
        for segment in name.split('.').filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);
            packages.insert(prefix.clone());
        }
    }

    let mut classes: BTreeSet<String> = BUILTIN_CLASSES.iter().map(|s| s.to_string()).collect();
    for node in tree.descendants(root) {
        if tree.kind(node) == SyntaxKind::Class {
            if let Some(name) = tree.find_child(node, SyntaxKind::Identifier) {
                classes.insert(tree.text(name).to_string());
            }
        }
    }

    let mut resolver = Resolver {
        tree,
        packages,
        classes,
        scopes: Vec::new(),
        out: ResolvedFile {
            package,
            ..Default::default()
        },
    };
    resolver.declarations(root);
    trace!(
        accesses = resolver.out.accesses.len(),
        declared_types = resolver.out.declared_types.len(),
        "resolved file"
    );
    resolver.out
}

fn dotted_name<T: SourceTree>(tree: &T, node: T::Node) -> String {
    tree.children_of_kind(node, SyntaxKind::Identifier)
        .into_iter()
        .map(|n| tree.text(n))
        .collect::<Vec<_>>()
        .join(".")
}

fn is_expression(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::ReferenceExpression
            | SyntaxKind::CallExpression
            | SyntaxKind::DotQualifiedExpression
            | SyntaxKind::LiteralExpression
            | SyntaxKind::ParenthesizedExpression
    )
}

struct Resolver<'t, T: SourceTree> {
    tree: &'t T,
    packages: BTreeSet<String>,
    classes: BTreeSet<String>,
    scopes: Vec<Vec<String>>,
    out: ResolvedFile,
}

impl<T: SourceTree> Resolver<'_, T> {
    fn element(&self, node: T::Node) -> SourceElement {
        SourceElement {
            range: self.tree.range(node),
            kind: self.tree.kind(node),
        }
    }

    fn is_type_parameter(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|scope| scope.iter().any(|p| p == name))
    }

    fn declarations(&mut self, node: T::Node) {
        for child in self.tree.children(node) {
            self.declaration(child);
        }
    }

    fn declaration(&mut self, node: T::Node) {
        match self.tree.kind(node) {
            SyntaxKind::Class => self.class(node),
            SyntaxKind::Function => self.function(node),
            SyntaxKind::Property => self.property(node),
            _ => {}
        }
    }

    /// Opens a scope with the type parameters declared by `owner`, then
    /// resolves their bounds inside it.
    fn push_type_parameters(&mut self, owner: T::Node) {
        let params = self
            .tree
            .find_child(owner, SyntaxKind::TypeParameterList)
            .map(|list| self.tree.children_of_kind(list, SyntaxKind::TypeParameter))
            .unwrap_or_default();
        let names = params
            .iter()
            .filter_map(|p| self.tree.find_child(*p, SyntaxKind::Identifier))
            .map(|n| self.tree.text(n).to_string())
            .collect();
        self.scopes.push(names);
        for param in params {
            if let Some(bound) = self.tree.find_child(param, SyntaxKind::TypeReference) {
                self.declared_type(bound);
            }
        }
    }

    fn class(&mut self, node: T::Node) {
        self.push_type_parameters(node);
        for child in self.tree.children(node) {
            match self.tree.kind(child) {
                SyntaxKind::ValueParameterList => self.value_parameters(child),
                SyntaxKind::SuperTypeList => {
                    for entry in self.tree.children(child) {
                        match self.tree.kind(entry) {
                            SyntaxKind::TypeReference => self.declared_type(entry),
                            SyntaxKind::ValueArgumentList => self.value_arguments(entry),
                            _ => {}
                        }
                    }
                }
                SyntaxKind::ClassBody => self.declarations(child),
                _ => {}
            }
        }
        self.scopes.pop();
    }

    fn function(&mut self, node: T::Node) {
        self.push_type_parameters(node);
        for child in self.tree.children(node) {
            match self.tree.kind(child) {
                SyntaxKind::ValueParameterList => self.value_parameters(child),
                SyntaxKind::TypeReference => self.declared_type(child),
                SyntaxKind::Block => self.block(child),
                kind if is_expression(kind) => self.expression(child),
                _ => {}
            }
        }
        self.scopes.pop();
    }

    fn value_parameters(&mut self, list: T::Node) {
        for param in self.tree.children_of_kind(list, SyntaxKind::ValueParameter) {
            for child in self.tree.children(param) {
                match self.tree.kind(child) {
                    SyntaxKind::TypeReference => self.declared_type(child),
                    kind if is_expression(kind) => self.expression(child),
                    _ => {}
                }
            }
        }
    }

    fn property(&mut self, node: T::Node) {
        for child in self.tree.children(node) {
            match self.tree.kind(child) {
                SyntaxKind::TypeReference => self.declared_type(child),
                kind if is_expression(kind) => self.expression(child),
                _ => {}
            }
        }
    }

    fn block(&mut self, node: T::Node) {
        for child in self.tree.children(node) {
            match self.tree.kind(child) {
                SyntaxKind::Class | SyntaxKind::Function | SyntaxKind::Property => {
                    self.declaration(child)
                }
                SyntaxKind::ReturnExpression => {
                    for value in self.tree.children(child) {
                        if is_expression(self.tree.kind(value)) {
                            self.expression(value);
                        }
                    }
                }
                kind if is_expression(kind) => self.expression(child),
                _ => {}
            }
        }
    }

    fn declared_type(&mut self, type_reference: T::Node) {
        let resolved = self.type_reference(type_reference);
        self.out.declared_types.push(resolved);
    }

    fn type_reference(&self, node: T::Node) -> ResolvedTypeRef {
        let element = self.tree.children(node).into_iter().find(|c| {
            matches!(
                self.tree.kind(*c),
                SyntaxKind::UserType | SyntaxKind::NullableType | SyntaxKind::Error
            )
        });
        let element = match element {
            Some(e) if self.tree.kind(e) == SyntaxKind::NullableType => {
                self.tree.children(e).into_iter().find(|c| {
                    matches!(self.tree.kind(*c), SyntaxKind::UserType | SyntaxKind::Error)
                })
            }
            other => other,
        };
        match element {
            Some(element) => self.type_element(element),
            None => ResolvedTypeRef {
                ty: ConeType::Error {
                    reason: "missing type".to_string(),
                },
                source: None,
            },
        }
    }

    /// Qualifier segments of a user type, outermost first, each with its
    /// type argument list. `Error` nodes are read the same way.
    fn segments(&self, node: T::Node, out: &mut Vec<(String, Option<T::Node>)>) {
        let children = self.tree.children(node);
        if let Some(first) = children.first() {
            if matches!(self.tree.kind(*first), SyntaxKind::UserType | SyntaxKind::Error) {
                self.segments(*first, out);
            }
        }
        if let Some(reference) = self.tree.find_child(node, SyntaxKind::ReferenceExpression) {
            out.push((
                self.tree.text(reference).to_string(),
                self.tree.find_child(node, SyntaxKind::TypeArgumentList),
            ));
        }
    }

    fn type_element(&self, node: T::Node) -> ResolvedTypeRef {
        let source = Some(self.element(node));
        let mut segments = Vec::new();
        self.segments(node, &mut segments);
        let ty = match segments.as_slice() {
            [] => ConeType::Error {
                reason: "expected a type".to_string(),
            },
            [(name, _)] if self.is_type_parameter(name) => ConeType::TypeParameter { name: name.clone() },
            [.., (last, arguments)] => {
                let full = segments
                    .iter()
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>()
                    .join(".");
                if self.classes.contains(last) || self.classes.contains(&full) {
                    ConeType::Class {
                        name: full,
                        arguments: arguments
                            .map(|list| self.projections(list))
                            .unwrap_or_default(),
                    }
                } else {
                    ConeType::Error {
                        reason: format!("unresolved type {full}"),
                    }
                }
            }
        };
        ResolvedTypeRef { ty, source }
    }

    fn projections(&self, list: T::Node) -> Vec<TypeProjection> {
        self.tree
            .children_of_kind(list, SyntaxKind::TypeProjection)
            .into_iter()
            .map(|projection| self.projection(projection))
            .collect()
    }

    fn projection(&self, node: T::Node) -> TypeProjection {
        let mut variance = Variance::Invariant;
        let mut type_reference = None;
        for child in self.tree.children(node) {
            match self.tree.kind(child) {
                SyntaxKind::Star => return TypeProjection::Star,
                SyntaxKind::InKw => variance = Variance::In,
                SyntaxKind::OutKw => variance = Variance::Out,
                SyntaxKind::TypeReference => type_reference = Some(child),
                _ => {}
            }
        }
        let Some(type_reference) = type_reference else {
            return TypeProjection::Star;
        };
        if self.tree.text(type_reference) == "_" {
            return TypeProjection::Placeholder;
        }
        TypeProjection::WithVariance {
            variance,
            type_ref: self.type_reference(type_reference),
        }
    }

    fn expression(&mut self, node: T::Node) {
        match self.tree.kind(node) {
            SyntaxKind::ReferenceExpression => {
                let access = QualifiedAccess {
                    source: self.element(node),
                    callee_name: self.tree.text(node).to_string(),
                    type_arguments: Vec::new(),
                    explicit_receiver: None,
                };
                self.out.accesses.push(access);
            }
            SyntaxKind::CallExpression => self.call(node, None),
            SyntaxKind::DotQualifiedExpression => self.dot_qualified(node),
            SyntaxKind::ParenthesizedExpression => {
                for child in self.tree.children(node) {
                    if is_expression(self.tree.kind(child)) {
                        self.expression(child);
                    }
                }
            }
            _ => {}
        }
    }

    fn call(&mut self, node: T::Node, receiver: Option<Receiver>) {
        let callee_name = self
            .tree
            .find_child(node, SyntaxKind::ReferenceExpression)
            .map(|r| self.tree.text(r).to_string())
            .unwrap_or_default();
        let type_arguments = self
            .tree
            .find_child(node, SyntaxKind::TypeArgumentList)
            .map(|list| self.projections(list))
            .unwrap_or_default();
        let access = QualifiedAccess {
            source: self.element(node),
            callee_name,
            type_arguments,
            explicit_receiver: receiver,
        };
        self.out.accesses.push(access);
        if let Some(arguments) = self.tree.find_child(node, SyntaxKind::ValueArgumentList) {
            self.value_arguments(arguments);
        }
    }

    fn value_arguments(&mut self, list: T::Node) {
        for argument in self.tree.children_of_kind(list, SyntaxKind::ValueArgument) {
            for child in self.tree.children(argument) {
                if is_expression(self.tree.kind(child)) {
                    self.expression(child);
                }
            }
        }
    }

    fn dot_qualified(&mut self, node: T::Node) {
        let children = self.tree.children(node);
        let (Some(&receiver), Some(&selector)) = (children.first(), children.last()) else {
            return;
        };
        let receiver = match self.qualifier_path(receiver) {
            Some((path, last)) if self.packages.contains(&path) => Receiver::ResolvedQualifier {
                path,
                symbol: None,
                source: self.element(last),
            },
            Some((path, last)) if self.classes.contains(&path) => Receiver::ResolvedQualifier {
                symbol: Some(path.clone()),
                path,
                source: self.element(last),
            },
            _ => {
                self.expression(receiver);
                Receiver::Expression {
                    source: self.element(receiver),
                }
            }
        };
        match self.tree.kind(selector) {
            SyntaxKind::ReferenceExpression => {
                let access = QualifiedAccess {
                    source: self.element(selector),
                    callee_name: self.tree.text(selector).to_string(),
                    type_arguments: Vec::new(),
                    explicit_receiver: Some(receiver),
                };
                self.out.accesses.push(access);
            }
            SyntaxKind::CallExpression => self.call(selector, Some(receiver)),
            _ => {}
        }
    }

    /// Dotted path of a receiver made only of names (type arguments allowed,
    /// value arguments not), with the node of its last segment.
    fn qualifier_path(&self, node: T::Node) -> Option<(String, T::Node)> {
        match self.tree.kind(node) {
            SyntaxKind::ReferenceExpression => Some((self.tree.text(node).to_string(), node)),
            SyntaxKind::CallExpression => {
                if self
                    .tree
                    .find_child(node, SyntaxKind::ValueArgumentList)
                    .is_some()
                {
                    return None;
                }
                let reference = self.tree.find_child(node, SyntaxKind::ReferenceExpression)?;
                Some((self.tree.text(reference).to_string(), node))
            }
            SyntaxKind::DotQualifiedExpression => {
                let children = self.tree.children(node);
                let (prefix, _) = self.qualifier_path(*children.first()?)?;
                let selector = *children.last()?;
                if !matches!(
                    self.tree.kind(selector),
                    SyntaxKind::ReferenceExpression | SyntaxKind::CallExpression
                ) {
                    return None;
                }
                let (name, last) = self.qualifier_path(selector)?;
                Some((format!("{prefix}.{name}"), last))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_tree::ParseTree;
    use crate::parser::parse;

    fn resolve(source: &str) -> ResolvedFile {
        let tree = ParseTree::build(source, &parse(source).events);
        resolve_file(&tree, &["kotlin.collections".to_string()])
    }

    #[test]
    fn type_parameter_in_scope_drops_arguments() {
        let file = resolve("class C<T> { val x: T<String> }");
        assert_eq!(file.declared_types.len(), 1);
        assert_eq!(
            file.declared_types[0].ty,
            ConeType::TypeParameter {
                name: "T".to_string()
            }
        );
        assert_eq!(
            file.declared_types[0].source.map(|s| s.kind),
            Some(SyntaxKind::UserType)
        );
    }

    #[test]
    fn package_receiver_is_a_qualifier() {
        let file = resolve("val x = kotlin.collections.listOf<Int>()");
        assert_eq!(file.accesses.len(), 1);
        let access = &file.accesses[0];
        assert_eq!(access.callee_name, "listOf");
        match &access.explicit_receiver {
            Some(Receiver::ResolvedQualifier { path, symbol, .. }) => {
                assert_eq!(path, "kotlin.collections");
                assert_eq!(symbol, &None);
            }
            other => panic!("unexpected receiver {other:?}"),
        }
    }

    #[test]
    fn projections_cover_star_placeholder_and_variance() {
        let file = resolve("val m: Map<*, out List<_>> = m");
        let ConeType::Class { arguments, .. } = &file.declared_types[0].ty else {
            panic!("expected a class type");
        };
        assert_eq!(arguments[0], TypeProjection::Star);
        let TypeProjection::WithVariance { variance, type_ref } = &arguments[1] else {
            panic!("expected a projection");
        };
        assert_eq!(*variance, Variance::Out);
        let ConeType::Class { arguments, .. } = &type_ref.ty else {
            panic!("expected List");
        };
        assert_eq!(arguments[0], TypeProjection::Placeholder);
    }

    #[test]
    fn unknown_names_are_error_types() {
        let file = resolve("val x: Missing");
        assert!(matches!(file.declared_types[0].ty, ConeType::Error { .. }));
    }
}
