//! Navigation shared by the materialized and the flyweight syntax trees.
//!
//! Implementors provide the primitive queries; everything else is written
//! once here, so an algorithm sees the same nodes in the same order no matter
//! which tree it runs on.

use std::fmt::Write as _;

use crate::syntax_kind::SyntaxKind;

/// Half-open byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TextRange {
    pub start: u32,
    pub end: u32,
}

impl TextRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn empty(at: u32) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub fn contains_range(self, other: TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

pub trait SourceTree {
    type Node: Copy + Eq + std::fmt::Debug;

    fn source(&self) -> &str;
    fn root(&self) -> Self::Node;
    fn kind(&self, node: Self::Node) -> SyntaxKind;
    fn range(&self, node: Self::Node) -> TextRange;
    /// Child nodes and tokens in source order. Trivia is not part of the tree.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    fn text(&self, node: Self::Node) -> &str {
        let range = self.range(node);
        self.source()
            .get(range.start as usize..range.end as usize)
            .unwrap_or("")
    }

    fn last_child(&self, node: Self::Node) -> Option<Self::Node> {
        self.children(node).last().copied()
    }

    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let at = siblings.iter().position(|n| *n == node)?;
        siblings.get(at + 1).copied()
    }

    fn find_child(&self, node: Self::Node, kind: SyntaxKind) -> Option<Self::Node> {
        self.children(node)
            .into_iter()
            .find(|child| self.kind(*child) == kind)
    }

    fn children_of_kind(&self, node: Self::Node, kind: SyntaxKind) -> Vec<Self::Node> {
        self.children(node)
            .into_iter()
            .filter(|child| self.kind(*child) == kind)
            .collect()
    }

    /// Pre-order search for the outermost node of `kind` spanning exactly
    /// `range`. Only subtrees whose range covers `range` are entered.
    fn find_node(&self, range: TextRange, kind: SyntaxKind) -> Option<Self::Node> {
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            let node_range = self.range(node);
            if !node_range.contains_range(range) {
                continue;
            }
            if node_range == range && self.kind(node) == kind {
                return Some(node);
            }
            let mut children = self.children(node);
            children.reverse();
            stack.extend(children);
        }
        None
    }

    /// `node` and everything below it, in pre-order.
    fn descendants(&self, node: Self::Node) -> Vec<Self::Node> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(next) = stack.pop() {
            out.push(next);
            let mut children = self.children(next);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// One line per node: `KIND@start..end`, tokens followed by their text.
    fn dump(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self.root(), 0usize)];
        while let Some((node, depth)) = stack.pop() {
            let kind = self.kind(node);
            let range = self.range(node);
            let _ = write!(
                out,
                "{}{kind:?}@{}..{}",
                "  ".repeat(depth),
                range.start,
                range.end
            );
            if kind.is_token() {
                let _ = write!(out, " {:?}", self.text(node));
            }
            out.push('\n');
            let mut children = self.children(node);
            children.reverse();
            stack.extend(children.into_iter().map(|c| (c, depth + 1)));
        }
        out
    }
}
