//! Materialized syntax tree: one arena entry per node and token, linked to
//! parent, children and siblings.

use crate::parser::Event;
use crate::source_tree::{SourceTree, TextRange};
use crate::syntax_kind::SyntaxKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

#[derive(Debug, Clone)]
struct NodeData {
    kind: SyntaxKind,
    range: TextRange,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
    prev_sibling: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct ParseTree {
    source: String,
    nodes: Vec<NodeData>,
}

impl ParseTree {
    pub fn build(source: &str, events: &[Event]) -> Self {
        let mut tree = ParseTree {
            source: source.to_string(),
            nodes: Vec::with_capacity(events.len()),
        };
        let mut open: Vec<(NodeId, bool)> = Vec::new();
        for event in events {
            match *event {
                Event::Start { kind, pos } => {
                    let parent = open.last().map(|(id, _)| *id);
                    let id = tree.push(kind, TextRange::empty(pos), parent);
                    open.push((id, false));
                }
                Event::Token { kind, range } => {
                    let parent = open.last().map(|(id, _)| *id);
                    tree.push(kind, range, parent);
                    for (id, seen_token) in open.iter_mut() {
                        let node = &mut tree.nodes[id.0 as usize];
                        if !*seen_token {
                            node.range.start = range.start;
                            *seen_token = true;
                        }
                        node.range.end = range.end;
                    }
                }
                Event::Finish => {
                    open.pop();
                }
            }
        }
        if tree.nodes.is_empty() {
            tree.push(SyntaxKind::File, TextRange::empty(0), None);
        }
        tree
    }

    fn push(&mut self, kind: SyntaxKind, range: TextRange, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            range,
            parent,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
        });
        if let Some(parent) = parent {
            let previous = self.nodes[parent.0 as usize].last_child;
            match previous {
                Some(prev) => {
                    self.nodes[prev.0 as usize].next_sibling = Some(id);
                    self.nodes[id.0 as usize].prev_sibling = Some(prev);
                }
                None => self.nodes[parent.0 as usize].first_child = Some(id),
            }
            self.nodes[parent.0 as usize].last_child = Some(id);
        }
        id
    }

    fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).first_child
    }

    pub fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).prev_sibling
    }
}

impl SourceTree for ParseTree {
    type Node = NodeId;

    fn source(&self) -> &str {
        &self.source
    }

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn kind(&self, node: NodeId) -> SyntaxKind {
        self.data(node).kind
    }

    fn range(&self, node: NodeId) -> TextRange {
        self.data(node).range
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut next = self.data(node).first_child;
        while let Some(child) = next {
            out.push(child);
            next = self.data(child).next_sibling;
        }
        out
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).parent
    }

    fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).last_child
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).next_sibling
    }
}
