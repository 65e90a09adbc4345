//! Flyweight syntax tree. Nodes are indices into the parser's event buffer;
//! nothing is linked, and every structural query rescans the buffer through
//! [`LightTreeStructure`].

use crate::parser::Event;
use crate::source_tree::{SourceTree, TextRange};
use crate::syntax_kind::SyntaxKind;

/// Index of the `Start` or `Token` event a node was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LightNode(u32);

#[derive(Debug, Clone)]
pub struct LightTree {
    source: String,
    events: Vec<Event>,
}

impl LightTree {
    pub fn new(source: &str, events: Vec<Event>) -> Self {
        let events = if events.is_empty() {
            vec![
                Event::Start {
                    kind: SyntaxKind::File,
                    pos: 0,
                },
                Event::Finish,
            ]
        } else {
            events
        };
        Self {
            source: source.to_string(),
            events,
        }
    }

    pub fn structure(&self) -> LightTreeStructure<'_> {
        LightTreeStructure {
            events: &self.events,
        }
    }
}

/// Structural queries over a borrowed event buffer.
#[derive(Debug, Clone, Copy)]
pub struct LightTreeStructure<'a> {
    events: &'a [Event],
}

impl LightTreeStructure<'_> {
    pub fn kind(&self, node: LightNode) -> SyntaxKind {
        match self.events[node.0 as usize] {
            Event::Start { kind, .. } | Event::Token { kind, .. } => kind,
            Event::Finish => SyntaxKind::Error,
        }
    }

    pub fn children(&self, node: LightNode) -> Vec<LightNode> {
        let mut out = Vec::new();
        if !matches!(self.events[node.0 as usize], Event::Start { .. }) {
            return out;
        }
        let mut depth = 0usize;
        for (i, event) in self.events.iter().enumerate().skip(node.0 as usize + 1) {
            match event {
                Event::Start { .. } => {
                    if depth == 0 {
                        out.push(LightNode(i as u32));
                    }
                    depth += 1;
                }
                Event::Token { .. } => {
                    if depth == 0 {
                        out.push(LightNode(i as u32));
                    }
                }
                Event::Finish => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
            }
        }
        out
    }

    pub fn parent(&self, node: LightNode) -> Option<LightNode> {
        let mut depth = 0usize;
        for i in (0..node.0 as usize).rev() {
            match self.events[i] {
                Event::Finish => depth += 1,
                Event::Start { .. } => {
                    if depth == 0 {
                        return Some(LightNode(i as u32));
                    }
                    depth -= 1;
                }
                Event::Token { .. } => {}
            }
        }
        None
    }

    /// First token start to last token end; a node without tokens is empty
    /// at its start position.
    pub fn range(&self, node: LightNode) -> TextRange {
        let (pos, from) = match self.events[node.0 as usize] {
            Event::Token { range, .. } => return range,
            Event::Start { pos, .. } => (pos, node.0 as usize + 1),
            Event::Finish => return TextRange::default(),
        };
        let mut first: Option<u32> = None;
        let mut last = pos;
        let mut depth = 0usize;
        for event in &self.events[from..] {
            match event {
                Event::Start { .. } => depth += 1,
                Event::Token { range, .. } => {
                    first.get_or_insert(range.start);
                    last = range.end;
                }
                Event::Finish => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
            }
        }
        match first {
            Some(start) => TextRange::new(start, last),
            None => TextRange::empty(pos),
        }
    }
}

impl SourceTree for LightTree {
    type Node = LightNode;

    fn source(&self) -> &str {
        &self.source
    }

    fn root(&self) -> LightNode {
        LightNode(0)
    }

    fn kind(&self, node: LightNode) -> SyntaxKind {
        self.structure().kind(node)
    }

    fn range(&self, node: LightNode) -> TextRange {
        self.structure().range(node)
    }

    fn children(&self, node: LightNode) -> Vec<LightNode> {
        self.structure().children(node)
    }

    fn parent(&self, node: LightNode) -> Option<LightNode> {
        self.structure().parent(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_tree::ParseTree;
    use crate::parser::parse;

    #[test]
    fn dumps_match_the_materialized_tree() {
        for source in [
            "package p.q\nclass A<T>(x: T) : B<T>() { val y: T? = p.q.f<T>() }",
            "val x: T<String",
            "fun f() { return g<,>( }",
        ] {
            let parse = parse(source);
            let materialized = ParseTree::build(source, &parse.events);
            let light = LightTree::new(source, parse.events);
            assert_eq!(materialized.dump(), light.dump(), "for {source:?}");
        }
    }

    #[test]
    fn parent_inverts_children() {
        let source = "class A { fun f(): Map<String, List<Int>> = m() }";
        let tree = LightTree::new(source, parse(source).events);
        for node in tree.descendants(tree.root()) {
            for child in tree.children(node) {
                assert_eq!(tree.parent(child), Some(node));
            }
        }
        assert_eq!(tree.parent(tree.root()), None);
    }
}
