//! Recursive-descent parser producing a flat event buffer.
//!
//! Events are the only parser output. Both syntax trees are built from the
//! same buffer, which is what keeps their node ranges identical.
//! Trivia never reaches the buffer.

use tracing::trace;

use crate::lexer::{tokenize, Token};
use crate::source_tree::TextRange;
use crate::syntax_kind::SyntaxKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Opens a node. `pos` is where an empty node sits.
    Start { kind: SyntaxKind, pos: u32 },
    Token { kind: SyntaxKind, range: TextRange },
    Finish,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    pub events: Vec<Event>,
    pub errors: Vec<ParseError>,
}

pub fn parse(source: &str) -> Parse {
    let tokens: Vec<Token> = tokenize(source)
        .into_iter()
        .filter(|t| !t.kind.is_trivia())
        .collect();
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len() as u32,
        events: Vec::new(),
        errors: Vec::new(),
    };
    parser.file();
    trace!(
        events = parser.events.len(),
        errors = parser.errors.len(),
        "parsed source"
    );
    Parse {
        events: parser.events,
        errors: parser.errors,
    }
}

struct Marker(usize);

#[derive(Clone, Copy)]
struct CompletedMarker(usize);

/// Tokens that close an enclosing construct; error recovery stops at them
/// instead of swallowing them.
const RECOVERY_SET: &[SyntaxKind] = &[
    SyntaxKind::RAngle,
    SyntaxKind::RParen,
    SyntaxKind::RBrace,
    SyntaxKind::LBrace,
    SyntaxKind::Comma,
    SyntaxKind::Eq,
    SyntaxKind::Semicolon,
    SyntaxKind::ClassKw,
    SyntaxKind::InterfaceKw,
    SyntaxKind::FunKw,
    SyntaxKind::ValKw,
    SyntaxKind::VarKw,
];

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end: u32,
    events: Vec<Event>,
    errors: Vec<ParseError>,
}

impl Parser {
    fn current(&self) -> Option<SyntaxKind> {
        self.nth(0)
    }

    fn nth(&self, n: usize) -> Option<SyntaxKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == Some(kind)
    }

    fn at_any(&self, kinds: &[SyntaxKind]) -> bool {
        self.current().is_some_and(|k| kinds.contains(&k))
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn current_pos(&self) -> u32 {
        self.tokens
            .get(self.pos)
            .map(|t| t.range.start)
            .unwrap_or(self.end)
    }

    fn start(&mut self) -> Marker {
        let index = self.events.len();
        self.events.push(Event::Start {
            kind: SyntaxKind::Error,
            pos: self.current_pos(),
        });
        Marker(index)
    }

    fn complete(&mut self, marker: Marker, kind: SyntaxKind) -> CompletedMarker {
        if let Some(Event::Start { kind: slot, .. }) = self.events.get_mut(marker.0) {
            *slot = kind;
        }
        self.events.push(Event::Finish);
        CompletedMarker(marker.0)
    }

    /// Opens a node that becomes the parent of the already completed one.
    fn precede(&mut self, completed: CompletedMarker) -> Marker {
        let pos = match self.events.get(completed.0) {
            Some(Event::Start { pos, .. }) => *pos,
            _ => self.current_pos(),
        };
        self.events.insert(
            completed.0,
            Event::Start {
                kind: SyntaxKind::Error,
                pos,
            },
        );
        Marker(completed.0)
    }

    fn bump(&mut self) {
        if let Some(token) = self.tokens.get(self.pos) {
            self.events.push(Event::Token {
                kind: token.kind,
                range: token.range,
            });
            self.pos += 1;
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        let range = self
            .tokens
            .get(self.pos)
            .map(|t| t.range)
            .unwrap_or(TextRange::empty(self.end));
        self.errors.push(ParseError {
            message: message.into(),
            range,
        });
    }

    fn expect(&mut self, kind: SyntaxKind, what: &str) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            self.error(format!("expected {what}"));
            false
        }
    }

    fn expect_name(&mut self) -> bool {
        if self.current().is_some_and(SyntaxKind::is_name) {
            self.bump();
            true
        } else {
            self.error("expected a name");
            false
        }
    }

    fn file(&mut self) {
        let m = self.start();
        if self.at(SyntaxKind::PackageKw) {
            self.package_directive();
        }
        while !self.at_end() {
            self.declaration();
        }
        self.complete(m, SyntaxKind::File);
    }

    fn package_directive(&mut self) {
        let m = self.start();
        self.bump();
        if self.expect_name() {
            while self.at(SyntaxKind::Dot) {
                self.bump();
                if !self.expect_name() {
                    break;
                }
            }
        }
        self.complete(m, SyntaxKind::PackageDirective);
    }

    fn declaration(&mut self) {
        match self.current() {
            Some(SyntaxKind::ClassKw | SyntaxKind::InterfaceKw) => self.class(),
            Some(SyntaxKind::FunKw) => self.function(),
            Some(SyntaxKind::ValKw | SyntaxKind::VarKw) => self.property(),
            Some(SyntaxKind::Semicolon) => self.bump(),
            _ => self.error_node("expected a declaration"),
        }
    }

    /// Wraps the current token in an `Error` node.
    fn error_node(&mut self, message: &str) {
        let m = self.start();
        self.error(message);
        self.bump();
        self.complete(m, SyntaxKind::Error);
    }

    fn class(&mut self) {
        let m = self.start();
        self.bump();
        self.expect_name();
        if self.at(SyntaxKind::LAngle) {
            self.type_parameter_list();
        }
        if self.at(SyntaxKind::LParen) {
            self.value_parameter_list();
        }
        if self.at(SyntaxKind::Colon) {
            self.bump();
            self.super_type_list();
        }
        if self.at(SyntaxKind::LBrace) {
            self.class_body();
        }
        self.complete(m, SyntaxKind::Class);
    }

    fn type_parameter_list(&mut self) {
        let m = self.start();
        self.bump();
        loop {
            self.type_parameter();
            if self.at(SyntaxKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(SyntaxKind::RAngle, "'>'");
        self.complete(m, SyntaxKind::TypeParameterList);
    }

    fn type_parameter(&mut self) {
        let m = self.start();
        if self.at_any(&[SyntaxKind::InKw, SyntaxKind::OutKw]) {
            self.bump();
        }
        self.expect_name();
        if self.at(SyntaxKind::Colon) {
            self.bump();
            self.type_reference();
        }
        self.complete(m, SyntaxKind::TypeParameter);
    }

    fn super_type_list(&mut self) {
        let m = self.start();
        loop {
            self.type_reference();
            if self.at(SyntaxKind::LParen) {
                self.value_argument_list();
            }
            if self.at(SyntaxKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.complete(m, SyntaxKind::SuperTypeList);
    }

    fn class_body(&mut self) {
        let m = self.start();
        self.bump();
        while !self.at_end() && !self.at(SyntaxKind::RBrace) {
            self.declaration();
        }
        self.expect(SyntaxKind::RBrace, "'}'");
        self.complete(m, SyntaxKind::ClassBody);
    }

    fn function(&mut self) {
        let m = self.start();
        self.bump();
        if self.at(SyntaxKind::LAngle) {
            self.type_parameter_list();
        }
        self.expect_name();
        if self.at(SyntaxKind::LParen) {
            self.value_parameter_list();
        } else {
            self.error("expected '('");
        }
        if self.at(SyntaxKind::Colon) {
            self.bump();
            self.type_reference();
        }
        if self.at(SyntaxKind::LBrace) {
            self.block();
        } else if self.at(SyntaxKind::Eq) {
            self.bump();
            self.expression();
        }
        self.complete(m, SyntaxKind::Function);
    }

    fn value_parameter_list(&mut self) {
        let m = self.start();
        self.bump();
        while !self.at_end() && !self.at(SyntaxKind::RParen) {
            self.value_parameter();
            if self.at(SyntaxKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(SyntaxKind::RParen, "')'");
        self.complete(m, SyntaxKind::ValueParameterList);
    }

    fn value_parameter(&mut self) {
        let m = self.start();
        self.expect_name();
        if self.expect(SyntaxKind::Colon, "':'") {
            self.type_reference();
        }
        if self.at(SyntaxKind::Eq) {
            self.bump();
            self.expression();
        }
        self.complete(m, SyntaxKind::ValueParameter);
    }

    fn property(&mut self) {
        let m = self.start();
        self.bump();
        self.expect_name();
        if self.at(SyntaxKind::Colon) {
            self.bump();
            self.type_reference();
        }
        if self.at(SyntaxKind::Eq) {
            self.bump();
            self.expression();
        }
        self.complete(m, SyntaxKind::Property);
    }

    fn block(&mut self) {
        let m = self.start();
        self.bump();
        while !self.at_end() && !self.at(SyntaxKind::RBrace) {
            self.statement();
        }
        self.expect(SyntaxKind::RBrace, "'}'");
        self.complete(m, SyntaxKind::Block);
    }

    fn statement(&mut self) {
        match self.current() {
            Some(SyntaxKind::ValKw | SyntaxKind::VarKw) => self.property(),
            Some(SyntaxKind::ClassKw | SyntaxKind::InterfaceKw | SyntaxKind::FunKw) => {
                self.declaration()
            }
            Some(SyntaxKind::ReturnKw) => {
                let m = self.start();
                self.bump();
                if self.current().is_some_and(SyntaxKind::can_start_expression) {
                    self.expression();
                }
                self.complete(m, SyntaxKind::ReturnExpression);
            }
            Some(SyntaxKind::Semicolon) => self.bump(),
            Some(kind) if kind.can_start_expression() => self.expression(),
            _ => self.error_node("expected a statement"),
        }
    }

    fn type_reference(&mut self) {
        let m = self.start();
        self.type_element();
        self.complete(m, SyntaxKind::TypeReference);
    }

    fn type_element(&mut self) {
        let element = if self.at(SyntaxKind::Identifier) {
            self.user_type()
        } else {
            let m = self.start();
            self.error("expected a type");
            if self.at(SyntaxKind::LAngle) {
                self.type_argument_list();
            } else if !self.at_end() && !self.at_any(RECOVERY_SET) {
                self.bump();
            }
            self.complete(m, SyntaxKind::Error)
        };
        if self.at(SyntaxKind::Question) {
            let m = self.precede(element);
            self.bump();
            self.complete(m, SyntaxKind::NullableType);
        }
    }

    /// `a.b.C<T>` nests qualifiers to the left:
    /// `UserType(UserType(UserType(a) . b) . C <T>)`. A malformed type argument
    /// list turns the enclosing user type into `Error`.
    fn user_type(&mut self) -> CompletedMarker {
        let m = self.start();
        self.reference_expression();
        let ok = !self.at(SyntaxKind::LAngle) || self.type_argument_list();
        let mut done = self.complete(m, if ok { SyntaxKind::UserType } else { SyntaxKind::Error });
        if !ok {
            return done;
        }
        while self.at(SyntaxKind::Dot) && self.nth(1) == Some(SyntaxKind::Identifier) {
            let m = self.precede(done);
            self.bump();
            self.reference_expression();
            let ok = !self.at(SyntaxKind::LAngle) || self.type_argument_list();
            done = self.complete(m, if ok { SyntaxKind::UserType } else { SyntaxKind::Error });
            if !ok {
                break;
            }
        }
        done
    }

    fn reference_expression(&mut self) -> CompletedMarker {
        let m = self.start();
        self.bump();
        self.complete(m, SyntaxKind::ReferenceExpression)
    }

    /// Returns false when the list is missing its closing `>` or holds a
    /// broken entry, as in `T<>` or `T<,>`.
    fn type_argument_list(&mut self) -> bool {
        let errors_before = self.errors.len();
        let m = self.start();
        self.bump();
        loop {
            self.type_projection();
            if self.at(SyntaxKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(SyntaxKind::RAngle, "'>'");
        self.complete(m, SyntaxKind::TypeArgumentList);
        self.errors.len() == errors_before
    }

    fn type_projection(&mut self) {
        let m = self.start();
        if self.at(SyntaxKind::Star) {
            self.bump();
        } else {
            if self.at_any(&[SyntaxKind::InKw, SyntaxKind::OutKw]) {
                self.bump();
            }
            self.type_reference();
        }
        self.complete(m, SyntaxKind::TypeProjection);
    }

    fn expression(&mut self) {
        let mut lhs = self.atom();
        while self.at(SyntaxKind::Dot) {
            let m = self.precede(lhs);
            self.bump();
            if self.at(SyntaxKind::Identifier) {
                self.call_or_reference();
            } else {
                self.error("expected a name after '.'");
            }
            lhs = self.complete(m, SyntaxKind::DotQualifiedExpression);
        }
    }

    fn atom(&mut self) -> CompletedMarker {
        match self.current() {
            Some(SyntaxKind::Identifier) => self.call_or_reference(),
            Some(
                SyntaxKind::IntLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::NullKw
                | SyntaxKind::TrueKw
                | SyntaxKind::FalseKw,
            ) => {
                let m = self.start();
                self.bump();
                self.complete(m, SyntaxKind::LiteralExpression)
            }
            Some(SyntaxKind::LParen) => {
                let m = self.start();
                self.bump();
                self.expression();
                self.expect(SyntaxKind::RParen, "')'");
                self.complete(m, SyntaxKind::ParenthesizedExpression)
            }
            _ => {
                let m = self.start();
                self.error("expected an expression");
                if !self.at_end() && !self.at_any(RECOVERY_SET) {
                    self.bump();
                }
                self.complete(m, SyntaxKind::Error)
            }
        }
    }

    /// `f`, `f(args)`, `f<T>` and `f<T>(args)`.
    fn call_or_reference(&mut self) -> CompletedMarker {
        let reference = self.reference_expression();
        if self.at(SyntaxKind::LAngle) {
            let m = self.precede(reference);
            let ok = self.type_argument_list();
            if self.at(SyntaxKind::LParen) {
                self.value_argument_list();
            }
            return self.complete(
                m,
                if ok {
                    SyntaxKind::CallExpression
                } else {
                    SyntaxKind::Error
                },
            );
        }
        if self.at(SyntaxKind::LParen) {
            let m = self.precede(reference);
            self.value_argument_list();
            return self.complete(m, SyntaxKind::CallExpression);
        }
        reference
    }

    fn value_argument_list(&mut self) {
        let m = self.start();
        self.bump();
        while !self.at_end() && !self.at(SyntaxKind::RParen) {
            let argument = self.start();
            self.expression();
            self.complete(argument, SyntaxKind::ValueArgument);
            if self.at(SyntaxKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(SyntaxKind::RParen, "')'");
        self.complete(m, SyntaxKind::ValueArgumentList);
    }
}
