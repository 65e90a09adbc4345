use crate::source_tree::TextRange;
use crate::syntax_kind::SyntaxKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub range: TextRange,
}

/// Splits `source` into tokens, trivia included. Never fails: bytes that
/// start no token become `Unknown` tokens for the parser to report.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    lexer.lex_all();
    lexer.tokens
}

struct Lexer<'a> {
    source: &'a str,
    iter: std::str::CharIndices<'a>,
    lookahead: Option<(usize, char)>,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        let mut iter = source.char_indices();
        let lookahead = iter.next();
        Self {
            source,
            iter,
            lookahead,
            tokens: Vec::new(),
        }
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let current = self.lookahead;
        self.lookahead = self.iter.next();
        current
    }

    fn offset(&self) -> usize {
        self.lookahead.map(|(i, _)| i).unwrap_or(self.source.len())
    }

    fn peek_second(&self) -> Option<char> {
        self.iter.clone().next().map(|(_, c)| c)
    }

    fn push(&mut self, kind: SyntaxKind, start: usize) {
        let end = self.offset();
        self.tokens.push(Token {
            kind,
            range: TextRange::new(start as u32, end as u32),
        });
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some((_, c)) = self.lookahead {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    fn lex_all(&mut self) {
        while let Some((start, ch)) = self.lookahead {
            match ch {
                c if c.is_whitespace() => {
                    self.eat_while(char::is_whitespace);
                    self.push(SyntaxKind::Whitespace, start);
                }
                '/' if self.peek_second() == Some('/') => {
                    self.eat_while(|c| c != '\n');
                    self.push(SyntaxKind::Comment, start);
                }
                c if c.is_alphabetic() || c == '_' => {
                    self.eat_while(|c| c.is_alphanumeric() || c == '_');
                    let text = &self.source[start..self.offset()];
                    let kind = SyntaxKind::keyword(text).unwrap_or(SyntaxKind::Identifier);
                    self.push(kind, start);
                }
                c if c.is_ascii_digit() => {
                    self.eat_while(|c| c.is_ascii_digit() || c == '_');
                    self.push(SyntaxKind::IntLiteral, start);
                }
                '"' => {
                    self.bump();
                    let mut escaped = false;
                    while let Some((_, c)) = self.lookahead {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                        if escaped {
                            escaped = false;
                        } else if c == '\\' {
                            escaped = true;
                        } else if c == '"' {
                            break;
                        }
                    }
                    self.push(SyntaxKind::StringLiteral, start);
                }
                _ => {
                    self.bump();
                    let kind = match ch {
                        '<' => SyntaxKind::LAngle,
                        '>' => SyntaxKind::RAngle,
                        '(' => SyntaxKind::LParen,
                        ')' => SyntaxKind::RParen,
                        '{' => SyntaxKind::LBrace,
                        '}' => SyntaxKind::RBrace,
                        ',' => SyntaxKind::Comma,
                        ':' => SyntaxKind::Colon,
                        '.' => SyntaxKind::Dot,
                        '?' => SyntaxKind::Question,
                        '*' => SyntaxKind::Star,
                        '=' => SyntaxKind::Eq,
                        ';' => SyntaxKind::Semicolon,
                        _ => SyntaxKind::Unknown,
                    };
                    self.push(kind, start);
                }
            }
        }
    }
}
