/// Token and node kinds shared by the lexer, the parser and both trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SyntaxKind {
    // Tokens.
    Whitespace,
    Comment,
    Identifier,
    IntLiteral,
    StringLiteral,
    PackageKw,
    ClassKw,
    InterfaceKw,
    FunKw,
    ValKw,
    VarKw,
    ReturnKw,
    InKw,
    OutKw,
    NullKw,
    TrueKw,
    FalseKw,
    LAngle,
    RAngle,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Question,
    Star,
    Eq,
    Semicolon,
    Unknown,

    // Nodes.
    File,
    PackageDirective,
    Class,
    TypeParameterList,
    TypeParameter,
    SuperTypeList,
    ClassBody,
    Function,
    ValueParameterList,
    ValueParameter,
    Property,
    Block,
    TypeReference,
    NullableType,
    UserType,
    TypeArgumentList,
    TypeProjection,
    ReferenceExpression,
    CallExpression,
    DotQualifiedExpression,
    ValueArgumentList,
    ValueArgument,
    ReturnExpression,
    LiteralExpression,
    ParenthesizedExpression,
    Error,
}

const KEYWORDS: &[(&str, SyntaxKind)] = &[
    ("package", SyntaxKind::PackageKw),
    ("class", SyntaxKind::ClassKw),
    ("interface", SyntaxKind::InterfaceKw),
    ("fun", SyntaxKind::FunKw),
    ("val", SyntaxKind::ValKw),
    ("var", SyntaxKind::VarKw),
    ("return", SyntaxKind::ReturnKw),
    ("in", SyntaxKind::InKw),
    ("out", SyntaxKind::OutKw),
    ("null", SyntaxKind::NullKw),
    ("true", SyntaxKind::TrueKw),
    ("false", SyntaxKind::FalseKw),
];

impl SyntaxKind {
    pub fn keyword(ident: &str) -> Option<SyntaxKind> {
        KEYWORDS
            .iter()
            .find_map(|(name, kind)| (*name == ident).then_some(*kind))
    }

    pub fn is_token(self) -> bool {
        self <= SyntaxKind::Unknown
    }

    pub fn is_trivia(self) -> bool {
        matches!(self, SyntaxKind::Whitespace | SyntaxKind::Comment)
    }

    /// Tokens that can appear where a name is expected. Soft keywords like
    /// `in` and `out` are only reserved inside type argument lists.
    pub fn is_name(self) -> bool {
        matches!(self, SyntaxKind::Identifier)
    }

    pub fn can_start_expression(self) -> bool {
        matches!(
            self,
            SyntaxKind::Identifier
                | SyntaxKind::IntLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::NullKw
                | SyntaxKind::TrueKw
                | SyntaxKind::FalseKw
                | SyntaxKind::LParen
        )
    }
}
