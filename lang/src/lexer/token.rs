#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Integer(i64),
    Decimal(f64),
    String(String),
    Character(char),

    /// Raw body text between `{` and its matching `}`
    Block(String),

    // Variables
    Variable(char), // A..Z
    Assign(char),   // :X

    // Array delimiters
    OpenBracket,  // [
    CloseBracket, // ]

    /// Symbol owned by the operator table
    Operator(&'static str),

    // End of file
    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Integer(n) => write!(f, "{n}"),
            TokenKind::Decimal(n) => write!(f, "{n}"),
            TokenKind::String(s) => write!(f, "{s:?}"),
            TokenKind::Character(c) => write!(f, "'{c}"),
            TokenKind::Block(body) => write!(f, "{{{body}}}"),
            TokenKind::Variable(name) => write!(f, "{name}"),
            TokenKind::Assign(name) => write!(f, ":{name}"),
            TokenKind::OpenBracket => write!(f, "["),
            TokenKind::CloseBracket => write!(f, "]"),
            TokenKind::Operator(symbol) => write!(f, "{symbol}"),
            TokenKind::Eof => write!(f, "EOF"),
        }
    }
}
