use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token. For string literals this is the decoded
    /// value; for suffixed base-12 numerals it is the `<digits>.b12` form.
    pub lexeme: Box<str>,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<Box<str>>, line: usize, column: usize) -> Token {
        Token {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
        }
    }

    /// Constructs a token without source text (layout and end-of-input).
    pub fn synthetic(kind: TokenKind, line: usize, column: usize) -> Token {
        Token::new(kind, "", line, column)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {}:{}", self.kind, self.line, self.column)?;
        if !self.lexeme.is_empty() {
            write!(f, ", {:?}", self.lexeme)?;
        }
        write!(f, ")")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    Newline,
    Indent,
    Dedent,

    Identifier,
    Int,
    Float,
    String,

    Colon,
    Comma,
    LParen,
    RParen,
    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    /// `..`
    Range,
    /// `->`
    Arrow,

    Package,
    Use,
    Fn,
    Let,
    Var,
    Return,
    If,
    Else,
    While,
    For,
    In,
    Say,
}

impl TokenKind {
    /// Whether this token closes a statement's line or an enclosing block.
    pub fn ends_statement(self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Dedent | TokenKind::Eof)
    }
}

pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "package" => TokenKind::Package,
    "use" => TokenKind::Use,
    "fn" => TokenKind::Fn,
    "let" => TokenKind::Let,
    "var" => TokenKind::Var,
    "return" => TokenKind::Return,
    "if" => TokenKind::If,
    "else" => TokenKind::Else,
    "while" => TokenKind::While,
    "for" => TokenKind::For,
    "in" => TokenKind::In,
    "say" => TokenKind::Say,
};
