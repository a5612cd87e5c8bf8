use log::trace;
use thiserror::Error;

use crate::token::{Token, TokenKind, KEYWORDS};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 8_192;

/// Lexes the provided string, producing the tokens into the provided buffer.
pub fn lex(src: &str, tokens: &mut Vec<Token>) -> Result<(), LexError> {
    assert_eq!(tokens.len(), 0, "must pass clean tokens buffer");
    let src = src.replace("\r\n", "\n");
    let mut lexer = Lexer {
        tokens,
        indents: vec![0],
        line: 1,
    };
    for (index, line) in src.split('\n').enumerate() {
        lexer.line = index + 1;
        lexer.lex_line(line)?;
    }
    lexer.finish();
    Ok(())
}

/// A convenience function that allocates a new buffer per lexed input and
/// returns it.
pub fn lex_in_new(src: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    lex(src, &mut tokens)?;
    Ok(tokens)
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{line}:{column}: {kind}")]
pub struct LexError {
    pub line: usize,
    pub column: usize,
    pub kind: LexErrorKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("tab character in indentation")]
    TabIndentation,
    #[error("dedent to depth {depth} does not match any enclosing block")]
    InconsistentDedent { depth: usize },
    #[error("base-12 literal cannot have a fractional part")]
    FractionalBase12,
}

/// The line-oriented driver: tracks block structure across lines and hands
/// the content of each non-blank line to a [`LineScanner`].
struct Lexer<'tok> {
    tokens: &'tok mut Vec<Token>,
    /// Depths of the currently open blocks. The base depth is never popped.
    indents: Vec<usize>,
    line: usize,
}

impl Lexer<'_> {
    fn lex_line(&mut self, raw: &str) -> Result<(), LexError> {
        let content = raw.trim_start_matches([' ', '\t']);
        if content.trim_end().is_empty() || content.starts_with('#') {
            return Ok(());
        }

        let leading = &raw[..raw.len() - content.len()];
        if let Some(offset) = leading.find('\t') {
            return Err(self.error(offset + 1, LexErrorKind::TabIndentation));
        }
        let depth = leading.len();
        self.indentation(depth)?;

        let scanner = LineScanner {
            src: content,
            line: self.line,
            cursor: 0,
            column: depth + 1,
            current_lo: 0,
            current_column: depth + 1,
            tokens: &mut *self.tokens,
        };
        let end_column = scanner.scan()?;
        self.produce(TokenKind::Newline, end_column);
        Ok(())
    }

    /// Compares the depth of a new line against the enclosing blocks.
    fn indentation(&mut self, depth: usize) -> Result<(), LexError> {
        if depth > self.top() {
            trace!("line {}: indent {} -> {depth}", self.line, self.top());
            self.indents.push(depth);
            self.produce(TokenKind::Indent, 1);
            return Ok(());
        }
        while depth < self.top() {
            trace!("line {}: dedent {} -> {depth}", self.line, self.top());
            self.indents.pop();
            self.produce(TokenKind::Dedent, 1);
        }
        if depth != self.top() {
            return Err(self.error(depth + 1, LexErrorKind::InconsistentDedent { depth }));
        }
        Ok(())
    }

    /// Closes every block still open and terminates the stream.
    fn finish(mut self) {
        while self.indents.len() > 1 {
            self.indents.pop();
            self.produce(TokenKind::Dedent, 1);
        }
        self.produce(TokenKind::Eof, 1);
        trace!("lexed {} tokens", self.tokens.len());
    }

    fn top(&self) -> usize {
        self.indents.last().copied().unwrap_or(0)
    }

    fn produce(&mut self, kind: TokenKind, column: usize) {
        self.tokens.push(Token::synthetic(kind, self.line, column));
    }

    fn error(&self, column: usize, kind: LexErrorKind) -> LexError {
        LexError {
            line: self.line,
            column,
            kind,
        }
    }
}

/// Scans the content of a single line, after its indentation.
struct LineScanner<'src, 'tok> {
    src: &'src str,
    line: usize,
    cursor: usize,
    column: usize,
    current_lo: usize,
    current_column: usize,
    tokens: &'tok mut Vec<Token>,
}

impl LineScanner<'_, '_> {
    /// Scans until the line is exhausted, returning the column just past its
    /// last character.
    fn scan(mut self) -> Result<usize, LexError> {
        use TokenKind::*;
        loop {
            let Some(c) = self.mark_bump() else {
                return Ok(self.column);
            };
            let kind = match c {
                ' ' | '\t' => continue,
                ':' => Colon,
                ',' => Comma,
                '(' => LParen,
                ')' => RParen,
                '+' => Plus,
                '-' => match self.peek() {
                    '>' => self.advance_with(Arrow),
                    _ => Minus,
                },
                '*' => Star,
                '/' => Slash,
                '=' => Assign,
                '.' => match self.peek() {
                    '.' => self.advance_with(Range),
                    _ => return Err(self.error(LexErrorKind::UnexpectedChar('.'))),
                },
                '"' => {
                    self.string()?;
                    continue;
                }
                't' | 'e' if self.starts_numeral() => {
                    self.number()?;
                    continue;
                }
                c if c.is_ascii_digit() => {
                    self.number()?;
                    continue;
                }
                c if c.is_ascii_alphabetic() || c == '_' => self.identifier_or_keyword(),
                c => return Err(self.error(LexErrorKind::UnexpectedChar(c))),
            };
            self.produce(kind);
        }
    }

    fn string(&mut self) -> Result<(), LexError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(LexErrorKind::UnterminatedString)),
                Some('"') => break,
                Some('\\') => match self.bump() {
                    None => return Err(self.error(LexErrorKind::UnterminatedString)),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(escaped) => value.push(escaped),
                },
                Some(c) => value.push(c),
            }
        }
        self.produce_with(TokenKind::String, value);
        Ok(())
    }

    /// Whether the word starting at the current mark (which begins with `t`
    /// or `e`) spells a base-12 numeral rather than a name.
    fn starts_numeral(&self) -> bool {
        let rest = &self.src[self.current_lo..];
        let word_len = rest.find(|c: char| !is_ident_continue(c)).unwrap_or(rest.len());
        let word = &rest[..word_len];
        let (digits, suffixed) = match word.strip_suffix("b12") {
            Some(digits) => (digits, true),
            None => (word, has_base12_suffix(&rest[word_len..], true)),
        };
        !digits.is_empty()
            && digits.chars().all(is_numeral_digit)
            && (suffixed || digits.chars().any(|c| c.is_ascii_digit()))
    }

    fn number(&mut self) -> Result<(), LexError> {
        let mut seen_dot = false;
        loop {
            match self.peek() {
                c if is_numeral_digit(c) => {
                    self.advance();
                }
                // The start of a range operator ends the numeral.
                '.' if self.peek_second() == '.' => break,
                '.' if !seen_dot => {
                    seen_dot = true;
                    self.advance();
                }
                _ => break,
            }
        }

        let src = self.src;
        let digits = &src[self.current_lo..self.cursor];
        let suffixed = has_base12_suffix(&src[self.cursor..], false);
        if suffixed {
            for _ in 0.."b12".len() {
                self.advance();
            }
        }

        if suffixed || digits.contains(['t', 'e']) {
            let whole = digits.strip_suffix('.').unwrap_or(digits);
            if whole.contains('.') {
                return Err(self.error(LexErrorKind::FractionalBase12));
            }
            let lexeme = if suffixed {
                format!("{whole}.b12")
            } else {
                whole.to_owned()
            };
            self.produce_with(TokenKind::Int, lexeme);
        } else if seen_dot {
            self.produce(TokenKind::Float);
        } else {
            self.produce(TokenKind::Int);
        }
        Ok(())
    }

    fn identifier_or_keyword(&mut self) -> TokenKind {
        while is_ident_continue(self.peek()) {
            self.advance();
        }
        KEYWORDS
            .get(self.substr())
            .copied()
            .unwrap_or(TokenKind::Identifier)
    }
}

impl LineScanner<'_, '_> {
    /// Starts a new token "mark" and advances.
    fn mark_bump(&mut self) -> Option<char> {
        self.current_lo = self.cursor;
        self.current_column = self.column;
        self.bump()
    }

    /// Returns the next character and advances, if the line is not exhausted.
    fn bump(&mut self) -> Option<char> {
        let c = self.src[self.cursor..].chars().next()?;
        self.cursor += c.len_utf8();
        self.column += 1;
        Some(c)
    }

    /// Advances, returning `'\0'` at the end of the line.
    fn advance(&mut self) -> char {
        self.bump().unwrap_or('\0')
    }

    /// Advances and returns the provided value.
    fn advance_with<T>(&mut self, value: T) -> T {
        self.advance();
        value
    }

    fn peek(&self) -> char {
        self.src[self.cursor..].chars().next().unwrap_or('\0')
    }

    fn peek_second(&self) -> char {
        self.src[self.cursor..].chars().nth(1).unwrap_or('\0')
    }

    /// Returns the substring of the current marked bounds.
    fn substr(&self) -> &str {
        &self.src[self.current_lo..self.cursor]
    }

    /// Produces a token whose lexeme is the marked source text.
    fn produce(&mut self, kind: TokenKind) {
        let lexeme = self.substr().to_owned();
        self.produce_with(kind, lexeme);
    }

    fn produce_with(&mut self, kind: TokenKind, lexeme: String) {
        let token = Token::new(kind, lexeme, self.line, self.current_column);
        self.tokens.push(token);
    }

    /// Builds an error located at the current mark.
    fn error(&self, kind: LexErrorKind) -> LexError {
        LexError {
            line: self.line,
            column: self.current_column,
            kind,
        }
    }
}

/// Digits of the numeral system: `0`-`9`, `t` (ten) and `e` (eleven).
pub fn is_numeral_digit(c: char) -> bool {
    c.is_ascii_digit() || c == 't' || c == 'e'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Checks for a `b12` suffix (optionally dotted) that is not itself the start
/// of a longer word.
fn has_base12_suffix(rest: &str, require_dot: bool) -> bool {
    let rest = match rest.strip_prefix('.') {
        Some(rest) => rest,
        None if require_dot => return false,
        None => rest,
    };
    rest.strip_prefix("b12")
        .is_some_and(|after| !after.starts_with(is_ident_continue))
}
