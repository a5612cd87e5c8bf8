use std::fmt;

use log::trace;
use thiserror::Error;

use crate::{
    ast::{
        BinaryOperator, Binding, BindingKeyword, Expr, ExprKind, Function, Module, Param, Stmt,
        StmtKind, TypeName,
    },
    token::{Token, TokenKind},
};

type Result<T, E = ParseError> = std::result::Result<T, E>;

/// Parses a complete token stream, as produced by [`crate::lexer::lex`], into
/// a module. Stops at the first defect.
pub fn parse(tokens: &[Token]) -> Result<Module> {
    assert!(
        tokens.last().is_some_and(Token::is_eof),
        "token stream must end with Eof"
    );
    let mut p = Parser { tokens, cursor: 0 };
    let module = p.parse_module()?;
    trace!("parsed {} functions", module.functions.len());
    Ok(module)
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{line}:{column}: expected {expected}, but got {found:?}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub expected: Expected,
    pub found: TokenKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expected {
    Token(TokenKind),
    Expression,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Token(kind) => write!(f, "token {kind:?}"),
            Expected::Expression => write!(f, "an expression"),
        }
    }
}

struct Parser<'tok> {
    tokens: &'tok [Token],
    cursor: usize,
}

impl<'tok> Parser<'tok> {
    fn parse_module(&mut self) -> Result<Module> {
        let package = if self.take(TokenKind::Package) {
            let name = self.parse_name()?;
            self.consume(TokenKind::Newline)?;
            Some(name)
        } else {
            None
        };

        let mut imports = Vec::new();
        while self.take(TokenKind::Use) {
            imports.push(self.parse_use_path()?);
            self.consume(TokenKind::Newline)?;
        }

        let mut functions = Vec::with_capacity(4);
        loop {
            functions.push(self.parse_function()?);
            if self.is(TokenKind::Eof) {
                break;
            }
        }

        Ok(Module {
            package,
            imports,
            functions,
        })
    }

    /// `ID ('/' ID)*`, recorded as written.
    fn parse_use_path(&mut self) -> Result<Box<str>> {
        let mut path = String::from(self.parse_name()?);
        while self.take(TokenKind::Slash) {
            path.push('/');
            path.push_str(&self.parse_name()?);
        }
        Ok(path.into())
    }

    fn parse_function(&mut self) -> Result<Function> {
        let line = self.consume(TokenKind::Fn)?.line;
        let name = self.parse_name()?;

        self.consume(TokenKind::LParen)?;
        let params = self.parse_list(TokenKind::RParen, Parser::parse_param)?;
        self.consume(TokenKind::RParen)?;

        let return_ty = if self.take(TokenKind::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = self.parse_header_and_block()?;
        Ok(Function {
            name,
            params,
            return_ty,
            body,
            line,
        })
    }

    fn parse_param(&mut self) -> Result<Param> {
        let name = self.parse_name()?;
        let ty = self.parse_type_annotation()?;
        Ok(Param { name, ty })
    }

    fn parse_type_annotation(&mut self) -> Result<Option<TypeName>> {
        if !self.take(TokenKind::Colon) {
            return Ok(None);
        }
        self.parse_type().map(Some)
    }

    fn parse_type(&mut self) -> Result<TypeName> {
        self.parse_name().map(TypeName)
    }

    fn parse_name(&mut self) -> Result<Box<str>> {
        let token = self.consume(TokenKind::Identifier)?;
        Ok(token.lexeme.clone())
    }

    /// `':' NEWLINE INDENT stmt+ DEDENT`, the tail shared by every compound
    /// statement and by function headers.
    fn parse_header_and_block(&mut self) -> Result<Vec<Stmt>> {
        self.consume(TokenKind::Colon)?;
        self.consume(TokenKind::Newline)?;
        self.consume(TokenKind::Indent)?;

        let mut body = Vec::new();
        while self.except([TokenKind::Dedent]) {
            body.push(self.parse_stmt()?);
        }
        self.consume(TokenKind::Dedent)?;
        Ok(body)
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        let token = self.peek();
        let line = token.line;

        let kind = match token.kind {
            kind @ (TokenKind::Let | TokenKind::Var) => {
                self.advance();
                let keyword = match kind {
                    TokenKind::Let => BindingKeyword::Let,
                    _ => BindingKeyword::Var,
                };
                let name = self.parse_name()?;
                let ty = self.parse_type_annotation()?;
                self.consume(TokenKind::Assign)?;
                let initializer = self.parse_expr()?;
                self.end_simple_stmt()?;
                StmtKind::Binding(Binding {
                    keyword,
                    name,
                    ty,
                    initializer,
                })
            }

            // Assignment: ID = expr
            TokenKind::Identifier if self.peek_second().kind == TokenKind::Assign => {
                let target = self.parse_name()?;
                self.advance(); // =
                let value = self.parse_expr()?;
                self.end_simple_stmt()?;
                StmtKind::Assignment { target, value }
            }

            TokenKind::Return => {
                self.advance();
                let value = if self.peek().kind.ends_statement() {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.end_simple_stmt()?;
                StmtKind::Return(value)
            }

            TokenKind::If => {
                self.advance();
                let predicate = self.parse_expr()?;
                let then_body = self.parse_header_and_block()?;
                let else_body = if self.take(TokenKind::Else) {
                    self.parse_header_and_block()?
                } else {
                    Vec::new()
                };
                StmtKind::If {
                    predicate,
                    then_body,
                    else_body,
                }
            }

            TokenKind::While => {
                self.advance();
                let predicate = self.parse_expr()?;
                let body = self.parse_header_and_block()?;
                StmtKind::While { predicate, body }
            }

            // For: for ID in expr .. expr
            TokenKind::For => {
                self.advance();
                let var = self.parse_name()?;
                self.consume(TokenKind::In)?;
                let start = self.parse_expr()?;
                self.consume(TokenKind::Range)?;
                let end = self.parse_expr()?;
                let body = self.parse_header_and_block()?;
                StmtKind::ForRange {
                    var,
                    start,
                    end,
                    body,
                }
            }

            _ => {
                let expr = self.parse_expr()?;
                self.end_simple_stmt()?;
                StmtKind::Expr(expr)
            }
        };

        Ok(Stmt { kind, line })
    }

    fn end_simple_stmt(&mut self) -> Result<()> {
        self.consume(TokenKind::Newline).map(drop)
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let lhs_token = self.advance();
        let mut lhs = self.parse_nud(lhs_token)?;

        loop {
            let op_token = self.peek();
            let Some((lbp, rbp)) = Self::infix_binding_power(op_token.kind) else {
                break;
            };
            if lbp < min_bp {
                break;
            }
            // Only a plain name may be called.
            if op_token.kind == TokenKind::LParen && lhs.kind.as_name().is_none() {
                break;
            }

            self.advance(); // Operator
            lhs = self.parse_led(op_token, lhs, rbp)?;
        }

        Ok(lhs)
    }

    /// nud: Parses tokens that start an expression.
    fn parse_nud(&mut self, token: &Token) -> Result<Expr> {
        let kind = match token.kind {
            TokenKind::Identifier => ExprKind::Name(token.lexeme.clone()),
            TokenKind::Int => ExprKind::Int(token.lexeme.clone()),
            TokenKind::Float => ExprKind::Float(token.lexeme.clone()),
            TokenKind::String => ExprKind::String(token.lexeme.clone()),

            // The print builtin is a keyword, but only ever a callee.
            TokenKind::Say => {
                if !self.is(TokenKind::LParen) {
                    return Err(self.unexpected(Expected::Token(TokenKind::LParen)));
                }
                ExprKind::Name(token.lexeme.clone())
            }

            _ => return Err(error_at(token, Expected::Expression)),
        };

        Ok(Expr {
            kind,
            line: token.line,
        })
    }

    /// led: Parses tokens that follow a left-hand-side expression.
    fn parse_led(&mut self, op_token: &Token, lhs: Expr, rbp: u8) -> Result<Expr> {
        let line = lhs.line;
        let kind = match op_token.kind {
            // Binary operators: +, -, *, /
            kind @ (TokenKind::Plus | TokenKind::Minus | TokenKind::Star | TokenKind::Slash) => {
                let op = match kind {
                    TokenKind::Plus => BinaryOperator::Add,
                    TokenKind::Minus => BinaryOperator::Sub,
                    TokenKind::Star => BinaryOperator::Mul,
                    _ => BinaryOperator::Div,
                };
                let rhs = self.parse_expr_bp(rbp)?;
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                }
            }

            // Call: ID ( [expr [, expr]*] ), the '(' was already consumed.
            TokenKind::LParen => {
                let args = self.parse_list(TokenKind::RParen, Parser::parse_expr)?;
                self.consume(TokenKind::RParen)?;
                ExprKind::Call {
                    callee: Box::new(lhs),
                    args,
                }
            }

            _ => return Err(error_at(op_token, Expected::Expression)),
        };

        Ok(Expr { kind, line })
    }

    fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8)> {
        let bp = match kind {
            // Addition/Subtraction (left-associative)
            TokenKind::Plus | TokenKind::Minus => (1, 2),

            // Multiplication/Division (left-associative)
            TokenKind::Star | TokenKind::Slash => (3, 4),

            // Call
            TokenKind::LParen => (5, 6),

            _ => return None,
        };
        Some(bp)
    }

    /// Parses `[item (',' item)*]`, an empty list being one that starts at
    /// `end_delim`. A comma must be followed by another item. Does **NOT**
    /// consume the end delimiter.
    fn parse_list<T>(
        &mut self,
        end_delim: TokenKind,
        parse_item: impl Fn(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        if !self.except([end_delim]) {
            return Ok(items);
        }
        loop {
            items.push(parse_item(self)?);
            if !self.take(TokenKind::Comma) {
                break;
            }
        }
        Ok(items)
    }
}

impl<'tok> Parser<'tok> {
    /// Returns the current token. The stream always ends with
    /// [`TokenKind::Eof`], which is returned indefinitely.
    fn peek(&self) -> &'tok Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.cursor.min(last)]
    }

    fn peek_second(&self) -> &'tok Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.cursor + 1).min(last)]
    }

    /// Returns the current token and advances.
    fn advance(&mut self) -> &'tok Token {
        let c = self.peek();
        if !c.is_eof() {
            self.cursor += 1;
        }
        c
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.peek().kind == expect
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        if self.is(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances if the current token matches the provided one, returning it.
    /// If not, fails.
    fn consume(&mut self, expect: TokenKind) -> Result<&'tok Token> {
        if self.is(expect) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(Expected::Token(expect)))
        }
    }

    /// Returns true while the current token does *not* match one of the
    /// provided ones. [`TokenKind::Eof`] is implicitly included in the list.
    fn except(&self, except: impl IntoIterator<Item = TokenKind>) -> bool {
        let c = self.peek().kind;
        c != TokenKind::Eof && except.into_iter().all(|e| c != e)
    }

    fn unexpected(&self, expected: Expected) -> ParseError {
        error_at(self.peek(), expected)
    }
}

fn error_at(token: &Token, expected: Expected) -> ParseError {
    ParseError {
        line: token.line,
        column: token.column,
        expected,
        found: token.kind,
    }
}

#[cfg(test)]
mod tests {
    use crate::util::test_utils::tree_tests;

    tree_tests!(
        use parser;

        fn test_return_of_sum() {
            let program = "
                fn f(a, b):
                    return a + b
            ";
            let tree_ok = "
                fn f(a, b) @1
                  return @2
                    binary Add @2
                      name a @2
                      name b @2
            ";
        }

        fn test_package_and_imports() {
            let program = "
                package demo
                use std
                use std/io/fmt
                fn main():
                    say(1)
            ";
            let tree_ok = "
                package demo
                use std
                use std/io/fmt
                fn main() @4
                  call say @5
                    arguments
                      int 1 @5
            ";
        }

        fn test_typed_signature() {
            let program = "
                fn add(a: i64, b) -> i64:
                    return a
            ";
            let tree_ok = "
                fn add(a: i64, b) -> i64 @1
                  return @2
                    name a @2
            ";
        }

        fn test_precedence_mul_plus() {
            let program = "
                fn f():
                    1 + 2 * 3
            ";
            let tree_ok = "
                fn f() @1
                  binary Add @2
                    int 1 @2
                    binary Mul @2
                      int 2 @2
                      int 3 @2
            ";
        }

        fn test_left_associativity() {
            let program = "
                fn f():
                    a - b - c / d / e1
            ";
            let tree_ok = "
                fn f() @1
                  binary Sub @2
                    binary Sub @2
                      name a @2
                      name b @2
                    binary Div @2
                      binary Div @2
                        name c @2
                        name d @2
                      int e1 @2
            ";
        }

        fn test_call_arguments() {
            let program = r#"
                fn f():
                    g()
                    say("sum", add(1, 2) * 3, x)
            "#;
            let tree_ok = r#"
                fn f() @1
                  call g @2
                  call say @3
                    arguments
                      string "sum" @3
                      binary Mul @3
                        call add @3
                          arguments
                            int 1 @3
                            int 2 @3
                        int 3 @3
                      name x @3
            "#;
        }

        fn test_bindings_and_assignment() {
            let program = "
                fn f():
                    let x = 5
                    var y: i64 = 2.5
                    x = x + y
            ";
            let tree_ok = "
                fn f() @1
                  let x @2
                    int 5 @2
                  var y: i64 @3
                    float 2.5 @3
                  assign x @4
                    binary Add @4
                      name x @4
                      name y @4
            ";
        }

        fn test_if_else() {
            let program = "
                fn f(c):
                    if c:
                        return 1
                    else:
                        return 2
                    return
            ";
            let tree_ok = "
                fn f(c) @1
                  if @2
                    name c @2
                    then
                      return @3
                        int 1 @3
                    else
                      return @5
                        int 2 @5
                  return @6
            ";
        }

        fn test_if_without_else() {
            let program = "
                fn f(c):
                    if c - 1:
                        say(c)
            ";
            let tree_ok = "
                fn f(c) @1
                  if @2
                    binary Sub @2
                      name c @2
                      int 1 @2
                    then
                      call say @3
                        arguments
                          name c @3
            ";
        }

        fn test_loops() {
            let program = "
                fn f(n):
                    for i in 0..n + 1:
                        while i:
                            i = i - 1
            ";
            let tree_ok = "
                fn f(n) @1
                  for i @2
                    int 0 @2
                    binary Add @2
                      name n @2
                      int 1 @2
                    body
                      while @3
                        name i @3
                        body
                          assign i @4
                            binary Sub @4
                              name i @4
                              int 1 @4
            ";
        }

        fn test_multiple_functions() {
            let program = "
                fn a():
                    b()

                # second
                fn b():
                    return
            ";
            let tree_ok = "
                fn a() @1
                  call b @2
                fn b() @5
                  return @6
            ";
        }

        fn test_error_empty_module() {
            let program = "";
            let expected_errors = &["1:1: expected token Fn, but got Eof"];
        }

        fn test_error_missing_colon() {
            let program = "
                fn f()
                    return
            ";
            let expected_errors = &["1:7: expected token Colon, but got Newline"];
        }

        fn test_error_missing_block() {
            let program = "
                fn f():
                fn g():
                    return
            ";
            let expected_errors = &["2:1: expected token Indent, but got Fn"];
        }

        fn test_error_unexpected_token_in_expr() {
            let program = "
                fn f():
                    let x = 1 + )
            ";
            let expected_errors = &["2:17: expected an expression, but got RParen"];
        }

        fn test_error_trailing_tokens() {
            let program = "
                fn f():
                    let x = 1 2
            ";
            let expected_errors = &["2:15: expected token Newline, but got Int"];
        }

        fn test_error_grouping_is_not_supported() {
            let program = "
                fn f():
                    (1 + 2)
            ";
            let expected_errors = &["2:5: expected an expression, but got LParen"];
        }

        fn test_error_say_without_call() {
            let program = "
                fn f():
                    say 1
            ";
            let expected_errors = &["2:9: expected token LParen, but got Int"];
        }

        fn test_error_range_in_for() {
            let program = "
                fn f():
                    for i in 0, 3:
                        say(i)
            ";
            let expected_errors = &["2:15: expected token Range, but got Comma"];
        }

        fn test_error_trailing_comma_in_arguments() {
            let program = "
                fn f():
                    g(1,)
            ";
            let expected_errors = &["2:9: expected an expression, but got RParen"];
        }

        fn test_error_trailing_comma_in_parameters() {
            let program = "
                fn f(a,):
                    return
            ";
            let expected_errors = &["1:8: expected token Identifier, but got RParen"];
        }

        fn test_error_statement_at_top_level() {
            let program = "
                fn f():
                    return
                say(1)
            ";
            let expected_errors = &["3:1: expected token Fn, but got Say"];
        }

        fn test_error_from_lexer() {
            let program = "
                fn f():
                    say(\"oops)
            ";
            let expected_errors = &["2:9: unterminated string literal"];
        }
    );
}
