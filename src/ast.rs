// module ::= ['package' ID NL] ('use' ID ('/' ID)* NL)* function+
// function ::= 'fn' ID '(' [param (',' param)*] ')' ['->' TYPE] ':' NL block
// param ::= ID [':' TYPE]
// block ::= INDENT stmt+ DEDENT
// stmt ::= ('let' | 'var') ID [':' TYPE] '=' expr NL
//        | ID '=' expr NL
//        | 'return' [expr] NL
//        | 'if' expr ':' NL block ['else' ':' NL block]
//        | 'while' expr ':' NL block
//        | 'for' ID 'in' expr '..' expr ':' NL block
//        | expr NL
// expr ::= expr ('+' | '-') expr
//        | expr ('*' | '/') expr
//        | ID '(' [expr (',' expr)*] ')'
//        | 'say' '(' [expr (',' expr)*] ')'
//        | ID
//        | integer
//        | float
//        | string

// Precedence
//
// * /
// + -

#[derive(Debug, PartialEq, Default)]
pub struct Module {
    pub package: Option<Box<str>>,
    /// Import paths, recorded but never resolved.
    pub imports: Vec<Box<str>>,
    pub functions: Vec<Function>,
}

#[derive(Debug, PartialEq)]
pub struct Function {
    pub name: Box<str>,
    pub params: Vec<Param>,
    /// Advisory only: the sole machine type is the 64-bit integer.
    pub return_ty: Option<TypeName>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

#[derive(Debug, PartialEq)]
pub struct Param {
    pub name: Box<str>,
    pub ty: Option<TypeName>,
}

#[derive(Debug, PartialEq)]
pub struct TypeName(pub Box<str>);

impl TypeName {
    pub fn name(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
}

#[derive(Debug, PartialEq)]
pub enum StmtKind {
    /// `let` and `var` both create a fresh mutable slot.
    Binding(Binding),
    Assignment {
        target: Box<str>,
        value: Expr,
    },
    Return(Option<Expr>),
    Expr(Expr),
    If {
        predicate: Expr,
        then_body: Vec<Stmt>,
        /// Empty when no `else` clause was written.
        else_body: Vec<Stmt>,
    },
    While {
        predicate: Expr,
        body: Vec<Stmt>,
    },
    ForRange {
        var: Box<str>,
        start: Expr,
        /// Exclusive, and evaluated again before every iteration.
        end: Expr,
        body: Vec<Stmt>,
    },
}

#[derive(Debug, PartialEq)]
pub struct Binding {
    pub keyword: BindingKeyword,
    pub name: Box<str>,
    pub ty: Option<TypeName>,
    pub initializer: Expr,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BindingKeyword {
    Let,
    Var,
}

impl BindingKeyword {
    pub fn as_str(self) -> &'static str {
        match self {
            BindingKeyword::Let => "let",
            BindingKeyword::Var => "var",
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: usize,
}

#[derive(Debug, PartialEq)]
pub enum ExprKind {
    /// Raw lexeme; decoded (decimal or base-12) during lowering.
    Int(Box<str>),
    Float(Box<str>),
    /// Decoded string value.
    String(Box<str>),
    Name(Box<str>),
    Binary {
        op: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
}

impl ExprKind {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            ExprKind::Name(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
}
