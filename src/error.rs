use thiserror::Error;

use crate::{lexer::LexError, lower::LowerError, parser::ParseError};

/// Any failure of the pipeline, tagged with the stage it came from.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("lex error at {0}")]
    Lex(#[from] LexError),
    #[error("parse error at {0}")]
    Parse(#[from] ParseError),
    #[error("lower error at {0}")]
    Lower(#[from] LowerError),
}

impl Error {
    /// Source line the diagnostic points at.
    pub fn line(&self) -> usize {
        match self {
            Error::Lex(e) => e.line,
            Error::Parse(e) => e.line,
            Error::Lower(e) => e.line(),
        }
    }
}
