/// The lexer takes the source input, mapping it into a sequence of tokens,
/// including the layout tokens synthesized from indentation.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// Lowering takes an AST module and builds the IR: basic blocks over stack
/// slots, string constants and extern declarations.
pub mod lower;

pub mod ast;
pub mod error;
pub mod ir;
pub mod numeral;
pub mod token;

pub mod util {
    pub mod fmt {
        pub mod tree;
    }
    pub mod intern;
    #[cfg(test)]
    pub(crate) mod test_utils;
}

pub use error::Error;

/// Lexes and parses a source unit.
pub fn parse_source(source: &str) -> Result<ast::Module, Error> {
    let tokens = lexer::lex_in_new(source)?;
    Ok(parser::parse(&tokens)?)
}

/// Runs the whole pipeline, naming the resulting IR module `module_name`.
pub fn compile(source: &str, module_name: &str) -> Result<ir::Module, Error> {
    let module = parse_source(source)?;
    Ok(lower::lower(&module, module_name)?)
}

/// Like [`compile`], but renders the module as LLVM assembly.
pub fn emit_llvm_ir(source: &str, module_name: &str) -> Result<String, Error> {
    let module = compile(source, module_name)?;
    Ok(ir::print::print_module_string(&module))
}
