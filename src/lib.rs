pub mod ast;
pub mod backend;
pub mod codegen;
pub mod compiler;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod simplify;
pub mod symbols;
pub mod token;

pub use compiler::{
    Compilation, CompileError, CompileOptions, CompileResult, Compiler, Stage, compile,
};
