//! End-to-end pipeline: lexer, parser, simplifier, code generator.

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::ast::Tree;
use crate::codegen::{self, Assembly, CodegenError};
use crate::eval::EvalError;
use crate::lexer::{self, LexError};
use crate::parser::{self, ParseError};
use crate::simplify::{self, SimplifyReport};
use crate::symbols::SymbolTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lexer,
    Parser,
    Simplifier,
    CodeGenerator,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Lexer => "lexer",
            Stage::Parser => "parser",
            Stage::Simplifier => "simplifier",
            Stage::CodeGenerator => "code generator",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    #[error("lexer: {0}")]
    Lex(#[from] LexError),
    #[error("parser: {0}")]
    Parse(#[from] ParseError),
    #[error("simplifier: {0}")]
    Simplify(#[from] EvalError),
    #[error("code generator: {0}")]
    Codegen(#[from] CodegenError),
}

impl CompileError {
    pub fn stage(&self) -> Stage {
        match self {
            CompileError::Lex(_) => Stage::Lexer,
            CompileError::Parse(_) => Stage::Parser,
            CompileError::Simplify(_) => Stage::Simplifier,
            CompileError::Codegen(_) => Stage::CodeGenerator,
        }
    }

    /// Source line and column, for errors raised before the tree exists.
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            CompileError::Lex(err) => Some(err.location()),
            CompileError::Parse(err) => Some(err.location()),
            CompileError::Simplify(_) | CompileError::Codegen(_) => None,
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Run the fold/identity fixpoint before code generation.
    pub simplify: bool,
    /// Upper bound on distinct names; `None` is unbounded.
    pub symbol_capacity: Option<usize>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            simplify: true,
            symbol_capacity: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Compilation {
    pub symbols: SymbolTable,
    pub tree: Tree,
    /// `None` when simplification was switched off.
    pub report: Option<SimplifyReport>,
    pub assembly: Assembly,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> CompileOptions {
        self.options
    }

    pub fn compile(&self, source: &str) -> CompileResult<Compilation> {
        let symbols = match self.options.symbol_capacity {
            Some(capacity) => SymbolTable::bounded(capacity),
            None => SymbolTable::new(),
        };
        self.compile_with_symbols(source, symbols)
    }

    /// Compiles against a table that may already hold names and values.
    pub fn compile_with_symbols(
        &self,
        source: &str,
        mut symbols: SymbolTable,
    ) -> CompileResult<Compilation> {
        let tokens = lexer::tokenize(source, &mut symbols)?;
        let tree = parser::parse_tokens(tokens, &mut symbols)?;
        self.compile_tree(tree, symbols)
    }

    /// Runs the back half of the pipeline on an already parsed tree.
    pub fn compile_tree(&self, mut tree: Tree, symbols: SymbolTable) -> CompileResult<Compilation> {
        let report = if self.options.simplify {
            Some(simplify::simplify(&mut tree, &symbols)?)
        } else {
            None
        };
        let assembly = codegen::generate(&tree, &symbols)?;
        debug!(
            nodes = tree.size(),
            instructions = assembly.len(),
            symbols = symbols.len(),
            "compiled program"
        );
        Ok(Compilation {
            symbols,
            tree,
            report,
            assembly,
        })
    }
}

/// Compiles `source` with default options.
pub fn compile(source: &str) -> CompileResult<Compilation> {
    Compiler::default().compile(source)
}
