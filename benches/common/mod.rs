#![allow(dead_code)]
use std::fs;
use std::path::{Path, PathBuf};

use pokuda::ast::Tree;
use pokuda::symbols::SymbolTable;
use pokuda::{lexer, parser};

pub fn workloads() -> Vec<(String, PathBuf)> {
    test_support::bench_workloads(Path::new("tests/programs"))
        .unwrap_or_else(|err| panic!("load bench workloads: {err:#}"))
}

pub fn load_source(path: &Path) -> String {
    let source = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("read {}: {err}", path.display()));
    // Small fixtures are repeated so timings are not dominated by setup.
    source.repeat(200)
}

pub fn load_tree(path: &Path) -> (Tree, SymbolTable) {
    let source = load_source(path);
    let mut symbols = SymbolTable::new();
    let tokens = lexer::tokenize(&source, &mut symbols)
        .unwrap_or_else(|err| panic!("tokenize {}: {err}", path.display()));
    let tree = parser::parse_tokens(tokens, &mut symbols)
        .unwrap_or_else(|err| panic!("parse {}: {err}", path.display()));
    (tree, symbols)
}
