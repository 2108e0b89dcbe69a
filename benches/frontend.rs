mod common;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pokuda::symbols::SymbolTable;
use pokuda::{lexer, parser};

fn bench_frontend(c: &mut Criterion) {
    for (label, path) in common::workloads() {
        let source = common::load_source(&path);
        let mut symbols = SymbolTable::new();
        let tokens = lexer::tokenize(&source, &mut symbols).expect("tokenize");

        c.bench_function(&format!("frontend_tokenize_{label}"), |b| {
            b.iter(|| {
                let mut symbols = SymbolTable::new();
                let out = lexer::tokenize(black_box(&source), &mut symbols).expect("tokenize");
                black_box(out);
            })
        });

        c.bench_function(&format!("frontend_parse_only_{label}"), |b| {
            b.iter(|| {
                let mut symbols = symbols.clone();
                let out =
                    parser::parse_tokens(black_box(tokens.clone()), &mut symbols).expect("parse");
                black_box(out);
            })
        });

        c.bench_function(&format!("frontend_tokenize_parse_{label}"), |b| {
            b.iter(|| {
                let mut symbols = SymbolTable::new();
                let tokens = lexer::tokenize(black_box(&source), &mut symbols).expect("tokenize");
                let out = parser::parse_tokens(tokens, &mut symbols).expect("parse");
                black_box(out);
            })
        });
    }
}

criterion_group!(benches, bench_frontend);
criterion_main!(benches);
