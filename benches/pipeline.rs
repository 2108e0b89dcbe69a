mod common;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use pokuda::codegen;
use pokuda::simplify::simplify;

fn bench_pipeline(c: &mut Criterion) {
    for (label, path) in common::workloads() {
        let source = common::load_source(&path);
        let (tree, symbols) = common::load_tree(&path);
        let mut simplified = tree.clone();
        simplify(&mut simplified, &symbols).expect("simplify");

        c.bench_function(&format!("pipeline_simplify_{label}"), |b| {
            b.iter_batched(
                || tree.clone(),
                |mut tree| {
                    let report = simplify(&mut tree, &symbols).expect("simplify");
                    black_box((tree, report));
                },
                BatchSize::SmallInput,
            )
        });

        c.bench_function(&format!("pipeline_codegen_{label}"), |b| {
            b.iter(|| {
                let out = codegen::generate(black_box(&simplified), &symbols).expect("codegen");
                black_box(out);
            })
        });

        c.bench_function(&format!("pipeline_compile_{label}"), |b| {
            b.iter(|| {
                let out = pokuda::compile(black_box(&source)).expect("compile");
                black_box(out);
            })
        });
    }
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
