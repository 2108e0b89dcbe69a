use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result, anyhow, bail};
use tracing_subscriber::EnvFilter;

use pokuda::{CompileOptions, Compiler, backend};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let mut emit = "asm".to_string();
    let mut options = CompileOptions::default();
    let mut input_path: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--emit" | "-e" => {
                emit = args
                    .next()
                    .ok_or_else(|| anyhow!("Missing emitter name after {arg}"))?;
            }
            "--no-simplify" => options.simplify = false,
            "--max-symbols" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("Missing count after {arg}"))?;
                let capacity = value
                    .parse::<usize>()
                    .with_context(|| format!("Invalid symbol count '{value}'"))?;
                options.symbol_capacity = Some(capacity);
            }
            _ => {
                input_path = Some(arg);
                if args.next().is_some() {
                    bail!("Only one input file is supported");
                }
                break;
            }
        }
    }

    let Some(emitter) = backend::find(&emit) else {
        bail!("Unknown emitter '{emit}'");
    };

    let source = if let Some(path) = &input_path {
        fs::read_to_string(path).with_context(|| format!("Reading {path}"))?
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Reading stdin")?;
        buffer
    };

    let compilation = Compiler::new(options).compile(&source)?;
    if let Some(report) = compilation.report {
        tracing::info!(
            folded = report.folded,
            reduced = report.reduced,
            passes = report.passes,
            "simplified"
        );
    }

    let output = emitter.emit(&compilation)?;
    print!("{output}");
    Ok(())
}
