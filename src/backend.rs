use anyhow::{Context, Result};

use crate::compiler::Compilation;
use crate::printer::{self, Notation};

/// Renders one view of a finished compilation.
pub trait Backend {
    fn name(&self) -> &'static str;
    fn emit(&self, compilation: &Compilation) -> Result<String>;
}

/// Stack-machine assembly.
pub struct AssemblyBackend;

impl Backend for AssemblyBackend {
    fn name(&self) -> &'static str {
        "asm"
    }

    fn emit(&self, compilation: &Compilation) -> Result<String> {
        let mut buffer = Vec::new();
        compilation
            .assembly
            .write_to(&mut buffer)
            .context("Writing assembly")?;
        String::from_utf8(buffer).context("Assembly is not valid UTF-8")
    }
}

/// Program text regenerated from the (simplified) tree.
pub struct SourceBackend;

impl Backend for SourceBackend {
    fn name(&self) -> &'static str {
        "source"
    }

    fn emit(&self, compilation: &Compilation) -> Result<String> {
        Ok(printer::to_source(&compilation.tree, &compilation.symbols))
    }
}

pub struct DumpBackend {
    notation: Notation,
}

impl DumpBackend {
    pub fn new(notation: Notation) -> Self {
        Self { notation }
    }
}

impl Backend for DumpBackend {
    fn name(&self) -> &'static str {
        match self.notation {
            Notation::Prefix => "prefix",
            Notation::Infix => "infix",
            Notation::Postfix => "postfix",
        }
    }

    fn emit(&self, compilation: &Compilation) -> Result<String> {
        let mut out = printer::dump(compilation.tree.root(), &compilation.symbols, self.notation);
        out.push('\n');
        Ok(out)
    }
}

pub fn backends() -> Vec<Box<dyn Backend>> {
    vec![
        Box::new(AssemblyBackend),
        Box::new(SourceBackend),
        Box::new(DumpBackend::new(Notation::Prefix)),
        Box::new(DumpBackend::new(Notation::Infix)),
        Box::new(DumpBackend::new(Notation::Postfix)),
    ]
}

pub fn find(name: &str) -> Option<Box<dyn Backend>> {
    backends().into_iter().find(|backend| backend.name() == name)
}
