//! Compilation pipeline
//!
//! lexer -> parser -> names -> attributes -> liveness -> codegen. Every
//! stage runs to completion; once any error has been recorded the remaining
//! stages are skipped. Warnings never stop the pipeline.

use log::info;

use crate::backend::{Chip8CodeGen, CodeGen, CodegenConfig};
use crate::feedback::Diagnostics;
use crate::frontend::ast::Program;
use crate::frontend::liveness::check_liveness;
use crate::frontend::parser::parse_source;
use crate::frontend::resolve::resolve_names;
use crate::frontend::semantic::SemanticAnalyzer;
use crate::utils::Result;

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub codegen: CodegenConfig,
    /// Stop after the checking passes
    pub check_only: bool,
}

/// Outcome of a compilation that did not hit an internal error
#[derive(Debug)]
pub struct Compilation {
    /// Listing, present only when no stage reported an error
    pub asm: Option<String>,
    pub diagnostics: Diagnostics,
}

impl Compilation {
    pub fn succeeded(&self) -> bool {
        !self.diagnostics.has_errors()
    }
}

/// Compile `source` to a CHIP-8 listing
pub fn compile(source: &str, options: &CompileOptions) -> Result<Compilation> {
    let mut diagnostics = Diagnostics::new();

    let (program, syntax_errors) = parse_source(source);
    info!(
        "parsed '{}': {} declarations, {} syntax errors",
        program.name.name,
        program.decls.len(),
        syntax_errors.len()
    );
    diagnostics.extend_errors(syntax_errors);

    let asm = run_passes(&program, options, &mut diagnostics)?;
    Ok(Compilation { asm, diagnostics })
}

fn run_passes(
    program: &Program,
    options: &CompileOptions,
    diags: &mut Diagnostics,
) -> Result<Option<String>> {
    if stop_after("parsing", diags) {
        return Ok(None);
    }

    resolve_names(program, diags);
    if stop_after("name resolution", diags) {
        return Ok(None);
    }

    SemanticAnalyzer::new(diags).analyze(program)?;
    if stop_after("attribute resolution", diags) {
        return Ok(None);
    }

    check_liveness(program, diags)?;
    if stop_after("liveness", diags) || options.check_only {
        return Ok(None);
    }

    let mut codegen = Chip8CodeGen::new(options.codegen.clone(), diags);
    info!("generating {} code ({})", codegen.target(), codegen.name());
    let asm = codegen.generate(program)?;
    if stop_after("code generation", diags) {
        return Ok(None);
    }
    info!("listing is {} lines", asm.lines().count());
    Ok(Some(asm))
}

fn stop_after(stage: &str, diags: &Diagnostics) -> bool {
    info!(
        "{stage} done: {} errors, {} warnings",
        diags.error_count(),
        diags.warning_count()
    );
    diags.has_errors()
}
