//! Pascal8 Compiler
//!
//! Compiles a small Pascal dialect to CHIP-8 assembly.

mod backend;
mod driver;
mod feedback;
mod frontend;
mod types;
mod utils;

use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context};
use clap::Parser;

use backend::CodegenConfig;
use driver::{compile, CompileOptions};

/// Pascal8 Compiler
#[derive(Parser, Debug)]
#[command(name = "p8c")]
#[command(version = "0.1.0")]
#[command(about = "Pascal8 compiler - a small Pascal dialect for the CHIP-8 virtual machine")]
struct Cli {
    /// Input source file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output listing
    #[arg(short, long, value_name = "FILE", default_value = "out.asm")]
    output: PathBuf,

    /// Size of the stack region in two-byte words
    #[arg(long, value_name = "WORDS", default_value_t = 32)]
    stack_size: usize,

    /// Print diagnostics as JSON
    #[arg(long)]
    json: bool,

    /// Check the source for errors without writing a listing
    #[arg(long)]
    check: bool,
}

impl Cli {
    fn options(&self) -> CompileOptions {
        CompileOptions {
            codegen: CodegenConfig {
                stack_words: self.stack_size,
            },
            check_only: self.check,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}

/// Returns whether compilation succeeded
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let Some(input) = &cli.input else {
        bail!("no input file specified\nUsage: p8c <FILE> [-o <FILE>]");
    };
    let source = fs::read_to_string(input)
        .with_context(|| format!("couldn't open file '{}'", input.display()))?;
    let file = input.display().to_string();

    let compilation = compile(&source, &cli.options())?;
    let diagnostics = &compilation.diagnostics;

    if cli.json {
        let feedback = diagnostics.to_feedback(&file, &source);
        println!("{}", serde_json::to_string_pretty(&feedback)?);
    } else {
        eprint!("{}", diagnostics.render(&file, &source));
        if let Some(summary) = diagnostics.summary() {
            eprintln!("{summary}");
        }
    }

    if let Some(asm) = &compilation.asm {
        fs::write(&cli.output, asm)
            .with_context(|| format!("couldn't write '{}'", cli.output.display()))?;
        log::info!("wrote {}", cli.output.display());
    }

    Ok(compilation.succeeded())
}
