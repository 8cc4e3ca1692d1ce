use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;

use sift::{Compiler, Error, Lexer, Parser, Result, Vm};

#[derive(ClapParser, Debug)]
#[command(name = "sift")]
#[command(about = "Run a pipeline script over CSV data")]
#[command(version)]
struct Args {
    /// Path to the pipeline script
    script: PathBuf,

    /// Disable the vectorized filter fast path
    #[arg(long)]
    no_vectorize: bool,
}

fn main() {
    env_logger::init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("{e}");
        process::exit(1);
    }

    println!("Pipeline completed successfully.");
}

fn run(args: &Args) -> Result<()> {
    let source = fs::read_to_string(&args.script)
        .map_err(|e| Error::io(format!("Cannot open file {}: {e}", args.script.display())))?;

    let tokens = Lexer::new(&source).tokenize();
    let program = Parser::new(tokens).parse()?;

    let compiler = if args.no_vectorize {
        Compiler::new().without_vectorization()
    } else {
        Compiler::new()
    };
    let plan = compiler.compile(&program)?;

    Vm::new().execute(&plan)?;
    Ok(())
}
