use clap::Parser;
use shapetrans::{shacl_to_shex, shex_to_shacl, Translation};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Path to the input schema file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Write the translation to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Translate a SHACL schema (Turtle) into ShExC
    #[command(name = "to-shex")]
    ToShex(TranslateArgs),
    /// Translate a ShExC schema into SHACL (Turtle)
    #[command(name = "to-shacl")]
    ToShacl(TranslateArgs),
}

fn translate(args: &TranslateArgs, to_shex: bool) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(&args.input)
        .map_err(|e| format!("cannot read {}: {}", args.input.display(), e))?;

    let Translation { text, warnings } = if to_shex {
        shacl_to_shex(&source)?
    } else {
        shex_to_shacl(&source)?
    };

    for warning in &warnings {
        eprintln!("warning: {warning}");
    }
    match &args.output {
        Some(path) => fs::write(path, text)
            .map_err(|e| format!("cannot write {}: {}", path.display(), e))?,
        None => print!("{text}"),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::ToShex(args) => translate(args, true),
        Commands::ToShacl(args) => translate(args, false),
    }
}
