use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, clap::ValueEnum)]
enum EmitStage {
    /// Lexer token stream.
    Tokens,
    /// Parsed HIR tree.
    Ast,
    /// Diagnostics from the full front end (default).
    Check,
    /// Machine-readable check report.
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "meshc",
    version,
    about = "Mesh compiler — checks .mesh graph/tensor programs"
)]
struct Cli {
    /// Input .mesh source file
    source: PathBuf,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Check)]
    emit: EmitStage,

    /// Print compiler phases
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        eprintln!("meshc: source = {}", cli.source.display());
        eprintln!("meshc: emit   = {:?}", cli.emit);
    }

    let source = match std::fs::read_to_string(&cli.source) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("meshc: error: cannot read {}: {}", cli.source.display(), e);
            std::process::exit(2);
        }
    };

    match cli.emit {
        EmitStage::Tokens => {
            let result = meshc::lexer::lex(&source);
            for (token, span) in &result.tokens {
                println!("{:>5}..{:<5} {}", span.start, span.end, token);
            }
            for err in &result.errors {
                eprintln!("meshc: error: {}", err.message);
            }
            std::process::exit(if result.errors.is_empty() { 0 } else { 1 });
        }
        EmitStage::Ast => {
            let result = meshc::parser::parse(&source);
            if let Some(program) = &result.program {
                println!("{:#?}", program);
            }
            for err in &result.errors {
                eprintln!("meshc: error: {}", err);
            }
            std::process::exit(if result.errors.is_empty() { 0 } else { 1 });
        }
        EmitStage::Check => {
            let result = meshc::pipeline::run_frontend(&source);
            for d in &result.diagnostics {
                eprintln!("{}", meshc::diag::render(d, &source));
            }
            if cli.verbose {
                eprintln!("meshc: source hash {}", result.provenance.source_hash_hex());
            }
            if result.has_error() {
                std::process::exit(1);
            }
            eprintln!("meshc: ok");
        }
        EmitStage::Json => {
            let result = meshc::pipeline::run_frontend(&source);
            println!("{}", meshc::pipeline::report_json(&result, &source));
            if result.has_error() {
                std::process::exit(1);
            }
        }
    }
}
