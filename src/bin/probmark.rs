//! probmark CLI - compile problem-statement markup to a document tree

#[cfg(feature = "cli")]
use clap::{Parser, ValueEnum};
#[cfg(feature = "cli")]
use probmark::{compile_with_report, CompileOptions, CompileReport, Diagnostic};
#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, Read, Write};
#[cfg(feature = "cli")]
use std::process::ExitCode;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "probmark")]
#[command(version)]
#[command(about = "Compile problem-statement markup to a document tree", long_about = None)]
struct Cli {
    /// Input file path (reads from stdin if not provided)
    input_file: Option<String>,

    /// Output file path (writes to stdout if not provided)
    #[arg(short, long)]
    output: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Print recovery diagnostics to stderr
    #[arg(long)]
    report: bool,

    /// Only print diagnostics; exit with status 1 if there are any
    #[arg(long)]
    check: bool,

    /// Keep text as written: no dash/glyph replacement, no `#` headings
    #[arg(long)]
    literal: bool,

    /// Deepest nesting of environments and arguments
    #[arg(long)]
    max_depth: Option<usize>,
}

#[cfg(feature = "cli")]
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Compact JSON
    Json,
    /// Indented JSON
    Pretty,
    /// Plain text projection of the document
    Text,
    /// Rust debug representation
    Debug,
}

#[cfg(feature = "cli")]
fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "cli")]
fn run(cli: &Cli) -> io::Result<ExitCode> {
    let input = match cli.input_file {
        Some(ref path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let mut options = if cli.literal {
        CompileOptions::literal()
    } else {
        CompileOptions::new()
    };
    if let Some(max_depth) = cli.max_depth {
        options = options.with_max_depth(max_depth);
    }

    let report = compile_with_report(&input, &options);

    if cli.check {
        print_diagnostics(&report.diagnostics);
        return Ok(if report.diagnostics.is_empty() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let rendered = render(&report, cli.format)?;
    match cli.output {
        Some(ref path) => fs::write(path, rendered)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    if cli.report {
        print_diagnostics(&report.diagnostics);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(feature = "cli")]
fn render(report: &CompileReport, format: Format) -> io::Result<String> {
    let rendered = match format {
        Format::Json => serde_json::to_string(&report.document)?,
        Format::Pretty => serde_json::to_string_pretty(&report.document)?,
        Format::Text => report.document.plain_text(),
        Format::Debug => format!("{:#?}", report.document),
    };
    Ok(rendered)
}

#[cfg(feature = "cli")]
fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        match &d.snippet {
            Some(snippet) => eprintln!(
                "{:?} at byte {}: {} ({})",
                d.severity, d.offset, d.message, snippet
            ),
            None => eprintln!("{:?} at byte {}: {}", d.severity, d.offset, d.message),
        }
    }
    if !diagnostics.is_empty() {
        eprintln!("{} diagnostic(s)", diagnostics.len());
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install probmark --features cli");
    eprintln!("  probmark [OPTIONS] [INPUT_FILE]");
}
