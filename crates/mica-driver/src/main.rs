use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use mica_lexer::{Lexer, TokenKind};
use mica_resolver::{link_modules, LinkError, SyntaxError};
use std::path::PathBuf;
use std::process::ExitCode;

mod emit;
mod libdir;
mod scan;

use libdir::DirRegistry;

#[derive(Parser)]
#[command(
    name = "mica",
    version = "0.1.0",
    about = "Module linker for the Mica teaching language",
    long_about = "Resolves a Mica module graph from an entry file, orders it,\nvalidates its exports and links it into a single program."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Link a module graph into a single program
    Link {
        /// Entry module file
        entry: PathBuf,

        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory of library manifests
        #[arg(long, default_value = "lib")]
        libs: PathBuf,

        /// Skip import binding checks
        #[arg(long)]
        no_strict: bool,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Resolve a module graph and print its initialization order
    Deps {
        /// Entry module file
        entry: PathBuf,

        /// Directory of library manifests
        #[arg(long, default_value = "lib")]
        libs: PathBuf,
    },

    /// Parse a Mica file and show its syntax tree (debug)
    Parse {
        /// Input file
        input: PathBuf,
    },

    /// Lex a Mica file and show tokens (debug)
    Lex {
        /// Input file
        input: PathBuf,

        /// Show token positions
        #[arg(short, long)]
        positions: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Link {
            entry,
            output,
            libs,
            no_strict,
            verbose,
        } => link_command(entry, output, libs, no_strict, verbose).await,
        Commands::Deps { entry, libs } => deps_command(entry, libs).await,
        Commands::Parse { input } => parse_command(input).await,
        Commands::Lex { input, positions } => lex_command(input, positions).await,
    }
}

/// Parse adapter for the resolver: surfaces the first diagnostic of a
/// file. Remaining diagnostics reappear when the file is fixed.
fn parse_file(source: &str, file_id: mica_ast::FileId) -> Result<mica_ast::Program, SyntaxError> {
    mica_parser::parse_source(source, file_id).map_err(|mut errors| {
        let first = errors.remove(0);
        SyntaxError {
            message: first.message,
            span: first.span,
        }
    })
}

async fn link_command(
    entry: PathBuf,
    output: Option<PathBuf>,
    libs: PathBuf,
    no_strict: bool,
    verbose: bool,
) -> ExitCode {
    let project = match scan::scan_project(&entry).await {
        Ok(project) => project,
        Err(e) => {
            eprintln!("Error reading project: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if verbose {
        println!("Scanned {} source file(s)", project.files.len());
    }

    let registry = DirRegistry::new(libs);
    let result = link_modules(
        &project.files,
        &project.entry,
        parse_file,
        &registry,
        !no_strict,
    )
    .await;

    let (program, order) = match result {
        Ok(linked) => linked,
        Err(errors) => {
            report_link_errors(&errors, &project.files);
            return ExitCode::FAILURE;
        }
    };
    if verbose {
        println!("Linked {} module(s)", order.len());
        for key in &order {
            println!("  {}", key);
        }
    }

    let text = emit::program(&program);
    match output {
        Some(path) => {
            if let Err(e) = tokio::fs::write(&path, text).await {
                eprintln!("Error writing {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
            if verbose {
                println!("Wrote {}", path.display());
            }
        }
        None => print!("{}", text),
    }
    ExitCode::SUCCESS
}

async fn deps_command(entry: PathBuf, libs: PathBuf) -> ExitCode {
    let project = match scan::scan_project(&entry).await {
        Ok(project) => project,
        Err(e) => {
            eprintln!("Error reading project: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let registry = DirRegistry::new(libs);
    let table = match mica_resolver::graph::build(
        &project.files,
        &project.entry,
        parse_file,
        &registry,
    )
    .await
    {
        Ok(table) => table,
        Err(e) => {
            report_link_errors(&[e], &project.files);
            return ExitCode::FAILURE;
        }
    };

    let order = match mica_resolver::sort::sort(&table) {
        Ok(order) => order,
        Err(e) => {
            report_link_errors(&[e], &project.files);
            return ExitCode::FAILURE;
        }
    };

    for key in &order {
        println!("{}", key);
        if let Some(module) = table.get_local(key) {
            for dep in &module.dependencies {
                println!("  -> {}", dep);
            }
        }
    }
    ExitCode::SUCCESS
}

async fn parse_command(input: PathBuf) -> ExitCode {
    let source = match tokio::fs::read_to_string(&input).await {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match mica_parser::parse_source(&source, 0) {
        Ok(program) => {
            println!("{:#?}", program);
            ExitCode::SUCCESS
        }
        Err(errors) => {
            let filename = input.display().to_string();
            for error in errors {
                report_error(
                    "E0001",
                    "Syntax error",
                    &error.message,
                    error.span.start,
                    error.span.end,
                    &filename,
                    &source,
                );
            }
            ExitCode::FAILURE
        }
    }
}

async fn lex_command(input: PathBuf, positions: bool) -> ExitCode {
    let source = match tokio::fs::read_to_string(&input).await {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let tokens = Lexer::new(&source).tokenize();
    let mut failed = false;
    for token in &tokens {
        if token.kind == TokenKind::Error {
            failed = true;
        }
        if positions {
            println!("{:?} {:?} @ {}..{}", token.kind, token.value, token.span.start, token.span.end);
        } else {
            println!("{:?} {:?}", token.kind, token.value);
        }
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn report_link_errors(errors: &[LinkError], files: &std::collections::HashMap<String, String>) {
    for error in errors {
        let (code, title) = error_code(error);
        match error.location() {
            Some(loc) if files.contains_key(&loc.path) => {
                report_error(
                    code,
                    title,
                    &error.to_string(),
                    loc.span.start,
                    loc.span.end,
                    &loc.path,
                    &files[&loc.path],
                );
            }
            _ => eprintln!("error[{}]: {}", code, error),
        }
    }
}

/// Stable diagnostic codes: E01xx resolution, E02xx structural, E03xx
/// binding.
fn error_code(error: &LinkError) -> (&'static str, &'static str) {
    match error {
        LinkError::ModuleNotFound { .. } => ("E0101", "Module not found"),
        LinkError::LibraryNotFound { .. } => ("E0102", "Library not found"),
        LinkError::InvalidPath { .. } => ("E0103", "Invalid module path"),
        LinkError::Syntax { .. } => ("E0104", "Syntax error"),
        LinkError::SelfImport { .. } => ("E0201", "Self import"),
        LinkError::CircularImport { .. } => ("E0202", "Circular import"),
        LinkError::DuplicateExport { .. } => ("E0203", "Duplicate export"),
        LinkError::UndefinedImport { .. } => ("E0301", "Undefined import"),
        LinkError::UndefinedDefaultImport { .. } => ("E0302", "No default export"),
        LinkError::UndefinedNamespaceImport { .. } => ("E0303", "Empty namespace import"),
    }
}

fn report_error(
    code: &str,
    title: &str,
    message: &str,
    start: usize,
    end: usize,
    filename: &str,
    source: &str,
) {
    let span = (filename, start..end);
    Report::build(ReportKind::Error, span.clone())
        .with_code(code)
        .with_message(title)
        .with_label(
            Label::new(span)
                .with_message(message)
                .with_color(Color::Red),
        )
        .finish()
        .print((filename, Source::from(source)))
        .unwrap();
}
