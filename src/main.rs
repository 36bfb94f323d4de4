use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};

use yunisym::table::{ScopeDump, SymbolDump};
use yunisym::{AnalysisPipeline, CompilationState, Session, SessionOptions};

#[derive(Parser)]
#[command(name = "yunisym")]
#[command(author, version, about = "Symbol table and type checker for Yuni modules", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directories searched when resolving imports
    #[arg(short = 'I', long = "search-path", global = true)]
    search_paths: Vec<PathBuf>,

    /// Warn when a declaration shadows an outer binding
    #[arg(long, global = true, default_value_t = true, action = clap::ArgAction::Set)]
    warn_shadowing: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DumpFormat {
    /// Human-readable tree (default)
    #[value(name = "text")]
    Text,
    /// JSON document
    #[value(name = "json")]
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a module and report diagnostics
    Check {
        /// The module file (JSON syntax tree) to check
        input: PathBuf,
    },

    /// Analyze a module and print its global scope
    Dump {
        /// The module file (JSON syntax tree) to dump
        input: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: DumpFormat,
    },
}

fn main() -> Result<()> {
    // Initialize logger before parsing CLI args
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbose flag
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    let options = SessionOptions {
        search_paths: cli.search_paths,
        warn_shadowing: cli.warn_shadowing,
    };

    let result = match cli.command {
        Commands::Check { input } => check(input, options),
        Commands::Dump { input, format } => dump(input, options, format),
    };

    match result {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn analyze(input: &Path, options: SessionOptions) -> Result<(AnalysisPipeline, bool)> {
    let state = CompilationState::new(input)
        .with_context(|| format!("Failed to load module: {:?}", input))?;
    let mut pipeline = AnalysisPipeline::new(state, Session::new(options));
    let ok = pipeline.analyze();
    pipeline.report_errors()?;
    Ok((pipeline, ok))
}

fn check(input: PathBuf, options: SessionOptions) -> Result<bool> {
    let (pipeline, ok) = analyze(&input, options)?;
    let state = pipeline.state();
    if ok {
        println!(
            "{}: {} ({} warning(s))",
            "ok".green().bold(),
            input.display(),
            state.warning_count()
        );
    }
    Ok(ok)
}

fn dump(input: PathBuf, options: SessionOptions, format: DumpFormat) -> Result<bool> {
    let (pipeline, ok) = analyze(&input, options)?;
    let scopes = pipeline.dump();

    match format {
        DumpFormat::Json => {
            let json = serde_json::to_string_pretty(&scopes).context("Failed to serialize dump")?;
            println!("{}", json);
        }
        DumpFormat::Text => {
            for scope in &scopes {
                print_scope(scope);
            }
        }
    }
    Ok(ok)
}

fn print_scope(scope: &ScopeDump) {
    println!("{}", format!("=== Scope level {} ===", scope.level).blue().bold());
    for symbol in &scope.symbols {
        print_symbol(symbol, 0);
    }
}

fn print_symbol(symbol: &SymbolDump, depth: usize) {
    let indent = "  ".repeat(depth);
    let mut line = format!(
        "{}{} {} {}",
        indent,
        symbol.kind.to_string().cyan(),
        symbol.name.bold(),
        format!("[{}]", symbol.raw_value).dimmed()
    );
    if let Some(type_name) = &symbol.type_name {
        line.push_str(&format!(": {}", type_name.yellow()));
    }
    if !symbol.labels.is_empty() {
        line.push_str(&format!(" ({})", symbol.labels.join(" ")));
    }
    if !symbol.bases.is_empty() {
        line.push_str(&format!(" extends {}", symbol.bases.join(", ")));
    }
    println!("{}", line);

    for member in &symbol.members {
        print_symbol(member, depth + 1);
    }
}
