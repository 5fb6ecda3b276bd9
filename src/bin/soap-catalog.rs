//! SOAP Catalog CLI
//!
//! Command-line interface for building operation catalogs from WSDL
//! service descriptions and checking their references.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use soap_catalog::{
    dedup_operations, lint_sources, load_documents, location_from_arg, parse, sort_by_name,
    ParseError, ParseRequest, Severity, SourceFetcher, SourceStatus,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "soap-catalog")]
#[command(about = "Build example-rich operation catalogs from WSDL service descriptions")]
#[command(version)]
struct Cli {
    /// Log progress to stderr (-v for debug, -vv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Primary source: file path or URL (http://, https://, file://)
    primary: String,

    /// Additional source to load alongside the primary one (repeatable)
    #[arg(long = "source")]
    sources: Vec<String>,

    /// Also load documents referenced by WSDL and XSD imports
    #[arg(long)]
    follow_imports: bool,

    /// HTTP request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the operation catalog and print it as JSON
    Parse {
        #[command(flatten)]
        sources: SourceArgs,

        /// Drop operations repeating source, name and SOAP action
        #[arg(long)]
        dedup: bool,

        /// Sort operations by name
        #[arg(long)]
        sort: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Check service descriptions for unresolved references
    Lint {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let result = match cli.command {
        Commands::Parse {
            sources,
            dedup,
            sort,
            output,
            pretty,
        } => run_parse(&sources, dedup, sort, output, pretty, &cancel).await,

        Commands::Lint {
            sources,
            format,
            strict,
            quiet,
        } => run_lint(&sources, &format, strict, quiet, &cancel).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "soap_catalog=debug",
        _ => "soap_catalog=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_request(args: &SourceArgs) -> ParseRequest {
    args.sources
        .iter()
        .fold(ParseRequest::new(location_from_arg(&args.primary)), |request, source| {
            request.with_source(location_from_arg(source))
        })
        .follow_imports(args.follow_imports)
}

fn build_fetcher(args: &SourceArgs) -> Result<SourceFetcher, u8> {
    #[cfg(feature = "remote")]
    let fetcher = match args.timeout {
        Some(secs) => SourceFetcher::with_timeout(std::time::Duration::from_secs(secs)),
        None => SourceFetcher::new(),
    };
    #[cfg(not(feature = "remote"))]
    let fetcher = {
        let _ = args.timeout;
        SourceFetcher::new()
    };

    fetcher.map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn report_parse_error(e: &ParseError) -> u8 {
    if e.is_cancelled() {
        eprintln!("Interrupted");
    } else {
        eprintln!("Error: {}", e);
    }
    e.exit_code() as u8
}

async fn run_parse(
    args: &SourceArgs,
    dedup: bool,
    sort: bool,
    output: Option<PathBuf>,
    pretty: bool,
    cancel: &CancellationToken,
) -> Result<(), u8> {
    let request = build_request(args);
    let fetcher = build_fetcher(args)?;

    let mut result = parse(&request, &fetcher, cancel)
        .await
        .map_err(|e| report_parse_error(&e))?;

    if dedup {
        result.operations = dedup_operations(result.operations);
    }
    if sort {
        sort_by_name(&mut result.operations);
    }
    if result.is_empty() {
        eprintln!(
            "No operations found in {} source(s)",
            result.sources.len()
        );
    }

    let json_output = if pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, &json_output).await.map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

async fn run_lint(
    args: &SourceArgs,
    format: &str,
    strict: bool,
    quiet: bool,
    cancel: &CancellationToken,
) -> Result<(), u8> {
    let request = build_request(args);
    let fetcher = build_fetcher(args)?;

    let sources = load_documents(&request, &fetcher, cancel)
        .await
        .map_err(|e| report_parse_error(&e))?;
    let result = lint_sources(&sources, strict);

    if format == "json" {
        let json_output = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", json_output);
    } else {
        if !quiet {
            println!("Linting {} ...\n", args.primary);
        }

        for source_result in &result.results {
            let status_icon = match source_result.status {
                SourceStatus::Ok => "\x1b[32m✓\x1b[0m",
                SourceStatus::Warning => "\x1b[33m⚠\x1b[0m",
                SourceStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || source_result.status != SourceStatus::Ok {
                println!("  {} {}", status_icon, source_result.source);
            }

            for diag in &source_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.failed == 0 {
            println!(
                "\x1b[32m✓ {} sources checked, all passed\x1b[0m",
                result.sources_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} sources checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.sources_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.failed == 0 {
        Ok(())
    } else {
        Err(1)
    }
}
