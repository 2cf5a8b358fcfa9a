//! JSON:API Response CLI
//!
//! Command-line interface for resolving links and checking JSON:API documents.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use jsonapi_response::{
    absolutize, absolutize_links, load_document, parse_base, validate_document, ValidateError,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jsonapi-response")]
#[command(about = "Resolve links and validate JSON:API documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve link references against the root of a request URI
    Absolutize {
        /// Absolute request URI
        #[arg(long)]
        base: String,

        /// References to resolve
        #[arg(required = true)]
        references: Vec<String>,
    },

    /// Rewrite every link of a document as an absolute URI
    Links {
        /// Document file
        document: PathBuf,

        /// Absolute request URI
        #[arg(long)]
        base: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Check that a document follows the JSON:API structure
    Validate {
        /// Document file to validate
        document: PathBuf,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Absolutize { base, references } => run_absolutize(&base, &references),
        Commands::Links {
            document,
            base,
            output,
            pretty,
        } => run_links(&document, &base, output, pretty),
        Commands::Validate { document, json } => run_validate(&document, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_absolutize(base: &str, references: &[String]) -> Result<(), u8> {
    let base = parse_base(base).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    for reference in references {
        let resolved = absolutize(&base, reference).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;
        println!("{}", resolved);
    }

    Ok(())
}

fn run_links(document: &Path, base: &str, output: Option<PathBuf>, pretty: bool) -> Result<(), u8> {
    let base = parse_base(base).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let mut document = load_document(document).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    absolutize_links(&mut document, &base).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let json_output = if pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
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

fn run_validate(path: &Path, json_output: bool) -> Result<(), u8> {
    let document = load_document(path).map_err(|e| {
        report_error(json_output, &format!("loading document: {}", e));
        e.exit_code() as u8
    })?;

    match validate_document(&document) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}
