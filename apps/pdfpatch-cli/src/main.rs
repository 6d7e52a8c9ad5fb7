//! pdfpatch command-line driver
//!
//! ```text
//! pdfpatch apply --input in.pdf --output out.pdf --directives mods.json
//! pdfpatch info in.pdf
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pdfpatch_core::{
    Directive, DirectiveOutcome, FailurePolicy, MutationOptions, MutationReport, PdfMutator,
    UnsupportedCharPolicy,
};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "pdfpatch")]
#[command(about = "Overlay replacement text on PDF pages without rewriting their content")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a JSON directive list to a PDF
    Apply(ApplyArgs),
    /// Print page count and page boxes
    Info {
        /// PDF to inspect
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ApplyArgs {
    #[arg(short, long)]
    input: PathBuf,

    #[arg(short, long)]
    output: PathBuf,

    /// JSON array of directives
    #[arg(short, long)]
    directives: PathBuf,

    /// Abort the whole batch on the first failing directive
    #[arg(long)]
    abort_on_error: bool,

    /// Fail directives whose text WinAnsiEncoding cannot represent
    #[arg(long)]
    reject_unsupported: bool,

    /// Flate-compress overlay streams
    #[arg(long)]
    compress: bool,

    /// Wrap original page content in q/Q before overlaying
    #[arg(long)]
    isolate: bool,

    /// Print the report as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

impl ApplyArgs {
    fn mutation_options(&self) -> MutationOptions {
        MutationOptions {
            failure_policy: if self.abort_on_error {
                FailurePolicy::Abort
            } else {
                FailurePolicy::Continue
            },
            unsupported_chars: if self.reject_unsupported {
                UnsupportedCharPolicy::Reject
            } else {
                UnsupportedCharPolicy::Substitute
            },
            compress_overlays: self.compress,
            isolate_page_state: self.isolate,
        }
    }
}

fn apply(args: &ApplyArgs) -> Result<MutationReport> {
    let json = fs::read_to_string(&args.directives)
        .with_context(|| format!("reading directives from {}", args.directives.display()))?;
    let directives = Directive::from_json_list(&json)
        .with_context(|| format!("parsing {}", args.directives.display()))?;

    let report = PdfMutator::new(args.mutation_options())
        .mutate_file(&args.input, &args.output, &directives)
        .with_context(|| format!("mutating {}", args.input.display()))?;
    info!("Wrote {}", args.output.display());
    Ok(report)
}

fn summarize(report: &MutationReport) -> String {
    let mut lines = vec![format!(
        "{} applied, {} skipped, {} failed ({} page(s))",
        report.applied(),
        report.skipped(),
        report.failed(),
        report.page_count
    )];
    for entry in &report.outcomes {
        match &entry.outcome {
            DirectiveOutcome::Applied { .. } => {}
            DirectiveOutcome::Skipped { reason } => {
                lines.push(format!("  #{} page {}: skipped, {}", entry.index, entry.page, reason))
            }
            DirectiveOutcome::Failed { message } => {
                lines.push(format!("  #{} page {}: failed, {}", entry.index, entry.page, message))
            }
        }
    }
    lines.join("\n")
}

fn info_text(file: &Path) -> Result<String> {
    let bytes = fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let pages = pdfpatch_core::page_info(&bytes)?;

    let mut lines = vec![format!("{}: {} page(s)", file.display(), pages.len())];
    lines.extend(pages.iter().map(|p| {
        format!(
            "  page {}: origin ({}, {}) size {} x {}",
            p.index, p.x0, p.y0, p.width, p.height
        )
    }));
    Ok(lines.join("\n"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Apply(args) => {
            let report = apply(&args)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", summarize(&report));
            }
        }
        Command::Info { file } => println!("{}", info_text(&file)?),
    }

    Ok(())
}
