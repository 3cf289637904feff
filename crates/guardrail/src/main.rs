//! guardrail - Guardrail compliance coverage across project roots
//!
//! guardrail resolves each project root's guardrail rule-set, reads the
//! compliance matrices of its specifications and reports how well every
//! rule is covered, per root and across all roots.

use std::path::PathBuf;

use clap::Parser;
use eyre::{Result, WrapErr};
use guardrail::engine::Engine;
use guardrail::output::{OutputFormat, render_report};
use guardrail::root_descriptors;
use guardrail::settings::{Settings, SettingsOverrides};
use owo_colors::OwoColorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// CLI arguments
#[derive(Debug, Parser)]
#[command(name = "guardrail", version, about)]
struct Args {
    /// Project roots to analyze (default: current directory)
    roots: Vec<PathBuf>,

    /// Root whose rule-set every other root shares
    #[arg(long = "primary", env = "GUARDRAIL_PRIMARY_ROOT")]
    primary: Option<PathBuf>,

    /// Specifications directory, relative to each root
    #[arg(long, env = "GUARDRAIL_SPECS_DIR")]
    specs_dir: Option<PathBuf>,

    /// Rule-set configuration document, relative to each root
    #[arg(long, env = "GUARDRAIL_CONFIG_PATH")]
    config_path: Option<PathBuf>,

    /// Requirements document name inside each specification
    #[arg(long)]
    requirements_file: Option<String>,

    /// Output format: text, json, markdown
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Also report each root separately
    #[arg(long)]
    per_root: bool,

    /// Exit 1 when coverage is below the threshold or a critical rule is not covered
    #[arg(long)]
    check: bool,

    /// Minimum coverage percentage for --check
    #[arg(long, default_value_t = 100.0)]
    threshold: f64,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let format = OutputFormat::from_str(&args.format)
        .ok_or_else(|| eyre::eyre!("Unknown output format '{}'", args.format))?;

    let workspace = std::env::current_dir().wrap_err("Failed to determine current directory")?;
    let mut settings = Settings::load(&workspace)?;
    settings.apply(SettingsOverrides {
        specs_dir: args.specs_dir,
        config_path: args.config_path,
        requirements_file: args.requirements_file,
        primary_root: args
            .primary
            .map(|path| std::path::absolute(&path))
            .transpose()
            .wrap_err("Failed to resolve primary root")?,
    });

    let roots = if args.roots.is_empty() {
        root_descriptors(&[workspace])?
    } else {
        root_descriptors(&args.roots)?
    };

    let engine = Engine::new(settings, roots).await?;
    let snapshot = engine.snapshot().await;
    let report = snapshot.report();

    print!("{}", render_report(&report, format, args.per_root)?);

    if args.check && !snapshot.pass.flat().is_passing(args.threshold) {
        for coverage in snapshot.pass.flat().uncovered_critical() {
            eprintln!(
                "{} critical rule {}. {} is not covered",
                "!".red().bold(),
                coverage.rule.id,
                coverage.rule.name
            );
        }
        eprintln!(
            "{} coverage {:.1}% (threshold {:.1}%)",
            "!".red().bold(),
            report.flat.summary.coverage_percent,
            args.threshold
        );
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("guardrail=debug,guardrail_core=debug")
    } else {
        EnvFilter::try_from_env("GUARDRAIL_LOG")
            .unwrap_or_else(|_| EnvFilter::new("guardrail=info,guardrail_core=info"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
