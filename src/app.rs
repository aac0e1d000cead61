//! Top-level application orchestration.
//!
//! `src/main.rs` only maps errors to exit codes; this module is the real main:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - builds the pipeline from the snapshot (or a synthetic one)
//! - prints reports
//! - writes optional exports

use chrono::NaiveDate;
use clap::Parser;
use tracing::info;

use crate::cli::{BuildArgs, Command, DemoArgs, ExportArgs, SummaryArgs};
use crate::domain::PipelineConfig;
use crate::error::AppError;
use crate::logging::{LogFormat, init_logging};

pub mod pipeline;

use pipeline::PipelineResult;

/// Entry point for the `coviz` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging(LogFormat::from_env());

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Build(args) => handle_build(args),
        Command::Summary(args) => handle_summary(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn handle_build(args: BuildArgs) -> Result<(), AppError> {
    let config = args.config.pipeline_config()?;
    let result = pipeline::run_build(&args.sources.sources(), &config)?;

    println!("{}", crate::report::format_build_summary(&result, &config));
    write_exports(&args.export, &result)
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    let config = args.config.pipeline_config()?;
    let result = pipeline::run_build(&args.sources.sources(), &config)?;
    print_range(&result, args.from, args.to)
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = args.config.pipeline_config()?;
    let params = args.synthetic_params();
    info!(days = params.days, seed = params.seed, "generating synthetic snapshot");
    let snapshot = crate::data::synthetic::generate_snapshot(&params)?;
    let result = pipeline::build(&snapshot, &config)?;

    println!("{}", crate::report::format_build_summary(&result, &config));

    let (from, to) = match (args.from, args.to) {
        (Some(from), Some(to)) => (from, to),
        _ => demo_range(&result, &config)?,
    };
    print_range(&result, from, to)?;
    write_exports(&args.export, &result)
}

fn print_range(result: &PipelineResult, from: NaiveDate, to: NaiveDate) -> Result<(), AppError> {
    let summary = crate::mortality::summarize_range(result, from, to)?;
    let fit = crate::mortality::correlate_range(result, from, to)?;
    println!("{}", crate::report::format_range_summary(&summary, fit.as_ref()));
    Ok(())
}

/// The whole synthetic span after the indicator warm-up.
fn demo_range(result: &PipelineResult, config: &PipelineConfig) -> Result<(NaiveDate, NaiveDate), AppError> {
    let end = result
        .axis
        .end()
        .ok_or_else(|| AppError::data("Synthetic snapshot has no days."))?;
    let skip = config.cfr.warmup().min(result.days().saturating_sub(1));
    let from = result.axis.date_at(skip).unwrap_or(result.axis.start);
    Ok((from, end))
}

fn write_exports(export: &ExportArgs, result: &PipelineResult) -> Result<(), AppError> {
    if let Some(path) = &export.export {
        crate::io::write_series_csv(path, result)?;
        info!(path = %path.display(), "wrote series CSV");
    }
    if let Some(path) = &export.export_json {
        crate::io::write_bundle_json(path, result)?;
        info!(path = %path.display(), "wrote bundle JSON");
    }
    Ok(())
}

/// Rewrite argv so `coviz` defaults to `coviz build`.
///
/// Rules:
/// - `coviz`                      -> `coviz build`
/// - `coviz --main x.csv ...`     -> `coviz build --main x.csv ...`
/// - `coviz --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("build".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    if matches!(arg1.as_str(), "build" | "summary" | "demo") {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "build".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_builds() {
        assert_eq!(rewrite_args(argv(&["coviz"])), argv(&["coviz", "build"]));
        assert_eq!(
            rewrite_args(argv(&["coviz", "--main", "x.csv"])),
            argv(&["coviz", "build", "--main", "x.csv"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        for args in [
            &["coviz", "--help"][..],
            &["coviz", "-V"][..],
            &["coviz", "demo", "--days", "90"][..],
            &["coviz", "summary", "--from", "01-01-2021", "--to", "31-01-2021"][..],
        ] {
            assert_eq!(rewrite_args(argv(args)), argv(args));
        }
    }

    #[test]
    fn demo_range_skips_the_warmup() {
        let config = PipelineConfig::default();
        let snapshot = crate::data::synthetic::generate_snapshot(&Default::default()).unwrap();
        let result = pipeline::build(&snapshot, &config).unwrap();
        let (from, to) = demo_range(&result, &config).unwrap();
        assert_eq!(from, result.axis.date_at(config.cfr.warmup()).unwrap());
        assert_eq!(Some(to), result.axis.end());
    }
}
