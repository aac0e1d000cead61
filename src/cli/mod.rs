//! Command-line parsing.
//!
//! Argument parsing stays separate from the pipeline: this module only turns
//! flags and `COVIZ_*` environment variables into [`Sources`] and
//! [`PipelineConfig`] values.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::data::synthetic::SyntheticParams;
use crate::domain::{PipelineConfig, RedLines};
use crate::error::AppError;
use crate::io::ingest::parse_date;
use crate::io::source::Sources;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "coviz", version, about = "Epidemic indicator pipeline (incidence, Rt, CFR, excess mortality)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build every indicator, print the summary and optionally export the bundle.
    Build(BuildArgs),
    /// Build, then total a date range and correlate Covid deaths with excess deaths.
    Summary(SummaryArgs),
    /// Run the pipeline on a seeded synthetic snapshot.
    Demo(DemoArgs),
}

/// Where the snapshot tables live. Each may be a path or an http(s) URL.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Main daily report.
    #[arg(long, env = "COVIZ_MAIN", default_value = "data/data.csv")]
    pub main: String,

    /// Daily tests table.
    #[arg(long, env = "COVIZ_TESTS", default_value = "data/amostras.csv")]
    pub tests: String,

    /// All-cause mortality table (daily, from 2009).
    #[arg(long, env = "COVIZ_MORTALITY", default_value = "data/mortality.csv")]
    pub mortality: String,

    /// Vaccination coverage table.
    #[arg(long, env = "COVIZ_VACCINATION")]
    pub vaccination: Option<String>,

    /// Risk tables by vaccination status (repeat or comma-separate).
    #[arg(long = "risk-table", env = "COVIZ_RISK_TABLES", value_delimiter = ',')]
    pub risk_tables: Vec<String>,
}

impl SourceArgs {
    pub fn sources(&self) -> Sources {
        Sources {
            main: self.main.clone(),
            tests: self.tests.clone(),
            mortality: self.mortality.clone(),
            vaccination: self.vaccination.clone(),
            risk_tables: self.risk_tables.clone(),
        }
    }
}

/// Indicator parameters. Defaults are the current dashboard settings.
#[derive(Debug, Args, Clone)]
pub struct ConfigArgs {
    /// Population used for per-100k and prevalence figures.
    #[arg(long, env = "COVIZ_POPULATION", default_value_t = 10_280_000.0)]
    pub population: f64,

    /// Days between a test and the case it confirms.
    #[arg(long, env = "COVIZ_POSITIVITY_PERIOD", default_value_t = 2)]
    pub positivity_period: usize,

    /// Days between infection report and death used by the CFR.
    #[arg(long, env = "COVIZ_CFR_DELAY", default_value_t = 14)]
    pub cfr_delay: usize,

    /// Trailing days of the tests table still awaiting results.
    #[arg(long, env = "COVIZ_TESTS_LAG", default_value_t = 2)]
    pub tests_lag: usize,

    /// Leading days ignored by CFR, Rt and positivity.
    #[arg(long, env = "COVIZ_IGNORE", default_value_t = 15)]
    pub ignore: usize,

    /// Window Rt compares the current day with.
    #[arg(long, env = "COVIZ_RT_PERIOD", default_value_t = 7)]
    pub rt_period: usize,

    /// Smoothing window of the age-band series.
    #[arg(long, env = "COVIZ_AGE_SMOOTHING", default_value_t = 7)]
    pub age_smoothing: usize,

    /// Reporting lag of vaccination counts.
    #[arg(long, env = "COVIZ_VACCINATION_LAG", default_value_t = 14)]
    pub vaccination_lag: usize,

    /// Yearly growth of all-cause deaths from population aging.
    #[arg(long, env = "COVIZ_AGING", default_value_t = 966.99)]
    pub aging: f64,

    /// Red line: 14-day incidence per 100k.
    #[arg(long, env = "COVIZ_LIMIT_INCIDENCE", default_value_t = 120.0)]
    pub limit_incidence: f64,

    /// Red line: positivity (%).
    #[arg(long, env = "COVIZ_LIMIT_POSITIVITY", default_value_t = 4.0)]
    pub limit_positivity: f64,

    /// Red line: Rt.
    #[arg(long, env = "COVIZ_LIMIT_RT", default_value_t = 1.0)]
    pub limit_rt: f64,

    /// Red line: ICU occupancy.
    #[arg(long, env = "COVIZ_LIMIT_ICU", default_value_t = 245.0)]
    pub limit_icu: f64,
}

impl ConfigArgs {
    pub fn pipeline_config(&self) -> Result<PipelineConfig, AppError> {
        if !(self.population.is_finite() && self.population > 0.0) {
            return Err(AppError::input("Population must be a positive number."));
        }
        let mut config = PipelineConfig::for_population(self.population);
        config.positivity.period = self.positivity_period;
        config.positivity.ignore = self.ignore;
        config.tests_lag = self.tests_lag;
        config.cfr.delay = self.cfr_delay;
        config.cfr.ignore = self.ignore;
        config.rt.period = self.rt_period;
        config.rt.ignore = self.ignore;
        config.age_smoothing = self.age_smoothing;
        config.vaccination_lag = self.vaccination_lag;
        config.baseline.aging_per_year = self.aging;
        config.red_lines = RedLines {
            incidence: self.limit_incidence,
            positivity: self.limit_positivity,
            rt: self.limit_rt,
            icu: self.limit_icu,
        };
        Ok(config)
    }
}

/// Bundle export targets.
#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    /// Export every series to CSV (one row per day).
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the whole bundle to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub sources: SourceArgs,
    #[command(flatten)]
    pub config: ConfigArgs,
    #[command(flatten)]
    pub export: ExportArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub sources: SourceArgs,
    #[command(flatten)]
    pub config: ConfigArgs,

    /// First day of the range (DD-MM-YYYY).
    #[arg(long, value_parser = parse_cli_date)]
    pub from: NaiveDate,

    /// Last day of the range (DD-MM-YYYY).
    #[arg(long, value_parser = parse_cli_date)]
    pub to: NaiveDate,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
    #[command(flatten)]
    pub export: ExportArgs,

    /// Days of synthetic data from 26-02-2020.
    #[arg(long, default_value_t = 600)]
    pub days: usize,

    /// Random seed.
    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    /// Also total this range (DD-MM-YYYY) after building.
    #[arg(long, value_parser = parse_cli_date, requires = "to")]
    pub from: Option<NaiveDate>,

    #[arg(long, value_parser = parse_cli_date, requires = "from")]
    pub to: Option<NaiveDate>,
}

impl DemoArgs {
    pub fn synthetic_params(&self) -> SyntheticParams {
        SyntheticParams {
            days: self.days,
            seed: self.seed,
            population: self.config.population,
            ..SyntheticParams::default()
        }
    }
}

fn parse_cli_date(s: &str) -> Result<NaiveDate, String> {
    parse_date(s.trim())
}
