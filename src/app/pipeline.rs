//! The build pipeline shared by every subcommand.
//!
//! `build` turns one loaded snapshot into the full indicator bundle:
//! patch -> difference -> align -> indicators -> age tables -> mortality baselines.
//!
//! It is a pure function of its inputs. Any failing stage aborts the whole build;
//! there is no partial result.

use tracing::{debug, info, warn};

use crate::domain::{DailySeries, DateAxis, PipelineConfig, RiskTable, Snapshot};
use crate::error::AppError;
use crate::indicators::{
    PrevalenceEnvelope, case_fatality_rate, incidence, positivity, prevalence, reproduction_number,
};
use crate::io::ingest::load_snapshot;
use crate::io::source::Sources;
use crate::mortality::baseline::{MortalityBaseline, baseline_for_axis};
use crate::series::{Value, difference, ensure_aligned, interpolate_linear, pad_lagged, pad_reporting_lag, patch_gaps};
use crate::stratify::{AgeTable, cfr_by_age, stratify};

/// Vaccination coverage on the main axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Vaccination {
    pub partial: Vec<Value>,
    pub full: Vec<Value>,
    pub booster: Vec<Value>,
}

/// All-cause deaths and baseline for one mortality age band.
#[derive(Debug, Clone, PartialEq)]
pub struct BandMortality {
    pub label: String,
    pub deaths: Vec<Value>,
    pub baseline: MortalityBaseline,
}

/// A series with its position-stable name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NamedSeries<'a> {
    pub name: &'a str,
    pub values: &'a [Value],
}

/// Everything one build produces. Every daily series has `axis.len` entries.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub axis: DateAxis,
    pub new_cases: Vec<Value>,
    pub hospitalized: Vec<Value>,
    pub icu: Vec<Value>,
    pub covid_deaths: Vec<Value>,
    pub incidence: Vec<Value>,
    pub cfr: Vec<Value>,
    pub rt: Vec<Value>,
    pub positivity: Vec<Value>,
    pub tests: Vec<Value>,
    pub total_deaths: Vec<Value>,
    pub baseline: MortalityBaseline,
    pub baseline_aged: MortalityBaseline,
    pub vaccination: Vaccination,
    pub prevalence: PrevalenceEnvelope,
    pub age_new: AgeTable,
    pub age_deaths: AgeTable,
    pub age_cfr: AgeTable,
    pub age_mortality: Vec<BandMortality>,
    pub risk_tables: Vec<RiskTable>,
    /// `age_*` column names, precomputed so `series()` can borrow them.
    age_names: Vec<String>,
}

/// Names of the headline series, in bundle order.
pub const HEADLINE_SERIES: [&str; 18] = [
    "new_cases",
    "hospitalized",
    "icu",
    "covid_deaths",
    "incidence",
    "cfr",
    "rt",
    "positivity",
    "total_deaths",
    "baseline_mean",
    "baseline_inf",
    "baseline_sup",
    "vacc_partial",
    "vacc_full",
    "vacc_booster",
    "prevalence_min",
    "prevalence_max",
    "prevalence_avg",
];

impl PipelineResult {
    pub fn days(&self) -> usize {
        self.axis.len
    }

    /// The output bundle in its fixed order.
    ///
    /// Headline series first (see [`HEADLINE_SERIES`]; the baseline entries are
    /// the smoothed display curves), then `age_new`, `age_deaths` and `age_cfr`
    /// per band, then per mortality band the deaths and the smoothed baseline.
    pub fn series(&self) -> Vec<NamedSeries<'_>> {
        let headline: [&[Value]; 18] = [
            self.new_cases.as_slice(),
            self.hospitalized.as_slice(),
            self.icu.as_slice(),
            self.covid_deaths.as_slice(),
            self.incidence.as_slice(),
            self.cfr.as_slice(),
            self.rt.as_slice(),
            self.positivity.as_slice(),
            self.total_deaths.as_slice(),
            self.baseline.mean_smoothed.as_slice(),
            self.baseline.inf_smoothed.as_slice(),
            self.baseline.sup_smoothed.as_slice(),
            self.vaccination.partial.as_slice(),
            self.vaccination.full.as_slice(),
            self.vaccination.booster.as_slice(),
            self.prevalence.min.as_slice(),
            self.prevalence.max.as_slice(),
            self.prevalence.avg.as_slice(),
        ];

        let mut out: Vec<NamedSeries<'_>> = HEADLINE_SERIES
            .iter()
            .zip(headline)
            .map(|(name, values)| NamedSeries { name: *name, values })
            .collect();

        let age_values = self
            .age_new
            .series
            .iter()
            .chain(&self.age_deaths.series)
            .chain(&self.age_cfr.series)
            .chain(
                self.age_mortality
                    .iter()
                    .flat_map(|m| [&m.deaths, &m.baseline.mean_smoothed]),
            );
        out.extend(
            self.age_names
                .iter()
                .zip(age_values)
                .map(|(name, values)| NamedSeries {
                    name: name.as_str(),
                    values: values.as_slice(),
                }),
        );
        out
    }
}

fn age_names(tables: [(&str, &AgeTable); 3], mortality: &[BandMortality]) -> Vec<String> {
    let mut names = Vec::new();
    for (prefix, table) in tables {
        names.extend(table.bands.iter().map(|b| format!("{prefix}[{}]", b.label())));
    }
    for m in mortality {
        names.push(format!("mortality[{}]", m.label));
        names.push(format!("mortality_baseline[{}]", m.label));
    }
    names
}

/// Load every source and build.
pub fn run_build(sources: &Sources, config: &PipelineConfig) -> Result<PipelineResult, AppError> {
    let snapshot = load_snapshot(sources)?;
    build(&snapshot, config)
}

/// Derive the full indicator bundle from one snapshot.
pub fn build(snapshot: &Snapshot, config: &PipelineConfig) -> Result<PipelineResult, AppError> {
    let main = &snapshot.main;
    let axis = main.axis();
    let days = axis.len;
    if days == 0 {
        return Err(AppError::data("Main report has no rows."));
    }
    ensure_aligned(
        "main report",
        days,
        &[
            main.deaths_cumulative.as_slice(),
            main.hospitalized.as_slice(),
            main.icu.as_slice(),
        ],
    )?;
    info!(start = %axis.start, days, "building indicators");

    // Raw epidemic series.
    let new_cases = patch_gaps(&main.new_cases, 1, false);
    let covid_deaths = difference(&patch_gaps(&main.deaths_cumulative, 1, true));
    let hospitalized = patch_gaps(&main.hospitalized, 1, false);
    let icu = patch_gaps(&main.icu, 1, false);

    // Indicators.
    let incidence = incidence(&new_cases, &config.incidence);
    let tests = onto_axis("tests", &snapshot.tests, axis, config.tests_lag);
    let positivity = positivity(&tests, &new_cases, &config.positivity)?;
    let cfr = case_fatality_rate(&covid_deaths, &new_cases, &config.cfr)?;
    let rt = reproduction_number(&new_cases, &config.rt);
    let prevalence = prevalence(&new_cases, &tests, &positivity, &config.prevalence)?;
    info!(
        incidence_warmup = config.incidence.warmup(),
        positivity_warmup = config.positivity.warmup(),
        cfr_warmup = config.cfr.warmup(),
        rt_warmup = config.rt.warmup(),
        "indicators computed"
    );

    // Age tables.
    let raw_new = stratify("age cases", &main.age_cases, days)?;
    let raw_deaths = stratify("age deaths", &main.age_deaths, days)?;
    let age_new = raw_new.smoothed(config.age_smoothing);
    let age_deaths = raw_deaths.smoothed(config.age_smoothing);
    let age_cfr = cfr_by_age(&raw_new, &raw_deaths, &age_new, &config.cfr)?;
    info!(bands = age_new.bands.len(), "age tables computed");

    // Mortality.
    let mortality = &snapshot.mortality;
    let total_deaths = onto_axis("all-cause deaths", &mortality.total, axis, 0);
    let baseline = baseline_for_axis(&mortality.total, axis.start, days, &config.baseline, false)?;
    let baseline_aged = baseline_for_axis(&mortality.total, axis.start, days, &config.baseline, true)?;
    let mut age_mortality = Vec::with_capacity(mortality.bands.len());
    for (label, series) in &mortality.bands {
        age_mortality.push(BandMortality {
            label: label.clone(),
            deaths: onto_axis(label, series, axis, 0),
            baseline: baseline_for_axis(series, axis.start, days, &config.baseline, false)?,
        });
    }
    info!(
        anchor = config.baseline.anchor_for(axis.start),
        bands = age_mortality.len(),
        "mortality baselines computed"
    );

    // Vaccination.
    let vax = &snapshot.vaccination;
    let vaccination = Vaccination {
        partial: coverage("partial", &vax.partial, days, config.vaccination_lag),
        full: coverage("full", &vax.full, days, config.vaccination_lag),
        booster: coverage("booster", &vax.booster, days, config.vaccination_lag),
    };

    let age_names = age_names(
        [("age_new", &age_new), ("age_deaths", &age_deaths), ("age_cfr", &age_cfr)],
        &age_mortality,
    );
    info!(series = HEADLINE_SERIES.len() + age_names.len(), "build complete");

    Ok(PipelineResult {
        axis,
        new_cases,
        hospitalized,
        icu,
        covid_deaths,
        incidence,
        cfr,
        rt,
        positivity,
        tests,
        total_deaths,
        baseline,
        baseline_aged,
        vaccination,
        prevalence,
        age_new,
        age_deaths,
        age_cfr,
        age_mortality,
        risk_tables: snapshot.risk_tables.clone(),
        age_names,
    })
}

/// Place a dated series on the main axis.
///
/// Days before its start, after its end and within the last `lag` days of the
/// axis become missing.
fn onto_axis(what: &str, series: &DailySeries, axis: DateAxis, lag: usize) -> Vec<Value> {
    let values = series.since(axis.start);
    let short = axis.len.saturating_sub(values.len());
    if short > lag {
        debug!(what, short, lag, "series ends before the main axis; padding end");
    }
    pad_reporting_lag(&values, lag, axis.len, None)
}

/// Coverage counters: interpolate interior gaps, then the two-stage lagged pad.
fn coverage(what: &str, series: &DailySeries, days: usize, lag: usize) -> Vec<Value> {
    if series.is_empty() {
        warn!(what, "no vaccination data; coverage left missing");
        return vec![None; days];
    }
    pad_lagged(&interpolate_linear(&series.values), lag, days, None, Some(0.0))
}
