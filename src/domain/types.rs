//! Shared domain types.
//!
//! These types describe a dataset snapshot as the loader hands it over and the
//! configuration the pipeline runs with. They are plain data: no type here
//! computes an indicator.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::indicators::{CfrParams, IncidenceParams, PositivityParams, PrevalenceParams, RtParams};
use crate::mortality::baseline::BaselineParams;
use crate::series::{Side, Value, pad};

/// Ten-year age bands used by the case and death reports.
///
/// The order of [`AgeBand::ALL`] is part of the output contract: callers pick
/// series by index (`40-49` is index 4, `80+` is the last band).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeBand {
    #[serde(rename = "0-9")]
    Age0To9,
    #[serde(rename = "10-19")]
    Age10To19,
    #[serde(rename = "20-29")]
    Age20To29,
    #[serde(rename = "30-39")]
    Age30To39,
    #[serde(rename = "40-49")]
    Age40To49,
    #[serde(rename = "50-59")]
    Age50To59,
    #[serde(rename = "60-69")]
    Age60To69,
    #[serde(rename = "70-79")]
    Age70To79,
    #[serde(rename = "80+")]
    Age80Plus,
}

impl AgeBand {
    pub const ALL: [AgeBand; 9] = [
        AgeBand::Age0To9,
        AgeBand::Age10To19,
        AgeBand::Age20To29,
        AgeBand::Age30To39,
        AgeBand::Age40To49,
        AgeBand::Age50To59,
        AgeBand::Age60To69,
        AgeBand::Age70To79,
        AgeBand::Age80Plus,
    ];

    /// Legend label.
    pub fn label(self) -> &'static str {
        match self {
            AgeBand::Age0To9 => "0-9",
            AgeBand::Age10To19 => "10-19",
            AgeBand::Age20To29 => "20-29",
            AgeBand::Age30To39 => "30-39",
            AgeBand::Age40To49 => "40-49",
            AgeBand::Age50To59 => "50-59",
            AgeBand::Age60To69 => "60-69",
            AgeBand::Age70To79 => "70-79",
            AgeBand::Age80Plus => "80+",
        }
    }

    /// Position in [`AgeBand::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column-name fragment used by the daily report (`40_49`, `80_plus`).
    fn column_stem(self) -> &'static str {
        match self {
            AgeBand::Age0To9 => "0_9",
            AgeBand::Age10To19 => "10_19",
            AgeBand::Age20To29 => "20_29",
            AgeBand::Age30To39 => "30_39",
            AgeBand::Age40To49 => "40_49",
            AgeBand::Age50To59 => "50_59",
            AgeBand::Age60To69 => "60_69",
            AgeBand::Age70To79 => "70_79",
            AgeBand::Age80Plus => "80_plus",
        }
    }

    /// Cumulative confirmed-case columns as `(female, male)`.
    pub fn case_columns(self) -> (String, String) {
        let stem = self.column_stem();
        (format!("confirmados_{stem}_f"), format!("confirmados_{stem}_m"))
    }

    /// Cumulative death columns as `(female, male)`.
    pub fn death_columns(self) -> (String, String) {
        let stem = self.column_stem();
        (format!("obitos_{stem}_f"), format!("obitos_{stem}_m"))
    }
}

/// A contiguous run of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateAxis {
    pub start: NaiveDate,
    pub len: usize,
}

impl DateAxis {
    pub fn new(start: NaiveDate, len: usize) -> Self {
        Self { start, len }
    }

    pub fn date_at(&self, index: usize) -> Option<NaiveDate> {
        if index >= self.len {
            return None;
        }
        self.start.checked_add_signed(Duration::days(index as i64))
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - self.start).num_days();
        if offset < 0 || offset as usize >= self.len {
            return None;
        }
        Some(offset as usize)
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.len.checked_sub(1).and_then(|last| self.date_at(last))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.len).filter_map(|i| self.date_at(i))
    }
}

/// A daily series with its own start date.
///
/// Tables published on a different schedule than the main report (tests,
/// vaccination, all-cause mortality) arrive as `DailySeries` and are moved onto
/// the main axis by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    pub start: NaiveDate,
    pub values: Vec<Value>,
}

impl DailySeries {
    pub fn new(start: NaiveDate, values: Vec<Value>) -> Self {
        Self { start, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn axis(&self) -> DateAxis {
        DateAxis::new(self.start, self.values.len())
    }

    /// Values from `day` onward.
    ///
    /// Days before this series' start are reported as missing so that index 0
    /// of the result is always `day`.
    pub fn since(&self, day: NaiveDate) -> Vec<Value> {
        let offset = (day - self.start).num_days();
        if offset >= 0 {
            let skip = (offset as usize).min(self.values.len());
            return self.values[skip..].to_vec();
        }
        let lead = offset.unsigned_abs() as usize;
        pad(&self.values, self.values.len() + lead, None, Side::Start)
    }

    /// Values between two dates (inclusive), located by exact date match.
    pub fn between(&self, from: NaiveDate, to: NaiveDate) -> Option<&[Value]> {
        let axis = self.axis();
        let lo = axis.index_of(from)?;
        let hi = axis.index_of(to)?;
        (lo <= hi).then(|| &self.values[lo..=hi])
    }
}

/// Cumulative counters for one age band, split by sex.
#[derive(Debug, Clone, PartialEq)]
pub struct BandCounters {
    pub band: AgeBand,
    pub female: Vec<Value>,
    pub male: Vec<Value>,
}

/// The main daily report, one entry per day from `start`.
#[derive(Debug, Clone)]
pub struct MainTable {
    pub start: NaiveDate,
    /// Daily new confirmed cases (reported directly, not differenced).
    pub new_cases: Vec<Value>,
    pub deaths_cumulative: Vec<Value>,
    pub hospitalized: Vec<Value>,
    pub icu: Vec<Value>,
    pub age_cases: Vec<BandCounters>,
    pub age_deaths: Vec<BandCounters>,
}

impl MainTable {
    pub fn axis(&self) -> DateAxis {
        DateAxis::new(self.start, self.new_cases.len())
    }
}

/// All-cause mortality, one entry per day (the published file starts 2009-01-01).
#[derive(Debug, Clone)]
pub struct MortalityTable {
    pub total: DailySeries,
    /// Age-band columns in file order, labelled by their header.
    pub bands: Vec<(String, DailySeries)>,
}

/// Vaccination coverage counters, starting later than the epidemic series.
#[derive(Debug, Clone)]
pub struct VaccinationTable {
    pub partial: DailySeries,
    pub full: DailySeries,
    pub booster: DailySeries,
}

/// A monthly risk table (CFR or CHR by vaccination status), passed through as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<RiskRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRow {
    pub label: String,
    pub values: Vec<Value>,
}

/// Everything loaded for one build.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub main: MainTable,
    pub tests: DailySeries,
    pub mortality: MortalityTable,
    pub vaccination: VaccinationTable,
    pub risk_tables: Vec<RiskTable>,
}

/// Reference thresholds ("red lines") used by epidemic management.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedLines {
    /// 14-day incidence per 100k.
    pub incidence: f64,
    /// Test positivity, percent.
    pub positivity: f64,
    pub rt: f64,
    /// ICU occupancy.
    pub icu: f64,
}

impl Default for RedLines {
    fn default() -> Self {
        Self {
            incidence: 120.0,
            positivity: 4.0,
            rt: 1.0,
            icu: 245.0,
        }
    }
}

/// Full pipeline configuration.
///
/// Built from CLI flags and `COVIZ_*` environment variables (see `cli`).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub population: f64,
    pub incidence: IncidenceParams,
    pub positivity: PositivityParams,
    pub cfr: CfrParams,
    pub rt: RtParams,
    pub prevalence: PrevalenceParams,
    /// Trailing days of the tests table treated as not yet reported.
    pub tests_lag: usize,
    /// Smoothing applied to the per-band new-case and death series.
    pub age_smoothing: usize,
    /// Reporting lag (days) of partial/full/booster vaccination counts.
    pub vaccination_lag: usize,
    pub baseline: BaselineParams,
    pub red_lines: RedLines,
}

impl PipelineConfig {
    /// Defaults for a given population.
    pub fn for_population(population: f64) -> Self {
        Self {
            population,
            incidence: IncidenceParams::for_population(population),
            positivity: PositivityParams::default(),
            cfr: CfrParams::default(),
            rt: RtParams::default(),
            prevalence: PrevalenceParams::for_population(population),
            tests_lag: 2,
            age_smoothing: 7,
            vaccination_lag: 14,
            baseline: BaselineParams::default(),
            red_lines: RedLines::default(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::for_population(10_280_000.0)
    }
}

/// Day-of-year index (0-based, non-leap calendar) of a month/day.
///
/// 29 February maps onto 28 February.
pub fn day_of_year(date: NaiveDate) -> usize {
    let day = if date.month() == 2 && date.day() == 29 {
        28
    } else {
        date.day()
    };
    NaiveDate::from_ymd_opt(2015, date.month(), day)
        .map(|d| d.ordinal0() as usize)
        .unwrap_or(0)
}
