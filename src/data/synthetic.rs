//! Seeded synthetic snapshot for demos and end-to-end tests.
//!
//! The generated tables follow the same conventions as the published reports:
//! cumulative age/sex counters, a test series that stops two days early, a
//! mortality file starting on 01-01-2009 and weekly vaccination counts starting
//! late. Counts are internally consistent: band increments add up to the daily
//! new cases and band deaths add up to the cumulative death counter.

use chrono::{Datelike, Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{
    AgeBand, BandCounters, DailySeries, MainTable, MortalityTable, RiskRow, RiskTable, Snapshot,
    VaccinationTable,
};
use crate::error::AppError;
use crate::series::Value;

/// Share of cases per age band, in [`AgeBand::ALL`] order.
const CASE_SHARES: [f64; 9] = [0.06, 0.09, 0.15, 0.16, 0.16, 0.14, 0.10, 0.07, 0.07];

/// Deaths per case per age band.
const FATALITY: [f64; 9] = [0.0, 0.0, 0.0002, 0.0005, 0.001, 0.004, 0.015, 0.05, 0.16];

/// Mortality file bands and their share of all-cause deaths.
const MORTALITY_BANDS: [(&str, f64); 4] = [("0-64", 0.15), ("65-74", 0.15), ("75-84", 0.30), ("85+", 0.40)];

const MORTALITY_START: (i32, u32, u32) = (2009, 1, 1);
const TEST_LAG: usize = 2;
const DEATH_DELAY: usize = 14;
const VACCINATION_LAG: usize = 14;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticParams {
    pub start: NaiveDate,
    pub days: usize,
    pub seed: u64,
    pub population: f64,
}

impl Default for SyntheticParams {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2020, 2, 26).unwrap_or_default(),
            days: 600,
            seed: 7,
            population: 10_280_000.0,
        }
    }
}

/// One Gaussian-shaped epidemic wave.
struct Wave {
    peak_day: f64,
    width: f64,
    height: f64,
}

const WAVES: [Wave; 4] = [
    Wave { peak_day: 40.0, width: 12.0, height: 900.0 },
    Wave { peak_day: 250.0, width: 25.0, height: 5000.0 },
    Wave { peak_day: 335.0, width: 14.0, height: 11000.0 },
    Wave { peak_day: 520.0, width: 30.0, height: 3000.0 },
];

fn expected_cases(day: usize) -> f64 {
    let t = day as f64;
    20.0 + WAVES
        .iter()
        .map(|w| w.height * (-0.5 * ((t - w.peak_day) / w.width).powi(2)).exp())
        .sum::<f64>()
}

/// Generate a full snapshot.
pub fn generate_snapshot(params: &SyntheticParams) -> Result<Snapshot, AppError> {
    if params.days == 0 {
        return Err(AppError::input("Synthetic snapshot needs at least one day."));
    }
    if !(params.population.is_finite() && params.population > 0.0) {
        return Err(AppError::input("Population must be positive."));
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let noise = Normal::new(0.0, 1.0).map_err(|e| AppError::input(format!("Noise distribution error: {e}")))?;
    let days = params.days;

    // Daily cases per band (integers), then cumulative per band and sex.
    let mut band_cases = vec![vec![0.0; days]; AgeBand::ALL.len()];
    let mut new_cases = Vec::with_capacity(days);
    for day in 0..days {
        let mean = expected_cases(day);
        let total = (mean + mean.sqrt() * noise.sample(&mut rng)).round().max(0.0);
        let mut left = total;
        for (b, share) in CASE_SHARES.iter().enumerate() {
            let n = if b + 1 == CASE_SHARES.len() { left } else { (total * share).round().min(left) };
            band_cases[b][day] = n;
            left -= n;
        }
        new_cases.push(Some(total));
    }

    let mut band_deaths = vec![vec![0.0; days]; AgeBand::ALL.len()];
    for (b, fatality) in FATALITY.iter().enumerate() {
        for day in DEATH_DELAY..days {
            let mean = band_cases[b][day - DEATH_DELAY] * fatality;
            let n = (mean + mean.sqrt() * noise.sample(&mut rng)).round().max(0.0);
            band_deaths[b][day] = n;
        }
    }
    let daily_deaths: Vec<f64> = (0..days).map(|d| band_deaths.iter().map(|b| b[d]).sum()).collect();

    let age_cases = split_by_sex(&band_cases);
    let age_deaths = split_by_sex(&band_deaths);

    let mut hospitalized = Vec::with_capacity(days);
    let mut icu = Vec::with_capacity(days);
    for day in 0..days {
        let recent: f64 = band_cases
            .iter()
            .enumerate()
            .map(|(b, cases)| {
                let weight = 0.01 + 0.02 * b as f64;
                cases[day.saturating_sub(9)..=day].iter().sum::<f64>() * weight
            })
            .sum();
        let hosp = recent.round();
        // Isolated reporting holes.
        if day > 0 && day % 97 == 0 {
            hospitalized.push(None);
            icu.push(None);
        } else {
            hospitalized.push(Some(hosp));
            icu.push(Some((hosp * 0.16).round()));
        }
    }

    let main = MainTable {
        start: params.start,
        new_cases: new_cases.clone(),
        deaths_cumulative: cumulative(&daily_deaths),
        hospitalized,
        icu,
        age_cases,
        age_deaths,
    };

    // Tests: positivity drifts between 3% and 12%, last days not yet published.
    let tests_len = days.saturating_sub(TEST_LAG);
    let tests_values: Vec<Value> = (0..tests_len)
        .map(|day| {
            let positivity = 0.075 + 0.045 * (day as f64 / 60.0).sin();
            let cases = expected_cases(day + TEST_LAG);
            Some((cases / positivity).round())
        })
        .collect();
    let tests = DailySeries::new(params.start, tests_values);

    let mortality = mortality_table(params, &daily_deaths, &mut rng, &noise)?;
    let vaccination = vaccination_table(params);
    let risk_tables = vec![risk_table()];

    Ok(Snapshot {
        main,
        tests,
        mortality,
        vaccination,
        risk_tables,
    })
}

fn split_by_sex(bands: &[Vec<f64>]) -> Vec<BandCounters> {
    AgeBand::ALL
        .iter()
        .zip(bands)
        .map(|(band, daily)| {
            let female: Vec<f64> = daily.iter().map(|n| (n * 0.52).round()).collect();
            let male: Vec<f64> = daily.iter().zip(&female).map(|(n, f)| n - f).collect();
            BandCounters {
                band: *band,
                female: cumulative(&female),
                male: cumulative(&male),
            }
        })
        .collect()
}

fn cumulative(daily: &[f64]) -> Vec<Value> {
    daily
        .iter()
        .scan(0.0, |acc, n| {
            *acc += n;
            Some(Some(*acc))
        })
        .collect()
}

/// Seasonal all-cause deaths from 2009 with an aging trend; Covid deaths are
/// added on top from the main axis start.
fn mortality_table(
    params: &SyntheticParams,
    covid_deaths: &[f64],
    rng: &mut StdRng,
    noise: &Normal<f64>,
) -> Result<MortalityTable, AppError> {
    let (y, m, d) = MORTALITY_START;
    let start = NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| AppError::input("Invalid mortality start date."))?;
    let end = params.start + Duration::days(params.days as i64 - 1);
    if end < start {
        return Err(AppError::input("Synthetic axis ends before the mortality file starts."));
    }

    let per_day_growth = crate::mortality::baseline::AGING_DEATHS_PER_YEAR / 365.0;
    let mut bands: Vec<Vec<Value>> = vec![Vec::new(); MORTALITY_BANDS.len()];
    let mut total = Vec::new();
    for day in start.iter_days().take_while(|day| *day <= end) {
        let doy = f64::from(day.ordinal0());
        let years = f64::from(day.year() - y);
        let seasonal = 280.0 + 60.0 * (2.0 * std::f64::consts::PI * (doy - 15.0) / 365.0).cos();
        let covid = (day - params.start)
            .num_days()
            .try_into()
            .ok()
            .and_then(|i: usize| covid_deaths.get(i))
            .copied()
            .unwrap_or(0.0);
        let mean = seasonal + per_day_growth * years;
        let deaths = (mean + 10.0 * noise.sample(rng)).round().max(0.0) + covid;

        let mut left = deaths;
        for (b, (_, share)) in MORTALITY_BANDS.iter().enumerate() {
            let n = if b + 1 == MORTALITY_BANDS.len() { left } else { (deaths * share).round().min(left) };
            bands[b].push(Some(n));
            left -= n;
        }
        total.push(Some(deaths));
    }

    Ok(MortalityTable {
        total: DailySeries::new(start, total),
        bands: MORTALITY_BANDS
            .iter()
            .zip(bands)
            .map(|((label, _), values)| (label.to_string(), DailySeries::new(start, values)))
            .collect(),
    })
}

/// Logistic coverage curves from 27-12-2020, published weekly.
fn vaccination_table(params: &SyntheticParams) -> VaccinationTable {
    let vstart = NaiveDate::from_ymd_opt(2020, 12, 27).unwrap_or(params.start);
    let offset = (vstart - params.start).num_days().max(0) as usize;
    let len = params.days.saturating_sub(offset + VACCINATION_LAG);

    let curve = |midpoint: f64, ceiling: f64| -> Vec<Value> {
        (0..len)
            .map(|i| {
                if i % 7 != 0 && i + 1 != len {
                    return None;
                }
                let t = i as f64;
                Some((params.population * ceiling / (1.0 + (-(t - midpoint) / 30.0).exp())).round())
            })
            .collect()
    };

    VaccinationTable {
        partial: DailySeries::new(vstart, curve(150.0, 0.88)),
        full: DailySeries::new(vstart, curve(190.0, 0.85)),
        booster: DailySeries::new(vstart, curve(340.0, 0.55)),
    }
}

fn risk_table() -> RiskTable {
    let months = ["2021-07", "2021-08", "2021-09", "2021-10"];
    RiskTable {
        name: "cfr_by_vaccination".to_string(),
        columns: vec!["unvaccinated".to_string(), "vaccinated".to_string()],
        rows: months
            .iter()
            .enumerate()
            .map(|(i, m)| RiskRow {
                label: m.to_string(),
                values: vec![Some(1.6 - 0.1 * i as f64), Some(0.3 - 0.02 * i as f64)],
            })
            .collect(),
    }
}
