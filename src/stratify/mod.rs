//! Age-stratified daily series.
//!
//! The daily report carries one cumulative column per age band and sex. Each band
//! becomes a single daily-increment series: the two sex columns are summed,
//! isolated holes are patched, and the result is differenced.

use tracing::{debug, warn};

use crate::domain::{AgeBand, BandCounters};
use crate::error::AppError;
use crate::indicators::{CfrParams, case_fatality_rate};
use crate::series::{Value, combine, difference, ensure_aligned, last_defined, patch_gaps, rolling_mean, zip_with};

/// One series per age band, in [`AgeBand::ALL`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeTable {
    pub bands: Vec<AgeBand>,
    pub series: Vec<Vec<Value>>,
}

impl AgeTable {
    pub fn get(&self, band: AgeBand) -> Option<&[Value]> {
        self.bands
            .iter()
            .position(|b| *b == band)
            .map(|i| self.series[i].as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgeBand, &[Value])> + '_ {
        self.bands.iter().copied().zip(self.series.iter().map(Vec::as_slice))
    }

    /// The same table with a trailing mean of `window` days applied to every band.
    pub fn smoothed(&self, window: usize) -> AgeTable {
        AgeTable {
            bands: self.bands.clone(),
            series: self.series.iter().map(|s| rolling_mean(s, window)).collect(),
        }
    }

    /// Day-by-day sum across bands; missing if any band is missing that day.
    pub fn total(&self, days: usize) -> Vec<Value> {
        (0..days)
            .map(|i| {
                self.series
                    .iter()
                    .try_fold(0.0, |acc, s| combine(Some(acc), s.get(i).copied().flatten(), |a, b| a + b))
            })
            .collect()
    }
}

/// Per-band daily increments from cumulative (female, male) counters.
///
/// Bands absent from `counters` come out all missing. See [`AgeTable::smoothed`]
/// for the display series.
pub fn stratify(what: &str, counters: &[BandCounters], days: usize) -> Result<AgeTable, AppError> {
    let mut series = Vec::with_capacity(AgeBand::ALL.len());
    for band in AgeBand::ALL {
        let Some(c) = counters.iter().find(|c| c.band == band) else {
            warn!(what, band = band.label(), "age band absent; series left missing");
            series.push(vec![None; days]);
            continue;
        };
        ensure_aligned(what, days, &[c.female.as_slice(), c.male.as_slice()])?;

        let cumulative = zip_with(what, &c.female, &c.male, |f, m| f + m)?;
        let daily = difference(&patch_gaps(&cumulative, 1, true));
        debug!(what, band = band.label(), defined = daily.iter().flatten().count(), "age band derived");
        series.push(daily);
    }

    Ok(AgeTable {
        bands: AgeBand::ALL.to_vec(),
        series,
    })
}

/// CFR per age band.
///
/// `new_cases` and `deaths` are the unsmoothed band increments; `smoothed_new`
/// marks where reporting stopped. From the last defined day of a band's smoothed
/// new-case series onward the CFR is forced to missing, and a band with no
/// defined day at all is missing throughout.
pub fn cfr_by_age(
    new_cases: &AgeTable,
    deaths: &AgeTable,
    smoothed_new: &AgeTable,
    params: &CfrParams,
) -> Result<AgeTable, AppError> {
    let mut series = Vec::with_capacity(new_cases.bands.len());
    for (band, new) in new_cases.iter() {
        let died = deaths
            .get(band)
            .ok_or_else(|| AppError::data(format!("No death series for age band {}.", band.label())))?;
        let mut cfr = case_fatality_rate(died, new, params)?;

        let cut = smoothed_new.get(band).and_then(last_defined);
        let keep = cut.unwrap_or(0);
        if keep < cfr.len() {
            warn!(
                band = band.label(),
                blanked = cfr.len() - keep,
                "age-band reporting discontinued; trailing CFR dropped"
            );
            cfr[keep..].fill(None);
        }
        series.push(cfr);
    }

    Ok(AgeTable {
        bands: new_cases.bands.clone(),
        series,
    })
}
