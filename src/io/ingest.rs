//! CSV ingest for the snapshot tables.
//!
//! Every table is keyed by a date column. Rows are placed on a contiguous daily
//! axis from the first to the last date found:
//!
//! - dates absent from the file become missing days
//! - duplicate dates keep the last row
//! - rows with an unreadable date are skipped and reported at `warn`
//!
//! Required columns fail the load (exit code 3). Optional columns that are
//! absent come back as all-missing series, with a warning.

use std::collections::HashMap;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::{
    AgeBand, BandCounters, DailySeries, MainTable, MortalityTable, RiskRow, RiskTable, Snapshot,
    VaccinationTable,
};
use crate::error::AppError;
use crate::io::source::{SourceReader, Sources, table_name};
use crate::series::Value;

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Parsed CSV text: normalized header lookup plus raw records.
struct Table {
    what: String,
    headers: Vec<String>,
    header_map: HashMap<String, usize>,
    records: Vec<(usize, StringRecord)>,
    row_errors: Vec<RowError>,
}

impl Table {
    fn parse(what: &str, text: &str) -> Result<Self, AppError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let header_record = reader
            .headers()
            .map_err(|e| AppError::input(format!("Failed to read {what} headers: {e}")))?
            .clone();
        let headers: Vec<String> = header_record
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut records = Vec::new();
        let mut row_errors = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            // records() starts after the header; CSV lines are 1-based.
            let line = idx + 2;
            match result {
                Ok(r) => records.push((line, r)),
                Err(e) => row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                }),
            }
        }

        Ok(Self {
            what: what.to_string(),
            header_map: build_header_map(&header_record),
            headers,
            records,
            row_errors,
        })
    }

    /// First header among `names` present in the table.
    fn find<'n>(&self, names: &[&'n str]) -> Option<&'n str> {
        names.iter().copied().find(|n| self.header_map.contains_key(*n))
    }

    fn require(&self, names: &[&str]) -> Result<String, AppError> {
        self.find(names).map(str::to_string).ok_or_else(|| {
            AppError::data(format!(
                "Missing required column in {}: `{}`",
                self.what,
                names.join("` or `")
            ))
        })
    }

    /// Lay the table out on a daily axis keyed by `date_column`.
    fn dated(mut self, date_column: &str) -> Result<DatedTable, AppError> {
        let date_idx = self.header_map[date_column];
        let mut rows: Vec<(NaiveDate, StringRecord)> = Vec::with_capacity(self.records.len());
        for (line, record) in std::mem::take(&mut self.records) {
            match record.get(date_idx).map(str::trim).filter(|s| !s.is_empty()) {
                Some(raw) => match parse_date(raw) {
                    Ok(date) => rows.push((date, record)),
                    Err(message) => self.row_errors.push(RowError { line, message }),
                },
                None => self.row_errors.push(RowError {
                    line,
                    message: format!("Missing required value: `{date_column}`"),
                }),
            }
        }

        if !self.row_errors.is_empty() {
            let first = &self.row_errors[0];
            warn!(
                table = %self.what,
                skipped = self.row_errors.len(),
                first_line = first.line,
                first_error = %first.message,
                "rows skipped"
            );
        }

        let (Some(start), Some(end)) = (
            rows.iter().map(|(d, _)| *d).min(),
            rows.iter().map(|(d, _)| *d).max(),
        ) else {
            return Err(AppError::data(format!("{} has no dated rows.", self.what)));
        };

        let len = (end - start).num_days() as usize + 1;
        let mut slots: Vec<Option<StringRecord>> = vec![None; len];
        for (date, record) in rows {
            slots[(date - start).num_days() as usize] = Some(record);
        }
        let gaps = slots.iter().filter(|s| s.is_none()).count();
        info!(table = %self.what, start = %start, days = len, gaps, "table loaded");

        Ok(DatedTable {
            table: self,
            start,
            slots,
        })
    }
}

/// Records placed on a contiguous daily axis.
struct DatedTable {
    table: Table,
    start: NaiveDate,
    slots: Vec<Option<StringRecord>>,
}

impl DatedTable {
    fn column(&self, name: &str) -> Option<Vec<Value>> {
        let idx = *self.table.header_map.get(name)?;
        Some(
            self.slots
                .iter()
                .map(|slot| parse_opt_f64(slot.as_ref().and_then(|r| r.get(idx))))
                .collect(),
        )
    }

    fn required(&self, names: &[&str]) -> Result<Vec<Value>, AppError> {
        let name = self.table.require(names)?;
        self.column(&name)
            .ok_or_else(|| AppError::data(format!("Missing required column: `{name}`")))
    }

    fn optional(&self, names: &[&str]) -> Vec<Value> {
        match self.table.find(names).and_then(|n| self.column(n)) {
            Some(values) => values,
            None => {
                warn!(table = %self.table.what, column = names[0], "optional column absent");
                vec![None; self.slots.len()]
            }
        }
    }

    fn series(&self, values: Vec<Value>) -> DailySeries {
        DailySeries::new(self.start, values)
    }
}

/// Main daily report.
pub fn parse_main(text: &str) -> Result<MainTable, AppError> {
    let table = Table::parse("main report", text)?;
    let date = table.require(&["data", "date"])?;
    let dated = table.dated(&date)?;

    let new_cases = dated.required(&["confirmados_novos"])?;
    let deaths_cumulative = dated.required(&["obitos"])?;
    let hospitalized = dated.optional(&["internados"]);
    let icu = dated.optional(&["internados_uci"]);

    let counters = |columns: fn(AgeBand) -> (String, String)| -> Vec<BandCounters> {
        AgeBand::ALL
            .iter()
            .map(|band| {
                let (f, m) = columns(*band);
                BandCounters {
                    band: *band,
                    female: dated.optional(&[f.as_str()]),
                    male: dated.optional(&[m.as_str()]),
                }
            })
            .collect()
    };
    let age_cases = counters(AgeBand::case_columns);
    let age_deaths = counters(AgeBand::death_columns);

    Ok(MainTable {
        start: dated.start,
        new_cases,
        deaths_cumulative,
        hospitalized,
        icu,
        age_cases,
        age_deaths,
    })
}

/// Daily new tests.
pub fn parse_tests(text: &str) -> Result<DailySeries, AppError> {
    let table = Table::parse("tests", text)?;
    let date = table.require(&["data", "date"])?;
    let dated = table.dated(&date)?;
    let values = dated.required(&["amostras_novas", "tests"])?;
    Ok(dated.series(values))
}

/// Long all-cause mortality table: an all-ages column plus one column per band.
pub fn parse_mortality(text: &str) -> Result<MortalityTable, AppError> {
    let table = Table::parse("mortality", text)?;
    let date = table.require(&["data", "date"])?;
    let total_name = table.require(&["total", "all"])?;
    let band_columns: Vec<(String, String)> = table
        .headers
        .iter()
        .filter_map(|h| {
            let key = normalize_header_name(h);
            (key != date && key != total_name && !key.is_empty()).then(|| (h.clone(), key))
        })
        .collect();

    let dated = table.dated(&date)?;
    let total = dated.series(dated.required(&[total_name.as_str()])?);
    let bands = band_columns
        .into_iter()
        .filter_map(|(label, key)| {
            let values = dated.column(&key)?;
            if values.iter().all(Option::is_none) {
                warn!(column = %label, "non-numeric mortality column ignored");
                return None;
            }
            Some((label, dated.series(values)))
        })
        .collect();

    Ok(MortalityTable { total, bands })
}

/// Vaccination coverage counters.
pub fn parse_vaccination(text: &str) -> Result<VaccinationTable, AppError> {
    let table = Table::parse("vaccination", text)?;
    let date = table.require(&["data", "date"])?;
    let dated = table.dated(&date)?;
    Ok(VaccinationTable {
        partial: dated.series(dated.optional(&["doses1", "partial"])),
        full: dated.series(dated.optional(&["doses2", "full"])),
        booster: dated.series(dated.optional(&["doses3", "booster"])),
    })
}

/// A monthly risk table: first column a label, the rest numeric.
pub fn parse_risk_table(name: &str, text: &str) -> Result<RiskTable, AppError> {
    let table = Table::parse(name, text)?;
    let Some((_, columns)) = table.headers.split_first() else {
        return Err(AppError::data(format!("{name} has no columns.")));
    };
    let rows = table
        .records
        .iter()
        .map(|(_, r)| RiskRow {
            label: r.get(0).unwrap_or_default().to_string(),
            values: (1..=columns.len()).map(|i| parse_opt_f64(r.get(i))).collect(),
        })
        .collect();

    Ok(RiskTable {
        name: name.to_string(),
        columns: columns.to_vec(),
        rows,
    })
}

/// Read and parse every table of a snapshot.
pub fn load_snapshot(sources: &Sources) -> Result<Snapshot, AppError> {
    let mut reader = SourceReader::new();

    let main = parse_main(&reader.read_text(&sources.main)?)?;
    let tests = parse_tests(&reader.read_text(&sources.tests)?)?;
    let mortality = parse_mortality(&reader.read_text(&sources.mortality)?)?;
    let vaccination = match &sources.vaccination {
        Some(location) => parse_vaccination(&reader.read_text(location)?)?,
        None => {
            warn!("no vaccination source configured");
            VaccinationTable {
                partial: DailySeries::new(main.start, Vec::new()),
                full: DailySeries::new(main.start, Vec::new()),
                booster: DailySeries::new(main.start, Vec::new()),
            }
        }
    };
    let mut risk_tables = Vec::with_capacity(sources.risk_tables.len());
    for location in &sources.risk_tables {
        risk_tables.push(parse_risk_table(&table_name(location), &reader.read_text(location)?)?);
    }

    Ok(Snapshot {
        main,
        tests,
        mortality,
        vaccination,
        risk_tables,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

/// Parse a report date. `DD-MM-YYYY` is canonical; ISO and slash forms are
/// accepted too.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const FMTS: [&str; 4] = ["%d-%m-%Y", "%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];
    // Some exports carry a time part ("2020-02-26T00:00:00").
    let day = s.split(['T', ' ']).next().unwrap_or(s);
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(day, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: DD-MM-YYYY, YYYY-MM-DD, DD/MM/YYYY, YYYY/MM/DD."
    ))
}

fn parse_opt_f64(s: Option<&str>) -> Value {
    let s = s?.trim();
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn dates_accept_canonical_and_common_forms() {
        assert_eq!(parse_date("26-02-2020").unwrap(), d(2020, 2, 26));
        assert_eq!(parse_date("2020-02-26").unwrap(), d(2020, 2, 26));
        assert_eq!(parse_date("26/02/2020").unwrap(), d(2020, 2, 26));
        assert_eq!(parse_date("2020-02-26T00:00:00").unwrap(), d(2020, 2, 26));
        assert!(parse_date("Feb 26").is_err());
    }

    #[test]
    fn main_report_fills_missing_days_and_optional_columns() {
        let text = "\u{feff}Data,confirmados_novos,obitos,internados,confirmados_40_49_f,confirmados_40_49_m\n\
                    26-02-2020,0,0,,0,0\n\
                    27-02-2020,1,0,2,1,0\n\
                    29-02-2020,3,1,4,2,1\n";
        let main = parse_main(text).unwrap();

        assert_eq!(main.start, d(2020, 2, 26));
        assert_eq!(main.new_cases, vec![Some(0.0), Some(1.0), None, Some(3.0)]);
        assert_eq!(main.hospitalized, vec![None, Some(2.0), None, Some(4.0)]);
        assert!(main.icu.iter().all(Option::is_none));
        assert_eq!(main.icu.len(), 4);

        let band = &main.age_cases[AgeBand::Age40To49.index()];
        assert_eq!(band.band, AgeBand::Age40To49);
        assert_eq!(band.female, vec![Some(0.0), Some(1.0), None, Some(2.0)]);
        assert!(main.age_deaths[0].male.iter().all(Option::is_none));
    }

    #[test]
    fn duplicate_dates_keep_last_row_and_bad_dates_are_skipped() {
        let text = "data,amostras_novas\n01-03-2020,5\nnot-a-date,9\n01-03-2020,7\n02-03-2020,8\n";
        let tests = parse_tests(text).unwrap();
        assert_eq!(tests.start, d(2020, 3, 1));
        assert_eq!(tests.values, vec![Some(7.0), Some(8.0)]);
    }

    #[test]
    fn missing_required_column_is_a_data_error() {
        let err = parse_main("data,obitos\n01-03-2020,1\n").unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.message().contains("confirmados_novos"));
    }

    #[test]
    fn table_without_rows_is_a_data_error() {
        assert_eq!(parse_tests("data,tests\n").unwrap_err().exit_code(), 3);
    }

    #[test]
    fn mortality_keeps_numeric_band_columns() {
        let text = "Date,Total,0-64,65+,source\n\
                    01-01-2009,300,50,250,x\n\
                    02-01-2009,310,55,255,x\n";
        let mortality = parse_mortality(text).unwrap();
        assert_eq!(mortality.total.values, vec![Some(300.0), Some(310.0)]);
        let labels: Vec<&str> = mortality.bands.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["0-64", "65+"]);
        assert_eq!(mortality.bands[1].1.values, vec![Some(250.0), Some(255.0)]);
    }

    #[test]
    fn vaccination_columns_accept_aliases() {
        let text = "date,partial,doses2\n2021-01-01,10,\n2021-01-02,20,5\n";
        let vax = parse_vaccination(text).unwrap();
        assert_eq!(vax.partial.values, vec![Some(10.0), Some(20.0)]);
        assert_eq!(vax.full.values, vec![None, Some(5.0)]);
        assert!(vax.booster.values.iter().all(Option::is_none));
    }

    #[test]
    fn risk_tables_pass_through() {
        let text = "month,unvaccinated,vaccinated\nJan 2022,1.5,0.2\nFeb 2022,,0.1\n";
        let table = parse_risk_table("cfr_vacc", text).unwrap();
        assert_eq!(table.columns, vec!["unvaccinated", "vaccinated"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].label, "Feb 2022");
        assert_eq!(table.rows[1].values, vec![None, Some(0.1)]);
    }
}
