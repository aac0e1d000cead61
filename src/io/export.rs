//! Export the indicator bundle to CSV.
//!
//! One row per day: `date` followed by every series of the bundle, in bundle
//! order. Missing days are empty cells, so spreadsheets read them as blanks
//! rather than zeros.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::app::pipeline::PipelineResult;
use crate::error::AppError;

/// Write the bundle to a CSV file.
pub fn write_series_csv(path: &Path, result: &PipelineResult) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    write_series(&mut out, result)?;
    out.flush()
        .map_err(|e| AppError::input(format!("Failed to write export CSV: {e}")))
}

/// Write the bundle as CSV to any writer.
pub fn write_series<W: Write>(out: &mut W, result: &PipelineResult) -> Result<(), AppError> {
    let series = result.series();

    let mut header = String::from("date");
    for s in &series {
        header.push(',');
        header.push_str(&csv_field(s.name));
    }
    writeln!(out, "{header}")
        .map_err(|e| AppError::input(format!("Failed to write export CSV header: {e}")))?;

    for (i, date) in result.axis.dates().enumerate() {
        let mut row = date.format("%d-%m-%Y").to_string();
        for s in &series {
            row.push(',');
            if let Some(v) = s.values.get(i).copied().flatten() {
                row.push_str(&v.to_string());
            }
        }
        writeln!(out, "{row}")
            .map_err(|e| AppError::input(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Quote a header that contains a separator or a quote.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
