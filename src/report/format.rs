//! Formatted terminal output.
//!
//! All report text is built here so the numeric modules never format numbers.

use crate::app::pipeline::PipelineResult;
use crate::domain::PipelineConfig;
use crate::math::LinearFit;
use crate::mortality::excess::{MortalityRow, RangeSummary};
use crate::series::{Value, last_defined};

use super::{RedLineCheck, red_line_checks};

const DATE_FMT: &str = "%d-%m-%Y";

/// Dataset span, latest headline values and red-line status.
pub fn format_build_summary(result: &PipelineResult, config: &PipelineConfig) -> String {
    let mut out = String::new();

    out.push_str("=== coviz - epidemic indicators ===\n");
    out.push_str(&format!(
        "Span: {} .. {} ({} days)\n",
        result.axis.start.format(DATE_FMT),
        result.axis.end().map(|d| d.format(DATE_FMT).to_string()).unwrap_or_default(),
        result.days(),
    ));
    out.push_str(&format!("Population: {:.0}\n", config.population));

    out.push_str("\nLatest values:\n");
    let headline: [(&str, &[Value], usize); 9] = [
        ("new cases", result.new_cases.as_slice(), 0),
        ("covid deaths", result.covid_deaths.as_slice(), 0),
        ("hospitalized", result.hospitalized.as_slice(), 0),
        ("incidence (14d/100k)", result.incidence.as_slice(), 1),
        ("positivity (%)", result.positivity.as_slice(), 2),
        ("CFR (%)", result.cfr.as_slice(), 2),
        ("Rt", result.rt.as_slice(), 3),
        ("prevalence min (%)", result.prevalence.min.as_slice(), 3),
        ("prevalence max (%)", result.prevalence.max.as_slice(), 3),
    ];
    for (label, series, precision) in headline {
        out.push_str(&format!("  {label:<22} {}\n", fmt_latest(result, series, precision)));
    }

    out.push_str("\nRed lines:\n");
    for check in red_line_checks(result, &config.red_lines) {
        out.push_str(&format_check(&check));
        out.push('\n');
    }

    out
}

fn format_check(check: &RedLineCheck) -> String {
    let status = match check.exceeded() {
        Some(true) => "ABOVE",
        Some(false) => "below",
        None => "n/a",
    };
    let latest = check
        .latest
        .map(|(_, v)| format!("{v:.2}"))
        .unwrap_or_else(|| "-".to_string());
    format!("  {:<12} {:>10} / {:<8} {status}", check.indicator, latest, check.limit)
}

fn fmt_latest(result: &PipelineResult, series: &[Value], precision: usize) -> String {
    match last_defined(series) {
        Some(i) => {
            let date = result
                .axis
                .date_at(i)
                .map(|d| d.format(DATE_FMT).to_string())
                .unwrap_or_default();
            let v = series[i].unwrap_or_default();
            format!("{v:>12.precision$}  ({date})")
        }
        None => format!("{:>12}", "-"),
    }
}

/// Range totals, the per-band mortality table and the correlation fit.
pub fn format_range_summary(summary: &RangeSummary, fit: Option<&LinearFit>) -> String {
    let mut out = String::new();
    let t = &summary.totals;

    out.push_str(&format!(
        "=== {} .. {} ({} days) ===\n",
        summary.from.format(DATE_FMT),
        summary.to.format(DATE_FMT),
        summary.days
    ));
    out.push_str(&format!("New cases:        {:>12.0}\n", t.new_cases));
    out.push_str(&format!("Covid deaths:     {:>12.0}\n", t.covid_deaths));
    out.push_str(&format!("All-cause deaths: {:>12.0}\n", t.total_deaths));
    out.push_str(&format!("Baseline:         {:>12.0}\n", t.baseline));
    out.push_str(&format!("Excess deaths:    {:>12.0} ({})\n", t.excess, fmt_pct(t.excess_pct)));

    out.push_str("\nMortality by age:\n");
    out.push_str(&format_mortality_table(&summary.bands));

    out.push_str("\nCovid deaths vs excess deaths:\n");
    match fit {
        Some(f) => {
            out.push_str(&format!(
                "  excess = {:.3} + {:.3} * covid  (n={})\n",
                f.intercept, f.slope, f.n
            ));
            match f.r {
                Some(r) => out.push_str(&format!("  r = {r:.3}\n")),
                None => out.push_str("  r = n/a (constant excess)\n"),
            }
        }
        None => out.push_str("  not enough varying data for a fit\n"),
    }

    out
}

fn format_mortality_table(rows: &[MortalityRow]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<12} {:>10} {:>10} {:>10} {:>9}\n",
            "age", "deaths", "baseline", "excess", "excess%"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<12} {:-<10} {:-<10} {:-<10} {:-<9}\n", "", "", "", "", "").trim_end());
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:<12} {:>10.0} {:>10.0} {:>10.0} {:>9}\n",
                truncate(&r.label, 12),
                r.deaths,
                r.baseline,
                r.excess,
                fmt_pct(r.excess_pct)
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn fmt_pct(v: Option<f64>) -> String {
    v.map(|p| format!("{p:+.1}%")).unwrap_or_else(|| "n/a".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::build;
    use crate::data::synthetic::{SyntheticParams, generate_snapshot};
    use crate::mortality::excess::{ALL_AGES_LABEL, summarize_range};

    fn result() -> PipelineResult {
        let snapshot = generate_snapshot(&SyntheticParams::default()).unwrap();
        build(&snapshot, &PipelineConfig::default()).unwrap()
    }

    #[test]
    fn build_summary_lists_red_lines() {
        let result = result();
        let text = format_build_summary(&result, &PipelineConfig::default());
        assert!(text.contains("26-02-2020"));
        assert!(text.contains("Red lines:"));
        for name in ["incidence", "positivity", "rt", "icu"] {
            assert!(text.lines().any(|l| l.trim_start().starts_with(name)), "{name}");
        }
    }

    #[test]
    fn range_summary_includes_all_ages_row() {
        let result = result();
        let summary = summarize_range(&result, result.axis.start, result.axis.start + chrono::Duration::days(200))
            .unwrap();
        let text = format_range_summary(&summary, None);
        assert!(text.contains(ALL_AGES_LABEL));
        assert!(text.contains("85+"));
        assert!(text.contains("not enough varying data"));
    }

    #[test]
    fn percentages_are_signed() {
        assert_eq!(fmt_pct(Some(12.345)), "+12.3%");
        assert_eq!(fmt_pct(Some(-3.0)), "-3.0%");
        assert_eq!(fmt_pct(None), "n/a");
    }

    #[test]
    fn long_labels_are_truncated() {
        assert_eq!(truncate("all ages*", 12), "all ages*");
        assert_eq!(truncate("abcdefghijklmnop", 5), "abcd.");
    }
}
