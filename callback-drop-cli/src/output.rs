//! Report rendering (TXT tables and JSON)

use anyhow::Result;
use callback_drop_analyzer::{ColumnStats, DroppedSummary, DurationReport};
use serde::Serialize;
use std::fmt::Write;

/// Widest histogram bar in the text output
const BAR_WIDTH: u64 = 40;

/// Everything produced by one CLI run
#[derive(Debug, Serialize)]
pub struct ReportBundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<DroppedSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub individual: Option<Vec<DurationReport>>,
}

impl ReportBundle {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_txt(&self) -> Result<String> {
        let mut out = String::new();
        if let Some(summary) = &self.summary {
            render_summary(&mut out, summary)?;
        }
        if let Some(reports) = &self.individual {
            for report in reports {
                render_duration_report(&mut out, report)?;
            }
        }
        Ok(out)
    }
}

fn render_summary(out: &mut String, summary: &DroppedSummary) -> Result<()> {
    writeln!(out, "═══════════════════════════════════════════════")?;
    writeln!(out, "  {}", summary.title())?;
    writeln!(out, "═══════════════════════════════════════════════\n")?;

    let width = summary
        .rows
        .iter()
        .map(|row| row.name.len())
        .max()
        .unwrap_or(0)
        .max("Callback".len());

    writeln!(
        out,
        "{:<width$}  {:>10}  {:>10}  {:>10}  {:<7}",
        "Callback", "Count", "Expected", "Dropped", "Color"
    )?;
    for (row, callback) in summary.rows.iter().zip(&summary.callbacks) {
        writeln!(
            out,
            "{:<width$}  {:>10.0}  {:>10.2}  {:>10.2}  {:<7}",
            row.name, row.observed_count, callback.expected_count, row.dropped, row.color
        )?;
    }

    writeln!(out, "\nStatistics")?;
    writeln!(
        out,
        "{:<8}  {:>6}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}",
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    )?;
    render_stats_row(out, "count", summary.count_stats.as_ref())?;
    render_stats_row(out, "dropped", summary.dropped_stats.as_ref())?;

    if !summary.skipped.is_empty() {
        writeln!(out, "\nSkipped callbacks:")?;
        for skipped in &summary.skipped {
            writeln!(out, "  {}: {}", skipped.handle, skipped.reason)?;
        }
    }
    writeln!(out)?;
    Ok(())
}

fn render_stats_row(out: &mut String, column: &str, stats: Option<&ColumnStats>) -> Result<()> {
    let Some(stats) = stats else {
        writeln!(out, "{:<8}  {:>6}", column, 0)?;
        return Ok(());
    };
    let std = stats
        .std
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "NaN".to_string());
    writeln!(
        out,
        "{:<8}  {:>6}  {:>10.2}  {:>10}  {:>10.2}  {:>10.2}  {:>10.2}  {:>10.2}  {:>10.2}",
        column,
        stats.count,
        stats.mean,
        std,
        stats.min,
        stats.p25,
        stats.p50,
        stats.p75,
        stats.max
    )?;
    Ok(())
}

fn render_duration_report(out: &mut String, report: &DurationReport) -> Result<()> {
    writeln!(out, "───────────────────────────────────────────────")?;
    writeln!(out, "{} ({})", report.name, report.color)?;
    if let Some(symbol) = &report.symbol {
        writeln!(out, "  symbol: {}", symbol)?;
    }
    writeln!(
        out,
        "  start ({}), {} invocations",
        report.start_label,
        report.series.len()
    )?;
    if let Some(stats) = &report.stats {
        writeln!(
            out,
            "  duration (ms): mean {:.3}, min {:.3}, p50 {:.3}, max {:.3}",
            stats.mean, stats.min, stats.p50, stats.max
        )?;
    }

    writeln!(out, "  Frequency of Callback Duration (ms)")?;
    let peak = report.histogram.counts.iter().copied().max().unwrap_or(0).max(1);
    let bins = report.histogram.bins();
    let last = bins.len().saturating_sub(1);
    for (i, bin) in bins.iter().enumerate() {
        let bar = "#".repeat((bin.count * BAR_WIDTH / peak) as usize);
        // The last bin also holds the maximum
        let close = if i == last { ']' } else { ')' };
        writeln!(
            out,
            "  [{:>10.3}, {:>10.3}{}  {:>6}  {}",
            bin.left, bin.right, close, bin.count, bar
        )?;
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use callback_drop_analyzer::{Analyzer, InMemoryTrace, Observation};
    use chrono::{Duration, TimeZone, Utc};

    fn bundle() -> ReportBundle {
        let t0 = Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap();
        let ticks = (0..=10)
            .map(|i| Observation::new(t0 + Duration::milliseconds(100 * i), 0.002))
            .collect();
        let trace = InMemoryTrace::new()
            .with_callback(1, Some("Timer -- node: FrontLidarDriver, period: 100 ms"), ticks)
            .unwrap()
            .with_callback(2, Some("Timer -- node: Idle, period: 100 ms"), Vec::new())
            .unwrap();

        let analyzer = Analyzer::default();
        ReportBundle {
            summary: Some(analyzer.summary(&trace).unwrap()),
            individual: Some(analyzer.individual(&trace).unwrap()),
        }
    }

    #[test]
    fn test_txt_output() {
        let text = bundle().to_txt().unwrap();
        assert!(text.contains("Dropped Messages Summary (1.00 s)"));
        assert!(text.contains("node_FrontLidarDriver"));
        assert!(text.contains("Skipped callbacks:"));
        assert!(text.contains("Frequency of Callback Duration"));
        assert!(text.contains("start (2021-06-01 12:00), 11 invocations"));
    }

    #[test]
    fn test_last_histogram_bin_is_closed() {
        let text = bundle().to_txt().unwrap();
        assert!(text.contains("[     1.500,      1.600)"));
        assert!(text.contains("     2.500]"));
        assert!(!text.contains("     2.500)"));
    }

    #[test]
    fn test_json_output() {
        let json = bundle().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["rows"][0]["name"], "node_FrontLidarDriver");
        assert_eq!(value["summary"]["rows"][0]["dropped"], 1.0);
        assert_eq!(value["individual"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_json_omits_missing_sections() {
        let bundle = ReportBundle {
            summary: None,
            individual: Some(Vec::new()),
        };
        let value: serde_json::Value = serde_json::from_str(&bundle.to_json().unwrap()).unwrap();
        assert!(value.get("summary").is_none());
    }
}
