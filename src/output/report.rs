//! Console report of a finished crawl
//!
//! The crawler keeps nothing on disk, so this report is the full record of
//! a run: what was fetched, what failed, and the statistics block.

use crate::crawler::CrawlReport;
use crate::output::stats::format_statistics;

/// Formats a crawl report for the console
pub fn format_report(report: &CrawlReport) -> String {
    let mut out = String::new();

    out.push_str("=== Crawl Report ===\n\n");
    out.push_str(&format!("Seed: {}\n", report.seed));
    out.push_str(&format!("Max depth: {}\n", report.max_depth));
    out.push_str(&format!(
        "Started: {}\n",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!(
        "Finished: {}\n\n",
        report.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    out.push_str(&format!("Pages ({}):\n", report.pages.len()));
    for (url, content) in &report.pages {
        out.push_str(&format!("  - {} ({} bytes)\n", url, content.len()));
    }
    out.push('\n');

    if !report.failures.is_empty() {
        out.push_str(&format!("Failures ({}):\n", report.failures.len()));
        for (url, error) in &report.failures {
            out.push_str(&format!("  - {}: {}\n", url, error));
        }
        out.push('\n');
    }

    out.push_str(&format_statistics(&report.stats, report.elapsed));
    out
}

/// Prints a crawl report to stdout
pub fn print_report(report: &CrawlReport) {
    print!("{}", format_report(report));
}
