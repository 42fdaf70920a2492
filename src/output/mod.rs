//! Output module for crawl reports and statistics
//!
//! This module handles:
//! - Counting what crawl tasks did while they run
//! - Formatting a finished crawl as a console report

mod report;
pub mod stats;

pub use report::{format_report, print_report};
pub use stats::{format_statistics, CrawlStatistics, CrawlStats};
