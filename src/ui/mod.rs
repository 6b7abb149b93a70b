//! Terminal output: progress while checking, colored summary at the end.

use owo_colors::OwoColorize;
use std::io::IsTerminal;

use crate::models::VerdictStatus;
use crate::report::{ReportPaths, ReportSummary};

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Icon shown next to each verdict count.
pub fn status_icon(status: VerdictStatus) -> &'static str {
    match status {
        VerdictStatus::Verified => "✓",
        VerdictStatus::MissingInBib => "?",
        VerdictStatus::TitleMismatch => "≠",
        VerdictStatus::AuthorMismatch => "⚠",
        VerdictStatus::NotFound => "✗",
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "─".repeat(50).dimmed());
}

/// Per-key progress bar, `[i/n] Checking: key`
///
/// Hidden when quiet or when stdout is not a terminal, so piped output and
/// logs stay clean.
pub struct CheckProgress {
    pb: indicatif::ProgressBar,
}

impl CheckProgress {
    pub fn new(total: usize, quiet: bool) -> Self {
        let pb = if quiet || !is_terminal() {
            indicatif::ProgressBar::hidden()
        } else {
            indicatif::ProgressBar::new(total as u64)
        };
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] Checking: {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar()),
        );
        pb.set_length(total as u64);

        Self { pb }
    }

    /// Show the key at 1-based `position`
    pub fn update(&self, position: usize, key: &str) {
        self.pb.set_position(position as u64);
        self.pb.set_message(key.to_string());
    }

    pub fn is_hidden(&self) -> bool {
        self.pb.is_hidden()
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

/// Print per-status counts and where the reports went
pub fn print_summary(summary: &ReportSummary, paths: &ReportPaths) {
    print_section("Citation check");

    for status in VerdictStatus::ALL {
        let count = summary.count(status);
        let icon = status_icon(status);
        let line = format!("{:<16} {:>5}", status.label(), count);
        match status {
            VerdictStatus::Verified => println!("{} {}", icon.green().bold(), line),
            _ if count == 0 => println!("{} {}", icon.dimmed(), line.dimmed()),
            VerdictStatus::NotFound => println!("{} {}", icon.red().bold(), line),
            _ => println!("{} {}", icon.yellow().bold(), line),
        }
    }
    print_divider();

    let issues = summary.issues();
    if issues == 0 {
        println!(
            "{} All {} citations verified",
            status_icon(VerdictStatus::Verified).green().bold(),
            summary.total
        );
    } else {
        println!(
            "{} Found {} issues in {} citations. Check {}",
            status_icon(VerdictStatus::NotFound).red().bold(),
            issues.to_string().red().bold(),
            summary.total,
            paths.issues.display().to_string().cyan()
        );
    }
    println!(
        "Full report saved to {}",
        paths.all_citations.display().to_string().cyan()
    );
}
