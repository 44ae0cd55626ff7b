//! Shared output formatting for check results.

use anyhow::Result;
use nsdep_core::{Issue, Severity};
use serde::Serialize;

use crate::OutputFormat;

/// Result of checking one project.
#[derive(Debug, Default, Serialize)]
pub struct CheckReport {
    /// Issues in the order they were found.
    pub issues: Vec<Issue>,
    /// Number of source files handed to the analyzer.
    pub files_checked: usize,
}

impl CheckReport {
    /// Counts issues as (errors, warnings, infos).
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        self.issues
            .iter()
            .fold((0, 0, 0), |(e, w, i), issue| match issue.severity {
                Severity::Error => (e + 1, w, i),
                Severity::Warning => (e, w + 1, i),
                Severity::Info => (e, w, i + 1),
            })
    }

    /// Returns true if any issue is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }
}

/// Print check results in the specified format.
pub fn print(report: &CheckReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(report),
        OutputFormat::Json => return print_json(report),
        OutputFormat::Compact => print_compact(report),
    }
    Ok(())
}

fn print_text(report: &CheckReport) {
    let (errors, warnings, infos) = report.count_by_severity();

    for issue in &report.issues {
        let severity_indicator = match issue.severity {
            Severity::Error => "\x1b[31merror\x1b[0m",
            Severity::Warning => "\x1b[33mwarning\x1b[0m",
            Severity::Info => "\x1b[34minfo\x1b[0m",
        };

        println!(
            "{} {} at {}",
            issue.code,
            issue.rule_name(),
            issue.dependency.source
        );
        println!("  {}: {}", severity_indicator, issue.message);
        println!("  = dependency: {}", issue.dependency);
        println!();
    }

    let summary_color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    println!(
        "{}Found {} error(s), {} warning(s), {} info(s) in {} file(s)\x1b[0m",
        summary_color, errors, warnings, infos, report.files_checked
    );
}

fn print_json(report: &CheckReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{json}");
    Ok(())
}

fn print_compact(report: &CheckReport) {
    for issue in &report.issues {
        println!("{issue}");
    }
}
