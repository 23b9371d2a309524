//! Console and JSON rendering of an audit report

use chrono::Utc;
use colored::*;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::result::{AuditReport, AuditResult, Verdict};

/// One console line per result, with the cause indented beneath
pub fn render_result(result: &AuditResult) -> String {
    let line = if result.passed() {
        format!("{} {}", "✔".green(), result.message().green())
    } else if result.required() {
        format!("{} {}", "X".red().bold(), result.message().red())
    } else {
        format!("{} {}", "!".yellow().bold(), result.message().yellow())
    };

    match result.cause() {
        Some(cause) if cause.message != result.message() || cause.url.is_some() => {
            let mut out = line;
            out.push_str(&format!("\n    {} {}", "→".blue(), cause.message));
            if let Some(url) = &cause.url {
                out.push_str(&format!("\n      URL: {url}"));
            }
            if let Some(status) = cause.status {
                out.push_str(&format!("\n      Status: {status}"));
            }
            out
        }
        _ => line,
    }
}

/// Summary line naming the verdict and counts
pub fn render_summary(report: &AuditReport) -> String {
    let passed = report.results().iter().filter(|r| r.passed()).count();
    let failures = report.required_failures().count();
    let warnings = report.warnings().count();
    let counts = format!("{passed} passed, {failures} failed, {warnings} warnings");

    match report.verdict() {
        Verdict::Pass => format!("{} ({counts})", "✅ AUDIT PASSED".green().bold()),
        Verdict::PassWithWarnings => {
            format!("{} ({counts})", "⚠️  AUDIT PASSED WITH WARNINGS".yellow().bold())
        }
        Verdict::Fail => format!("{} ({counts})", "❌ AUDIT FAILED".red().bold()),
    }
}

/// Print every result and the summary to stdout
pub fn print_report(report: &AuditReport) {
    println!("\n{}", "Audit Results:".blue().bold());
    for result in report.results() {
        println!("{}", render_result(result));
    }
    println!("\n{}", render_summary(report));
}

/// Persisted form of a report
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: String,
    pub target: &'a str,
    pub verdict: Verdict,
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
    pub results: &'a [AuditResult],
}

impl<'a> JsonReport<'a> {
    pub fn new(target: &'a str, report: &'a AuditReport) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            target,
            verdict: report.verdict(),
            passed: report.results().iter().filter(|r| r.passed()).count(),
            failed: report.required_failures().count(),
            warnings: report.warnings().count(),
            results: report.results(),
        }
    }
}

/// Write the report as pretty JSON to `path`
pub fn write_json_report(path: &Path, target: &str, report: &AuditReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&JsonReport::new(target, report))?;
    fs::write(path, json)?;
    println!("\n{} {}", "📁 Report saved:".blue(), path.display());
    Ok(())
}
