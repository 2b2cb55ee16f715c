//! Output formatting for CLI commands.

use std::fmt::Write as _;

use serde::Serialize;
use serde_json::json;
use vigil_audit_ledger::VerifyReport;
use vigil_scan::{AuditStatus, ScanReport, WalkSummary};

use crate::cli::{CommandContext, OutputFormat};
use crate::error::CliError;

/// Types that can be rendered for output
pub trait FormattedOutput {
    fn format_text(&self) -> String;
    fn format_json(&self) -> Result<String, serde_json::Error>;
}

/// Print formatted output to stdout
pub fn print_output<T: FormattedOutput + ?Sized>(ctx: &CommandContext, value: &T) -> Result<(), CliError> {
    let output = match ctx.format {
        OutputFormat::Text => value.format_text(),
        OutputFormat::Json => value
            .format_json()
            .map_err(|e| CliError::Other(anyhow::anyhow!("JSON serialization failed: {e}")))?,
    };
    println!("{output}");
    Ok(())
}

fn report_text(report: &ScanReport, out: &mut String) {
    let _ = writeln!(out, "{}", report.result.target);
    for (name, outcome) in &report.result.per_check {
        let _ = writeln!(out, "  {name:<16} {outcome}");
    }
    match &report.audit {
        AuditStatus::Logged { entry_hash } => {
            let _ = writeln!(out, "  {:<16} logged {entry_hash}", "audit");
        }
        AuditStatus::LogFailed { error } => {
            let _ = writeln!(out, "  {:<16} NOT LOGGED: {error}", "audit");
        }
    }
}

impl FormattedOutput for ScanReport {
    fn format_text(&self) -> String {
        let mut out = String::new();
        report_text(self, &mut out);
        out.trim_end().to_string()
    }

    fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_json())
    }
}

impl FormattedOutput for WalkSummary {
    fn format_text(&self) -> String {
        let mut out = String::new();
        for report in &self.reports {
            report_text(report, &mut out);
        }
        let _ = write!(
            out,
            "scanned {} files, {} not logged",
            self.scanned, self.log_failures
        );
        out
    }

    fn format_json(&self) -> Result<String, serde_json::Error> {
        let reports: Vec<_> = self.reports.iter().map(ScanReport::to_json).collect();
        serde_json::to_string_pretty(&json!({
            "scanned": self.scanned,
            "log_failures": self.log_failures,
            "reports": reports,
        }))
    }
}

impl FormattedOutput for VerifyReport {
    fn format_text(&self) -> String {
        let mut out = self.to_string();
        for issue in self.inconsistencies.iter().skip(1) {
            let _ = write!(out, "\n  also at index {} ({}: {})", issue.index, issue.kind, issue.detail);
        }
        if !self.is_intact() {
            let _ = write!(out, "\n  trusted prefix: {} entries", self.trusted_prefix());
        }
        out
    }

    fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&json!({
            "intact": self.is_intact(),
            "trusted_prefix": self.trusted_prefix(),
            "report": self,
        }))
    }
}

/// Entry hash returned by `vigil log`
#[derive(Debug, Serialize)]
pub struct LoggedEntry {
    pub entry_hash: String,
}

impl FormattedOutput for LoggedEntry {
    fn format_text(&self) -> String {
        self.entry_hash.clone()
    }

    fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
