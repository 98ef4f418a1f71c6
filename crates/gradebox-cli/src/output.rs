//! Formatted output helpers for CLI commands.

use gradebox_report::model::BuildReport;

const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Renders a human-readable summary of a build report.
#[must_use]
pub fn render_summary(report: &BuildReport) -> String {
    let mut lines = Vec::new();

    let status = if report.successful {
        format!("{GREEN}{BOLD}BUILD SUCCESSFUL{RESET}")
    } else {
        format!("{RED}{BOLD}BUILD FAILED{RESET}")
    };
    lines.push(format!(
        "  {status} {DIM}({} passed, {} failed, {}){RESET}",
        report.passed.len(),
        report.failed.len(),
        format_duration(report.duration_secs)
    ));

    if let Some(hash) = &report.assignment_commit {
        lines.push(format!("  {DIM}assignment commit: {hash}{RESET}"));
    }
    if let Some(hash) = &report.test_commit {
        lines.push(format!("  {DIM}test commit:       {hash}{RESET}"));
    }
    if let Some(code) = report.script_exit_code {
        if code != 0 {
            lines.push(format!("  {DIM}script exit code:  {code}{RESET}"));
        }
    }

    for case in &report.failed {
        lines.push(format!("    {RED}✗{RESET} {BOLD}{}{RESET}", case.name));
        for message in &case.messages {
            lines.push(format!("      {DIM}{message}{RESET}"));
        }
    }
    for case in &report.passed {
        lines.push(format!("    {GREEN}✓{RESET} {}", case.name));
    }

    lines.join("\n")
}

/// Renders a build report as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if the report cannot be serialized.
pub fn render_json(report: &BuildReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Formats a duration in seconds as a short human-readable string.
#[must_use]
pub fn format_duration(secs: u64) -> String {
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use gradebox_report::model::TestCase;

    use super::*;

    fn sample_report(failed: Vec<TestCase>, passed: Vec<TestCase>) -> BuildReport {
        BuildReport::new(
            Some("1111111111111111111111111111111111111111".into()),
            None,
            failed,
            passed,
            "2026-02-11T10:54:31Z".into(),
            75,
            vec![Some("2026-02-11T10:54:31".into())],
            Some(0),
        )
    }

    #[test]
    fn format_duration_under_a_minute() {
        assert_eq!(format_duration(42), "42s");
    }

    #[test]
    fn format_duration_with_minutes() {
        assert_eq!(format_duration(75), "1m 15s");
    }

    #[test]
    fn summary_shows_failure_messages() {
        let report = sample_report(
            vec![TestCase::failed("testY", vec!["boom".into()])],
            vec![TestCase::passed("testX")],
        );
        let summary = render_summary(&report);
        assert!(summary.contains("BUILD FAILED"));
        assert!(summary.contains("testY"));
        assert!(summary.contains("boom"));
        assert!(summary.contains("testX"));
    }

    #[test]
    fn summary_reports_success() {
        let report = sample_report(vec![], vec![TestCase::passed("testX")]);
        let summary = render_summary(&report);
        assert!(summary.contains("BUILD SUCCESSFUL"));
    }

    #[test]
    fn json_rendering_roundtrips_the_success_flag() {
        let report = sample_report(vec![], vec![TestCase::passed("testX")]);
        let json = render_json(&report).expect("serialize");
        assert!(json.contains("\"successful\": true"));
    }
}
