//! Snapshot tests for overrun report text.

use contextualize_scope::OverrunReport;

#[test]
fn test_report_without_diagnostic_snapshot() {
    let report = OverrunReport::new("RunCommand", "Running command on cluster node (10.0.0.12)");
    insta::assert_snapshot!("report_without_diagnostic", report.render());
}

#[test]
fn test_report_with_diagnostic_snapshot() {
    let diagnostic = [
        "  thread 'worker-3' blocked in read()",
        "    at ssh::channel::read",
        "    at cluster::node::run_cmd",
        "",
        "  last heartbeat: 42s ago",
    ]
    .join("\n");
    let report = OverrunReport::new("RunCommand", "Running command on cluster node (10.0.0.12)")
        .with_diagnostic(diagnostic);
    insta::assert_snapshot!("report_with_diagnostic", report.render());
}

#[test]
fn test_report_with_diagnostic_failure_snapshot() {
    let report = OverrunReport::new("QueryStatus", "Querying power unit status")
        .with_diagnostic_failure("status query failed: connection refused");
    insta::assert_snapshot!("report_with_diagnostic_failure", report.render());
}
