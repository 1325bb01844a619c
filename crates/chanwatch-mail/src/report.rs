//! Plain-text scan reports.

use chanwatch_core::ScanResult;
use std::fmt::Write;

/// A rendered report, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// One-line summary
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

/// Render the report for a completed scan.
///
/// With violations the body states the count and lists every offending
/// product id on its own line, in the order they were found. Otherwise it
/// states how many products were checked.
#[must_use]
pub fn render_report(result: &ScanResult) -> Report {
    let violations = result.invalid_product_ids.len();

    if result.is_clean() {
        return Report {
            subject: format!("[chanwatch] {}: no violations", result.scan_key),
            body: format!(
                "checked {} products, no violations.\n\n{}",
                result.checked_count,
                footer(result)
            ),
        };
    }

    let noun = if violations == 1 { "product" } else { "products" };
    let mut body = format!(
        "{violations} {noun} with invalid channel groups (checked {}):\n\n",
        result.checked_count
    );
    for id in &result.invalid_product_ids {
        let _ = writeln!(body, "{id}");
    }
    body.push('\n');
    body.push_str(&footer(result));

    Report {
        subject: format!(
            "[chanwatch] {}: {violations} {noun} with invalid channel groups",
            result.scan_key
        ),
        body,
    }
}

fn footer(result: &ScanResult) -> String {
    format!(
        "run {} | {} page(s) | {} skipped by vendor filter | {}",
        result.run_id, result.pages_fetched, result.skipped_count, result.stop_reason
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chanwatch_core::{ProductId, ScanKey, StopReason};
    use chrono::Utc;
    use uuid::Uuid;

    fn result(invalid: &[&str], checked: u64) -> ScanResult {
        ScanResult {
            run_id: Uuid::new_v4(),
            scan_key: ScanKey::default(),
            checked_count: checked,
            skipped_count: 0,
            pages_fetched: 1,
            invalid_product_ids: invalid
                .iter()
                .map(|id| ProductId::new(*id).expect("valid id"))
                .collect(),
            stop_reason: StopReason::Exhausted,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn test_clean_report() {
        let report = render_report(&result(&[], 12));
        assert_eq!(report.subject, "[chanwatch] channel-audit: no violations");
        assert!(report.body.starts_with("checked 12 products, no violations."));
    }

    #[test]
    fn test_violation_report_lists_ids_in_order() {
        let report = render_report(&result(&["7001", "7003"], 5));
        assert_eq!(
            report.subject,
            "[chanwatch] channel-audit: 2 products with invalid channel groups"
        );
        assert!(report
            .body
            .starts_with("2 products with invalid channel groups (checked 5):"));

        let ids: Vec<&str> = report
            .body
            .lines()
            .filter(|line| line.chars().all(|c| c.is_ascii_digit()) && !line.is_empty())
            .collect();
        assert_eq!(ids, vec!["7001", "7003"]);
    }

    #[test]
    fn test_single_violation_wording() {
        let report = render_report(&result(&["42"], 1));
        assert!(report.subject.ends_with("1 product with invalid channel groups"));
    }

    #[test]
    fn test_footer_carries_run_id() {
        let scan = result(&[], 0);
        let report = render_report(&scan);
        assert!(report.body.contains(&scan.run_id.to_string()));
        assert!(report.body.contains("catalog exhausted"));
    }
}
