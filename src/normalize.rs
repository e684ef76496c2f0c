// 🧹 Record Normalizer
// Raw persisted rows → display-ready TenderSummary
//
// Malformed dates/amounts never fail the row: the field falls back to its
// placeholder and the problem is reported in `issues`. Only an unknown status
// rejects a row, because TenderSummary cannot represent it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;

use crate::error::ValidationError;
use crate::tender::{TedTender, TenderRecord, TenderSource, TenderStatus, TenderSummary};

pub const NO_DEADLINE: &str = "No deadline set";
pub const NO_BUDGET: &str = "N/A";
pub const FEED_NO_BUDGET: &str = "Not specified";
pub const UNKNOWN_ORGANIZATION: &str = "Unknown";

// ============================================================================
// DEADLINES
// ============================================================================

/// Parse a persisted deadline
///
/// Accepts RFC 3339, `YYYY-MM-DD` and naive `YYYY-MM-DDTHH:MM:SS` (read as UTC).
pub fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(ValidationError::Deadline {
        value: raw.to_string(),
    })
}

/// en-US short date (`4/15/2024`), or the fixed marker when absent
pub fn format_deadline(deadline: Option<DateTime<Utc>>) -> String {
    match deadline {
        Some(dt) => dt.format("%-m/%-d/%Y").to_string(),
        None => NO_DEADLINE.to_string(),
    }
}

/// Parse + format in one step; empty text counts as "no deadline"
fn normalize_deadline(
    raw: Option<&str>,
    issues: &mut Vec<ValidationError>,
) -> (Option<DateTime<Utc>>, String) {
    let parsed = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => match parse_deadline(text) {
            Ok(dt) => Some(dt),
            Err(e) => {
                issues.push(e);
                None
            }
        },
        None => None,
    };

    (parsed, format_deadline(parsed))
}

// ============================================================================
// BUDGETS
// ============================================================================

/// USD, two decimals, grouped thousands: `$1,234,567.80`
pub fn format_usd(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, group_thousands(cents / 100), cents % 100)
}

/// Amount in an arbitrary currency: USD gets the `$` form, others `1,234.00 EUR`
pub fn format_amount(amount: f64, currency: &str) -> String {
    let code = currency.trim().to_uppercase();
    if code.is_empty() || code == "USD" {
        return format_usd(amount);
    }

    let cents = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}{}.{:02} {}", sign, group_thousands(cents / 100), cents % 100, code)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}

/// Recover a number from a display string by dropping everything but digits, `.` and `-`
///
/// `"$1,234.50"` → `1234.5`, `"1,000.00 EUR"` → `1000.0`, `"N/A"` → `None`
pub fn parse_budget_display(display: &str) -> Option<f64> {
    let numeric: String = display
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    numeric.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn normalize_budget(
    amount: Option<f64>,
    currency: Option<&str>,
    placeholder: &str,
    issues: &mut Vec<ValidationError>,
) -> (Option<f64>, String) {
    match amount {
        Some(value) if value.is_finite() => {
            let display = match currency {
                Some(code) => format_amount(value, code),
                None => format_usd(value),
            };
            (Some(value), display)
        }
        Some(value) => {
            issues.push(ValidationError::Budget { value });
            (None, placeholder.to_string())
        }
        None => (None, placeholder.to_string()),
    }
}

// ============================================================================
// ROWS
// ============================================================================

/// A summary plus whatever was recovered on the way
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub summary: TenderSummary,
    pub issues: Vec<ValidationError>,
}

/// Locally authored tender → summary
///
/// `organizations` maps organization ids to display names (vendor profiles).
pub fn normalize_local(
    record: &TenderRecord,
    organizations: &HashMap<String, String>,
) -> Result<Normalized, ValidationError> {
    let status: TenderStatus = record.status.parse()?;
    let mut issues = Vec::new();

    let (deadline_raw, deadline_display) = normalize_deadline(record.deadline.as_deref(), &mut issues);
    let (budget_raw, budget_display) = normalize_budget(record.budget, None, NO_BUDGET, &mut issues);

    let organization = record
        .organization_id
        .as_ref()
        .and_then(|id| organizations.get(id))
        .filter(|name| !name.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| UNKNOWN_ORGANIZATION.to_string());

    Ok(Normalized {
        summary: TenderSummary {
            id: record.id.clone(),
            title: record.title.clone(),
            organization,
            deadline_raw,
            deadline_display,
            budget_raw,
            budget_display,
            status,
            source: TenderSource::Local,
            country: None,
        },
        issues,
    })
}

/// Feed notice → summary (always active, dated by publication)
pub fn normalize_ted(tender: &TedTender) -> Normalized {
    let mut issues = Vec::new();

    let (deadline_raw, deadline_display) = normalize_deadline(Some(&tender.publication_date), &mut issues);
    let (budget_raw, budget_display) = normalize_budget(
        tender.value_amount,
        Some(tender.value_currency.as_deref().unwrap_or("")),
        FEED_NO_BUDGET,
        &mut issues,
    );

    Normalized {
        summary: TenderSummary {
            id: tender.id.to_string(),
            title: tender.title.clone(),
            organization: tender
                .buyer_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_ORGANIZATION.to_string()),
            deadline_raw,
            deadline_display,
            budget_raw,
            budget_display,
            status: TenderStatus::Active,
            source: TenderSource::ExternalFeed,
            country: tender.buyer_country.clone(),
        },
        issues,
    }
}

/// Problem found while normalizing one row
#[derive(Debug, Clone, PartialEq)]
pub struct RowIssue {
    pub id: String,
    pub error: ValidationError,
    /// true when the row was dropped rather than patched with a placeholder
    pub rejected: bool,
}

/// Normalize a fetched batch of local rows
///
/// Rows with an unknown status are dropped; every issue is logged and returned.
pub fn normalize_local_batch(
    records: &[TenderRecord],
    organizations: &HashMap<String, String>,
) -> (Vec<TenderSummary>, Vec<RowIssue>) {
    let mut summaries = Vec::with_capacity(records.len());
    let mut row_issues = Vec::new();

    for record in records {
        match normalize_local(record, organizations) {
            Ok(normalized) => {
                for error in normalized.issues {
                    tracing::warn!(tender_id = %record.id, %error, "field replaced by placeholder");
                    row_issues.push(RowIssue {
                        id: record.id.clone(),
                        error,
                        rejected: false,
                    });
                }
                summaries.push(normalized.summary);
            }
            Err(error) => {
                tracing::warn!(tender_id = %record.id, %error, "row rejected");
                row_issues.push(RowIssue {
                    id: record.id.clone(),
                    error,
                    rejected: true,
                });
            }
        }
    }

    (summaries, row_issues)
}

/// Normalize a fetched batch of feed notices
pub fn normalize_ted_batch(tenders: &[TedTender]) -> (Vec<TenderSummary>, Vec<RowIssue>) {
    let mut summaries = Vec::with_capacity(tenders.len());
    let mut row_issues = Vec::new();

    for tender in tenders {
        let normalized = normalize_ted(tender);
        for error in normalized.issues {
            tracing::warn!(notice_id = tender.id, %error, "field replaced by placeholder");
            row_issues.push(RowIssue {
                id: tender.id.to_string(),
                error,
                rejected: false,
            });
        }
        summaries.push(normalized.summary);
    }

    (summaries, row_issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tender::{NewTender, NoticeType};
    use chrono::{Datelike, TimeZone};

    fn ted(id: i64, amount: Option<f64>, currency: Option<&str>) -> TedTender {
        TedTender {
            id,
            title: "Road maintenance".to_string(),
            publication_date: "2024-03-05".to_string(),
            notice_type: NoticeType::ContractNotice,
            buyer_name: Some("City of Ghent".to_string()),
            buyer_country: Some("BE".to_string()),
            value_amount: amount,
            value_currency: currency.map(str::to_string),
            original_url: None,
            description: None,
            cpv_codes: vec![],
            reference_number: None,
            sync_status: Some("synced".to_string()),
            last_sync_attempt: None,
        }
    }

    #[test]
    fn test_parse_deadline_formats() {
        let rfc = parse_deadline("2024-04-15T10:30:00Z").unwrap();
        assert_eq!(rfc, Utc.with_ymd_and_hms(2024, 4, 15, 10, 30, 0).unwrap());

        let offset = parse_deadline("2024-04-15T01:00:00+02:00").unwrap();
        assert_eq!(offset.day(), 14);

        let date_only = parse_deadline("2024-04-15").unwrap();
        assert_eq!(date_only, Utc.with_ymd_and_hms(2024, 4, 15, 0, 0, 0).unwrap());

        let naive = parse_deadline("2024-04-15T08:00:00.000").unwrap();
        assert_eq!(naive, Utc.with_ymd_and_hms(2024, 4, 15, 8, 0, 0).unwrap());

        assert!(parse_deadline("next tuesday").is_err());
    }

    #[test]
    fn test_format_deadline() {
        let dt = Utc.with_ymd_and_hms(2024, 4, 5, 0, 0, 0).unwrap();
        assert_eq!(format_deadline(Some(dt)), "4/5/2024");
        assert_eq!(format_deadline(None), NO_DEADLINE);
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(50.0), "$50.00");
        assert_eq!(format_usd(999.999), "$1,000.00");
        assert_eq!(format_usd(1234567.8), "$1,234,567.80");
        assert_eq!(format_usd(-5.0), "-$5.00");
    }

    #[test]
    fn test_format_amount_other_currency() {
        assert_eq!(format_amount(1234.0, "eur"), "1,234.00 EUR");
        assert_eq!(format_amount(1234.0, "USD"), "$1,234.00");
        assert_eq!(format_amount(12.5, ""), "$12.50");
    }

    #[test]
    fn test_parse_budget_display() {
        assert_eq!(parse_budget_display("$1,234.50"), Some(1234.5));
        assert_eq!(parse_budget_display("-$5.00"), Some(-5.0));
        assert_eq!(parse_budget_display("2,000.00 EUR"), Some(2000.0));
        assert_eq!(parse_budget_display(NO_BUDGET), None);
        assert_eq!(parse_budget_display(FEED_NO_BUDGET), None);
    }

    #[test]
    fn test_budget_round_trip() {
        for value in [0.0, 0.01, 50.0, 100.0, 999.99, 1234.56, 500_000.0, 2_000_000.25, -42.1] {
            let parsed = parse_budget_display(&format_usd(value)).unwrap();
            assert!((parsed - value).abs() < 0.005, "{} -> {}", value, parsed);
        }
    }

    #[test]
    fn test_normalize_local_resolves_organization() {
        let mut record = NewTender {
            budget: Some(500_000.0),
            deadline: Some("2024-04-15".to_string()),
            organization_id: Some("org-1".to_string()),
            ..NewTender::new("IT Infrastructure Upgrade")
        }
        .into_record();
        record.status = "active".to_string();

        let mut names = HashMap::new();
        names.insert("org-1".to_string(), "Ministry of Technology".to_string());

        let normalized = normalize_local(&record, &names).unwrap();
        let summary = normalized.summary;

        assert!(normalized.issues.is_empty());
        assert_eq!(summary.organization, "Ministry of Technology");
        assert_eq!(summary.deadline_display, "4/15/2024");
        assert_eq!(summary.budget_display, "$500,000.00");
        assert_eq!(summary.status, TenderStatus::Active);
        assert_eq!(summary.source, TenderSource::Local);
        assert_eq!(summary.country, None);
    }

    #[test]
    fn test_normalize_local_placeholders() {
        let record = NewTender::new("Unscheduled").into_record();
        let normalized = normalize_local(&record, &HashMap::new()).unwrap();

        assert!(normalized.issues.is_empty());
        assert_eq!(normalized.summary.deadline_display, NO_DEADLINE);
        assert_eq!(normalized.summary.budget_display, NO_BUDGET);
        assert_eq!(normalized.summary.organization, UNKNOWN_ORGANIZATION);
    }

    #[test]
    fn test_malformed_fields_are_recovered() {
        let mut record = NewTender {
            budget: Some(f64::NAN),
            deadline: Some("soon".to_string()),
            ..NewTender::new("Broken")
        }
        .into_record();
        record.status = "closed".to_string();

        let normalized = normalize_local(&record, &HashMap::new()).unwrap();

        assert_eq!(normalized.summary.deadline_raw, None);
        assert_eq!(normalized.summary.deadline_display, NO_DEADLINE);
        assert_eq!(normalized.summary.budget_raw, None);
        assert_eq!(normalized.summary.budget_display, NO_BUDGET);
        assert_eq!(normalized.issues.len(), 2);
    }

    #[test]
    fn test_unknown_status_rejects_row() {
        let mut ok = NewTender::new("Fine").into_record();
        ok.status = "draft".to_string();
        let mut bad = NewTender::new("Odd").into_record();
        bad.status = "archived".to_string();

        let (summaries, issues) = normalize_local_batch(&[ok, bad.clone()], &HashMap::new());

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].title, "Fine");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, bad.id);
        assert!(issues[0].rejected);
    }

    #[test]
    fn test_normalize_ted() {
        let summary = normalize_ted(&ted(2024001, Some(75_000.0), Some("EUR"))).summary;

        assert_eq!(summary.id, "2024001");
        assert_eq!(summary.status, TenderStatus::Active);
        assert_eq!(summary.source, TenderSource::ExternalFeed);
        assert_eq!(summary.organization, "City of Ghent");
        assert_eq!(summary.country.as_deref(), Some("BE"));
        assert_eq!(summary.budget_display, "75,000.00 EUR");
        assert_eq!(summary.deadline_display, "3/5/2024");
    }

    #[test]
    fn test_normalize_ted_without_value() {
        let mut notice = ted(7, None, None);
        notice.buyer_name = None;
        let summary = normalize_ted(&notice).summary;

        assert_eq!(summary.budget_display, FEED_NO_BUDGET);
        assert_eq!(summary.organization, UNKNOWN_ORGANIZATION);
    }
}
