use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::api::{PaymentStatus, RawPayment};

/// A validated payment. Amount is finite and non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRecord {
    pub id: String,
    pub project_id: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub status: PaymentStatus,
}

/// Why a payment could not be used in aggregation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordIssue {
    #[error("missing date")]
    MissingDate,
    #[error("unparseable date '{0}'")]
    InvalidDate(String),
    #[error("missing amount")]
    MissingAmount,
    #[error("non-numeric amount '{0}'")]
    InvalidAmount(String),
    #[error("negative amount {0}")]
    NegativeAmount(f64),
}

/// A payment that was excluded from the sums
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedRecord {
    /// Position in the input list
    pub index: usize,
    pub id: Option<String>,
    pub issue: RecordIssue,
}

impl fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "payment #{} ({id}): {}", self.index + 1, self.issue),
            None => write!(f, "payment #{}: {}", self.index + 1, self.issue),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedPayments {
    pub records: Vec<PaymentRecord>,
    pub rejected: Vec<MalformedRecord>,
}

impl ParsedPayments {
    /// Number of payments received, usable or not
    pub fn total(&self) -> usize {
        self.records.len() + self.rejected.len()
    }
}

/// Validate every raw payment, splitting usable records from rejects.
pub fn parse_payments(raw: &[RawPayment]) -> ParsedPayments {
    let mut parsed = ParsedPayments::default();
    for (index, payment) in raw.iter().enumerate() {
        match parse_payment(index, payment) {
            Ok(record) => parsed.records.push(record),
            Err(rejected) => parsed.rejected.push(rejected),
        }
    }
    parsed
}

pub fn parse_payment(index: usize, raw: &RawPayment) -> Result<PaymentRecord, MalformedRecord> {
    let reject = |issue| MalformedRecord {
        index,
        id: raw.id.clone(),
        issue,
    };

    let date = match &raw.date {
        None => return Err(reject(RecordIssue::MissingDate)),
        Some(Value::String(s)) => {
            parse_wire_date(s).ok_or_else(|| reject(RecordIssue::InvalidDate(s.clone())))?
        }
        Some(other) => return Err(reject(RecordIssue::InvalidDate(other.to_string()))),
    };

    let amount = parse_payment_amount(raw.amount.as_ref()).map_err(reject)?;

    Ok(PaymentRecord {
        id: raw.id.clone().unwrap_or_default(),
        project_id: raw.project_id.clone().unwrap_or_default(),
        date,
        amount,
        status: PaymentStatus::from_wire(raw.status.as_deref()),
    })
}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (taken in UTC) and naive
/// `YYYY-MM-DDTHH:MM:SS` timestamps.
pub fn parse_wire_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

/// Numbers and numeric strings are accepted; the result is finite and non-negative.
pub fn parse_payment_amount(raw: Option<&Value>) -> Result<f64, RecordIssue> {
    let amount = match raw {
        None => return Err(RecordIssue::MissingAmount),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| RecordIssue::InvalidAmount(n.to_string()))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| RecordIssue::InvalidAmount(s.clone()))?,
        Some(other) => return Err(RecordIssue::InvalidAmount(other.to_string())),
    };

    if !amount.is_finite() {
        return Err(RecordIssue::InvalidAmount(amount.to_string()));
    }
    if amount < 0.0 {
        return Err(RecordIssue::NegativeAmount(amount));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(date: Value, amount: Value) -> RawPayment {
        RawPayment {
            id: Some("p".to_string()),
            project_id: Some("proj".to_string()),
            date: Some(date),
            amount: Some(amount),
            status: Some("paid".to_string()),
        }
    }

    #[test]
    fn test_parses_numeric_and_string_amounts() {
        let parsed = parse_payments(&[
            raw(json!("2024-03-01"), json!(100)),
            raw(json!("2024-03-01"), json!(" 49.5 ")),
        ]);
        assert!(parsed.rejected.is_empty());
        assert_eq!(parsed.records[0].amount, 100.0);
        assert_eq!(parsed.records[1].amount, 49.5);
        assert_eq!(parsed.records[0].status, PaymentStatus::Paid);
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(parse_wire_date("2024-03-01"), Some(expected));
        assert_eq!(
            parse_wire_date("2024-03-01T10:00:00.000Z"),
            Some(expected)
        );
        assert_eq!(parse_wire_date("2024-03-01T10:00:00"), Some(expected));
        // 23:30 at -05:00 is already the next day in UTC
        assert_eq!(
            parse_wire_date("2024-02-29T23:30:00-05:00"),
            Some(expected)
        );
        assert_eq!(parse_wire_date("yesterday"), None);
    }

    #[test]
    fn test_rejects_malformed_records() {
        let mut missing = raw(json!("2024-03-01"), json!(1));
        missing.amount = None;
        let mut no_date = raw(json!("2024-03-01"), json!(1));
        no_date.date = None;

        let parsed = parse_payments(&[
            raw(json!("2024-03-01"), json!("abc")),
            raw(json!("not a date"), json!(5)),
            raw(json!("2024-03-01"), json!(-3)),
            raw(json!(20240301), json!(5)),
            raw(json!("2024-03-01"), json!("NaN")),
            raw(json!("2024-03-01"), json!([1])),
            missing,
            no_date,
            raw(json!("2024-03-01"), json!(7)),
        ]);

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.total(), 9);
        let issues: Vec<_> = parsed.rejected.iter().map(|r| r.issue.clone()).collect();
        assert_eq!(issues[0], RecordIssue::InvalidAmount("abc".to_string()));
        assert_eq!(issues[1], RecordIssue::InvalidDate("not a date".to_string()));
        assert_eq!(issues[2], RecordIssue::NegativeAmount(-3.0));
        assert!(matches!(issues[3], RecordIssue::InvalidDate(_)));
        assert!(matches!(issues[4], RecordIssue::InvalidAmount(_)));
        assert!(matches!(issues[5], RecordIssue::InvalidAmount(_)));
        assert_eq!(issues[6], RecordIssue::MissingAmount);
        assert_eq!(issues[7], RecordIssue::MissingDate);
        assert_eq!(parsed.rejected[0].index, 0);
    }

    #[test]
    fn test_populated_project_and_odd_status_still_count() {
        let raw = crate::api::payments_from_value(json!({"payment": [
            {"_id": "p1", "projectId": {"_id": "site", "name": "Website"}, "date": "2024-03-01", "amount": 100, "status": "paid"},
            {"_id": "p2", "projectId": "site", "date": "2024-03-02", "amount": 50, "status": 1}
        ]}));
        let parsed = parse_payments(&raw);

        assert!(parsed.rejected.is_empty());
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].id, "p1");
        assert_eq!(parsed.records[0].project_id, "site");
        assert_eq!(parsed.records[0].status, PaymentStatus::Paid);
        assert_eq!(parsed.records[1].id, "p2");
        assert_eq!(parsed.records[1].status, PaymentStatus::Unpaid);
        assert_eq!(parsed.records.iter().map(|r| r.amount).sum::<f64>(), 150.0);
    }

    #[test]
    fn test_malformed_display() {
        let record = MalformedRecord {
            index: 2,
            id: Some("p9".to_string()),
            issue: RecordIssue::MissingAmount,
        };
        assert_eq!(record.to_string(), "payment #3 (p9): missing amount");
    }
}
