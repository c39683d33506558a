//! Monthly earnings over the twelve months ending at a reference date.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::records::PaymentRecord;
use crate::error::FreelanceError;

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const WINDOW_LEN: usize = 12;

/// How a payment date is mapped onto the trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowMode {
    /// Only the month of year is compared; the year is ignored. A payment from
    /// March last year lands in this March's bucket.
    #[default]
    MonthOfYear,
    /// Keyed by (year, month). Payments older than twelve calendar months, or
    /// dated after the reference month, are left out.
    Rolling,
}

impl fmt::Display for WindowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowMode::MonthOfYear => write!(f, "month-of-year"),
            WindowMode::Rolling => write!(f, "rolling"),
        }
    }
}

impl FromStr for WindowMode {
    type Err = FreelanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "month-of-year" | "month" => Ok(WindowMode::MonthOfYear),
            "rolling" => Ok(WindowMode::Rolling),
            _ => Err(FreelanceError::InvalidWindow(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    #[serde(rename = "month")]
    pub label: &'static str,
    pub earnings: f64,
}

/// Twelve buckets, oldest first, the last one being the reference month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EarningsSeries {
    buckets: Vec<MonthBucket>,
}

impl EarningsSeries {
    pub fn buckets(&self) -> &[MonthBucket] {
        &self.buckets
    }

    pub fn total(&self) -> f64 {
        self.buckets.iter().map(|b| b.earnings).sum()
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.buckets
            .iter()
            .find(|b| b.label == label)
            .map(|b| b.earnings)
    }

    /// True when every bucket is zero. The series itself always has 12 buckets.
    pub fn has_no_earnings(&self) -> bool {
        self.buckets.iter().all(|b| b.earnings == 0.0)
    }
}

/// Aggregate with the month-of-year window.
pub fn aggregate(payments: &[PaymentRecord], reference: NaiveDate) -> EarningsSeries {
    aggregate_with(payments, reference, WindowMode::MonthOfYear)
}

pub fn aggregate_with(
    payments: &[PaymentRecord],
    reference: NaiveDate,
    window: WindowMode,
) -> EarningsSeries {
    let current = reference.month0() as usize;

    // Built newest first: index i is i months before the reference month.
    let mut buckets: Vec<MonthBucket> = (0..WINDOW_LEN)
        .map(|i| MonthBucket {
            label: MONTH_LABELS[(current + WINDOW_LEN - i) % WINDOW_LEN],
            earnings: 0.0,
        })
        .collect();

    for payment in payments {
        if let Some(idx) = months_back(payment.date, reference, window) {
            buckets[idx].earnings += payment.amount;
        }
    }

    buckets.reverse();
    EarningsSeries { buckets }
}

fn months_back(date: NaiveDate, reference: NaiveDate, window: WindowMode) -> Option<usize> {
    match window {
        WindowMode::MonthOfYear => {
            let current = reference.month0() as usize;
            Some((current + WINDOW_LEN - date.month0() as usize) % WINDOW_LEN)
        }
        WindowMode::Rolling => {
            let back = month_ordinal(reference) - month_ordinal(date);
            (0..WINDOW_LEN as i64)
                .contains(&back)
                .then_some(back as usize)
        }
    }
}

fn month_ordinal(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}
