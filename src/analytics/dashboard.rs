use chrono::NaiveDate;
use serde::Serialize;

use super::earnings::{aggregate_with, EarningsSeries, WindowMode};
use super::records::ParsedPayments;
use crate::api::{Project, ProjectStatus};

/// Counts and series behind the analytics dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub active_projects: usize,
    pub completed_projects: usize,
    /// Every payment received from the ledger, including rejected ones
    pub processed_payments: usize,
    pub earnings: EarningsSeries,
}

impl DashboardSummary {
    pub fn build(
        projects: &[Project],
        payments: &ParsedPayments,
        reference: NaiveDate,
        window: WindowMode,
    ) -> Self {
        let count = |status: ProjectStatus| {
            projects
                .iter()
                .filter(|p| p.project_status() == Some(status))
                .count()
        };

        Self {
            active_projects: count(ProjectStatus::Active),
            completed_projects: count(ProjectStatus::Completed),
            processed_payments: payments.total(),
            earnings: aggregate_with(&payments.records, reference, window),
        }
    }

    /// Rows for the project comparison chart
    pub fn project_rows(&self) -> [(&'static str, usize); 2] {
        [
            ("Active Projects", self.active_projects),
            ("Completed Projects", self.completed_projects),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::parse_payments;
    use crate::api::RawPayment;
    use serde_json::json;

    fn project(status: &str) -> Project {
        Project {
            id: "id".to_string(),
            name: "name".to_string(),
            duedate: "2024-05-01".to_string(),
            status: status.to_string(),
        }
    }

    #[test]
    fn test_counts_projects_by_status() {
        let projects = vec![
            project("Active"),
            project("Active"),
            project("Completed"),
            project(""),
        ];
        let summary = DashboardSummary::build(
            &projects,
            &ParsedPayments::default(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            WindowMode::MonthOfYear,
        );
        assert_eq!(summary.active_projects, 2);
        assert_eq!(summary.completed_projects, 1);
        assert_eq!(summary.processed_payments, 0);
        assert_eq!(summary.earnings.buckets().len(), 12);
        assert_eq!(
            summary.project_rows(),
            [("Active Projects", 2), ("Completed Projects", 1)]
        );
    }

    #[test]
    fn test_rejected_payments_count_but_do_not_earn() {
        let raw = vec![
            RawPayment {
                id: Some("a".to_string()),
                date: Some(json!("2024-03-02")),
                amount: Some(json!(80)),
                ..Default::default()
            },
            RawPayment {
                id: Some("b".to_string()),
                date: Some(json!("2024-03-03")),
                amount: Some(json!("lots")),
                ..Default::default()
            },
        ];
        let parsed = parse_payments(&raw);
        let summary = DashboardSummary::build(
            &[],
            &parsed,
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            WindowMode::MonthOfYear,
        );
        assert_eq!(summary.processed_payments, 2);
        assert_eq!(summary.earnings.get("Mar"), Some(80.0));
        assert_eq!(summary.earnings.total(), 80.0);
    }
}
