use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::FreelanceError;

/// Payment as returned by `GET /api/payments/pay`.
///
/// Nothing is validated at this level: `amount` may be a number or a numeric
/// string and `date` any string. See [`crate::analytics::parse_payments`].
/// The descriptive fields never fail decoding: a value of the wrong shape
/// becomes `None`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RawPayment {
    #[serde(rename = "_id", default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(rename = "projectId", default, deserialize_with = "lenient_string")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub date: Option<Value>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(string_or_id))
}

/// Strings pass through, numbers are stringified, and a populated reference
/// like `{"_id": "...", "name": "..."}` yields its `_id`.
fn string_or_id(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(mut map) => match map.remove("_id") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        },
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

impl PaymentStatus {
    /// Anything other than "paid" is shown as outstanding.
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.trim().eq_ignore_ascii_case("paid") => PaymentStatus::Paid,
            _ => PaymentStatus::Unpaid,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Unpaid => write!(f, "unpaid"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = FreelanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paid" => Ok(PaymentStatus::Paid),
            "unpaid" => Ok(PaymentStatus::Unpaid),
            _ => Err(FreelanceError::InvalidStatus {
                value: s.to_string(),
                expected: "paid, unpaid".to_string(),
            }),
        }
    }
}

/// Body for `POST /api/payments/add`
#[derive(Debug, Clone, Serialize)]
pub struct PaymentInput {
    #[serde(rename = "projectId")]
    pub project_id: String,
    pub amount: f64,
    pub date: String,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Project {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub duedate: String,
    #[serde(default)]
    pub status: String,
}

impl Project {
    pub fn project_status(&self) -> Option<ProjectStatus> {
        self.status.parse().ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    Active,
    Completed,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectStatus::Active => write!(f, "Active"),
            ProjectStatus::Completed => write!(f, "Completed"),
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = FreelanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ProjectStatus::Active),
            "completed" => Ok(ProjectStatus::Completed),
            _ => Err(FreelanceError::InvalidStatus {
                value: s.to_string(),
                expected: "Active, Completed".to_string(),
            }),
        }
    }
}

/// Body for `POST /api/projects`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProjectInput {
    pub name: String,
    pub duedate: String,
    pub status: ProjectStatus,
}

/// Body for `PUT /api/projects/{id}`.
///
/// `status` is the raw string: fields left alone go back exactly as the
/// server stored them, even a status outside `Active`/`Completed`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProjectUpdate {
    pub name: String,
    pub duedate: String,
    pub status: String,
}

impl ProjectUpdate {
    /// Overlay the given changes on a project as fetched from the server
    pub fn from_project(
        current: Project,
        name: Option<String>,
        duedate: Option<String>,
        status: Option<ProjectStatus>,
    ) -> Self {
        Self {
            name: name.unwrap_or(current.name),
            duedate: duedate.unwrap_or(current.duedate),
            status: status.map_or(current.status, |s| s.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct Registration<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
}

/// Extract payments from either the API envelope `{"payment": [...]}` or a
/// bare array. Anything else is treated as no payments.
///
/// Entries that are not even objects are kept as empty records so they are
/// counted and later reported as malformed.
pub fn payments_from_value(body: Value) -> Vec<RawPayment> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("payment") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item).unwrap_or_else(|e| {
                warn!("unreadable payment entry: {e}");
                RawPayment::default()
            })
        })
        .collect()
}

/// Extract projects from a JSON array. A non-array body yields no projects.
pub fn projects_from_value(body: Value) -> Vec<Project> {
    let Value::Array(items) = body else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(project) => Some(project),
            Err(e) => {
                warn!("skipping unreadable project entry: {e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payments_from_envelope() {
        let body = json!({
            "payment": [
                {"_id": "p1", "projectId": "x", "date": "2024-03-01", "amount": 100, "status": "paid"},
                {"_id": "p2", "projectId": "x", "date": "2024-02-10", "amount": "50", "status": "unpaid"}
            ]
        });
        let payments = payments_from_value(body);
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].id.as_deref(), Some("p1"));
        assert_eq!(payments[1].amount, Some(json!("50")));
    }

    #[test]
    fn test_payments_from_bare_array() {
        let body = json!([{"_id": "p1", "date": "2024-03-01", "amount": 1}]);
        assert_eq!(payments_from_value(body).len(), 1);
    }

    #[test]
    fn test_payments_non_array_is_empty() {
        assert!(payments_from_value(json!({"payment": null})).is_empty());
        assert!(payments_from_value(json!({"message": "nope"})).is_empty());
        assert!(payments_from_value(json!("oops")).is_empty());
    }

    #[test]
    fn test_odd_descriptive_fields_do_not_drop_payment() {
        let payments = payments_from_value(json!([
            {"_id": 7, "projectId": {"_id": "site", "name": "Website"}, "date": "2024-03-01", "amount": 1, "status": true},
            {"_id": "p2", "projectId": ["x"], "date": "2024-03-02", "amount": 2, "status": null}
        ]));
        assert_eq!(payments[0].id.as_deref(), Some("7"));
        assert_eq!(payments[0].project_id.as_deref(), Some("site"));
        assert_eq!(payments[0].status, None);
        assert_eq!(payments[0].date, Some(json!("2024-03-01")));
        assert_eq!(payments[1].id.as_deref(), Some("p2"));
        assert_eq!(payments[1].project_id, None);
        assert_eq!(payments[1].amount, Some(json!(2)));
    }

    #[test]
    fn test_unreadable_payment_entry_is_kept_empty() {
        let payments = payments_from_value(json!([42, {"_id": "ok"}]));
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0], RawPayment::default());
    }

    #[test]
    fn test_projects_from_value() {
        let body = json!([
            {"_id": "a", "name": "Site", "duedate": "2024-05-01", "status": "Active"},
            {"_id": "b", "name": "App", "duedate": "2024-06-01", "status": "Completed"},
            "garbage"
        ]);
        let projects = projects_from_value(body);
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].project_status(), Some(ProjectStatus::Active));
        assert_eq!(projects[1].project_status(), Some(ProjectStatus::Completed));
        assert!(projects_from_value(json!({"error": "x"})).is_empty());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("PAID".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
        assert!("maybe".parse::<PaymentStatus>().is_err());
        assert_eq!(PaymentStatus::from_wire(Some("paid")), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::from_wire(Some("pending")), PaymentStatus::Unpaid);
        assert_eq!(PaymentStatus::from_wire(None), PaymentStatus::Unpaid);
        assert_eq!("completed".parse::<ProjectStatus>().unwrap(), ProjectStatus::Completed);
        assert!("".parse::<ProjectStatus>().is_err());
    }

    #[test]
    fn test_inputs_serialize_with_wire_keys() {
        let input = PaymentInput {
            project_id: "abc".to_string(),
            amount: 12.5,
            date: "2024-03-01".to_string(),
            status: PaymentStatus::Unpaid,
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["projectId"], "abc");
        assert_eq!(value["status"], "unpaid");

        let project = ProjectInput {
            name: "Site".to_string(),
            duedate: "2024-05-01".to_string(),
            status: ProjectStatus::Active,
        };
        assert_eq!(serde_json::to_value(&project).unwrap()["status"], "Active");
    }

    #[test]
    fn test_update_keeps_unrecognised_stored_status() {
        let current = Project {
            id: "abc".to_string(),
            name: "Site".to_string(),
            duedate: "2024-05-01".to_string(),
            status: "".to_string(),
        };

        let update = ProjectUpdate::from_project(current.clone(), Some("New".to_string()), None, None);
        assert_eq!(update.name, "New");
        assert_eq!(update.duedate, "2024-05-01");
        assert_eq!(update.status, "");

        let update = ProjectUpdate::from_project(current, None, None, Some(ProjectStatus::Completed));
        assert_eq!(update.name, "Site");
        assert_eq!(serde_json::to_value(&update).unwrap()["status"], "Completed");
    }
}
