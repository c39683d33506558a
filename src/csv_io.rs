use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::api::{Project, ProjectInput, ProjectStatus};
use crate::error::Result;

#[derive(Debug, Serialize, Deserialize)]
struct ProjectCsvRow {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    duedate: String,
    #[serde(default)]
    status: String,
}

/// A CSV row that could not become a project
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    /// 1-based line number, header included
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ImportedProjects {
    pub projects: Vec<ProjectInput>,
    pub rejected: Vec<RejectedRow>,
}

/// Write projects as `id,name,duedate,status`
pub fn write_projects<W: Write>(writer: W, projects: &[Project]) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for project in projects {
        out.serialize(ProjectCsvRow {
            id: project.id.clone(),
            name: project.name.clone(),
            duedate: project.duedate.clone(),
            status: project.status.clone(),
        })?;
    }
    // An empty export still gets a header line
    if projects.is_empty() {
        out.write_record(["id", "name", "duedate", "status"])?;
    }
    out.flush()?;
    Ok(())
}

/// Read a projects CSV. Rows with a missing name, a bad due date or an unknown
/// status are rejected individually; the `id` column is ignored.
pub fn read_projects<R: Read>(reader: R) -> Result<ImportedProjects> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut imported = ImportedProjects::default();
    for (idx, row) in rdr.deserialize::<ProjectCsvRow>().enumerate() {
        let line = idx + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                imported.rejected.push(RejectedRow {
                    line,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        match validate_row(row) {
            Ok(project) => imported.projects.push(project),
            Err(reason) => imported.rejected.push(RejectedRow { line, reason }),
        }
    }
    Ok(imported)
}

fn validate_row(row: ProjectCsvRow) -> std::result::Result<ProjectInput, String> {
    if row.name.is_empty() {
        return Err("missing name".to_string());
    }
    NaiveDate::parse_from_str(&row.duedate, "%Y-%m-%d")
        .map_err(|_| format!("invalid due date '{}'", row.duedate))?;
    let status: ProjectStatus = row.status.parse().map_err(|e| format!("{e}"))?;

    Ok(ProjectInput {
        name: row.name,
        duedate: row.duedate,
        status,
    })
}
