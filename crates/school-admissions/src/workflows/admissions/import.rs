use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use super::domain::{Applicant, ApplicantForm, ApplicantId};
use super::registry::ApplicantRegistry;
use super::repository::AdmissionsStore;

const REQUIRED_COLUMNS: [&str; 6] = [
    "ID",
    "Name",
    "Class",
    "Parent Name",
    "Parent Phone",
    "Parent Email",
];

#[derive(Debug)]
pub enum ApplicantImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingColumn(&'static str),
}

impl std::fmt::Display for ApplicantImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicantImportError::Io(err) => write!(f, "failed to read applicant export: {}", err),
            ApplicantImportError::Csv(err) => write!(f, "invalid applicant CSV data: {}", err),
            ApplicantImportError::MissingColumn(column) => {
                write!(f, "applicant CSV is missing the '{}' column", column)
            }
        }
    }
}

impl std::error::Error for ApplicantImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplicantImportError::Io(err) => Some(err),
            ApplicantImportError::Csv(err) => Some(err),
            ApplicantImportError::MissingColumn(_) => None,
        }
    }
}

impl From<std::io::Error> for ApplicantImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ApplicantImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// A CSV line that did not become an applicant. `line` counts the header as line 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub line: usize,
    pub id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub created: Vec<Applicant>,
    pub rejected: Vec<RejectedRow>,
}

/// Bulk-registers applicants from a spreadsheet export. Every row goes through the same
/// validation and uniqueness checks as a direct application.
pub struct ApplicantCsvImporter;

impl ApplicantCsvImporter {
    pub fn from_path<P, S>(
        path: P,
        registry: &ApplicantRegistry<S>,
    ) -> Result<ImportReport, ApplicantImportError>
    where
        P: AsRef<Path>,
        S: AdmissionsStore + 'static,
    {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, registry)
    }

    pub fn from_reader<R, S>(
        reader: R,
        registry: &ApplicantRegistry<S>,
    ) -> Result<ImportReport, ApplicantImportError>
    where
        R: Read,
        S: AdmissionsStore + 'static,
    {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        if let Some(missing) = REQUIRED_COLUMNS
            .iter()
            .find(|column| !headers.iter().any(|header| header == **column))
        {
            return Err(ApplicantImportError::MissingColumn(*missing));
        }

        let id_column = headers.iter().position(|header| header == "ID");
        let mut created = Vec::new();
        let mut rejected = Vec::new();
        let mut last_line = 1;

        for record in csv_reader.records() {
            let record = match record {
                Ok(record) => record,
                Err(err) => {
                    let line = err.position().map_or(last_line + 1, line_of);
                    last_line = line;
                    warn!(line, error = %err, "applicant row unreadable");
                    rejected.push(RejectedRow {
                        line,
                        id: None,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            // Quoted fields may span lines, so take the line from the reader.
            let line = record.position().map_or(last_line + 1, line_of);
            last_line = line;

            let row = match record.deserialize::<ApplicantRow>(Some(&headers)) {
                Ok(row) => row,
                Err(err) => {
                    rejected.push(RejectedRow {
                        line,
                        id: id_column
                            .and_then(|column| record.get(column))
                            .filter(|id| !id.is_empty())
                            .map(str::to_string),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let id = row.id.clone();
            match registry.create_applicant(row.into_form()) {
                Ok(applicant) => created.push(applicant),
                Err(err) => {
                    warn!(line, applicant_id = %id, error = %err, "applicant row rejected");
                    rejected.push(RejectedRow {
                        line,
                        id: Some(id),
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            created = created.len(),
            rejected = rejected.len(),
            "applicant import finished"
        );
        Ok(ImportReport { created, rejected })
    }
}

fn line_of(position: &csv::Position) -> usize {
    usize::try_from(position.line()).unwrap_or(usize::MAX)
}

#[derive(Debug, Deserialize)]
struct ApplicantRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Class")]
    class_name: String,
    #[serde(
        rename = "Submission Date",
        default,
        deserialize_with = "optional_date"
    )]
    submission_date: Option<NaiveDate>,
    #[serde(rename = "Parent Name")]
    parent_name: String,
    #[serde(rename = "Parent Phone")]
    parent_phone: String,
    #[serde(rename = "Parent Email")]
    parent_email: String,
    #[serde(rename = "Avatar", default, deserialize_with = "empty_string_as_none")]
    avatar: Option<String>,
}

impl ApplicantRow {
    fn into_form(self) -> ApplicantForm {
        ApplicantForm {
            id: ApplicantId(self.id),
            name: self.name,
            class_name: self.class_name,
            avatar: self.avatar,
            submission_date: self.submission_date,
            parent_name: self.parent_name,
            parent_phone: self.parent_phone,
            parent_email: self.parent_email,
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    empty_string_as_none(deserializer)?
        .map(|raw| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|err| {
                serde::de::Error::custom(format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::admissions::memory::InMemoryAdmissionsStore;
    use std::io::Cursor;
    use std::sync::Arc;

    #[test]
    fn missing_required_column_aborts_import() {
        let registry = ApplicantRegistry::new(Arc::new(InMemoryAdmissionsStore::new()));
        let csv = "ID,Name,Class,Parent Name,Parent Phone\nUC/24/001,Ada Obi,JSS 1A,Ngozi Obi,08031234567\n";

        match ApplicantCsvImporter::from_reader(Cursor::new(csv), &registry) {
            Err(ApplicantImportError::MissingColumn("Parent Email")) => {}
            other => panic!("expected missing column error, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_date_rejects_only_that_row() {
        let registry = ApplicantRegistry::new(Arc::new(InMemoryAdmissionsStore::new()));
        let csv = "\
ID,Name,Class,Submission Date,Parent Name,Parent Phone,Parent Email
UC/24/001,Ada Obi,JSS 1A,2024-01-12,Ngozi Obi,08031234567,ngozi@example.com
UC/24/002,Emeka Eze,JSS 1B,12/01/2024,Uche Eze,08039876543,uche@example.com
";

        let report =
            ApplicantCsvImporter::from_reader(Cursor::new(csv), &registry).expect("import runs");

        assert_eq!(report.created.len(), 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].line, 3);
        assert!(report.rejected[0].reason.contains("YYYY-MM-DD"));
    }

    #[test]
    fn rejected_rows_report_their_starting_line_after_multiline_fields() {
        let registry = ApplicantRegistry::new(Arc::new(InMemoryAdmissionsStore::new()));
        let csv = "\
ID,Name,Class,Parent Name,Parent Phone,Parent Email
UC/24/001,Ada Obi,\"JSS 1A
(boarding)\",Ngozi Obi,08031234567,ngozi@example.com
UC/24/002,Emeka Eze,JSS 1B,Uche Eze,08039876543,not-an-email
UC/24/003,,JSS 1B,Bisi Ojo,08030000000,bisi@example.com
";

        let report =
            ApplicantCsvImporter::from_reader(Cursor::new(csv), &registry).expect("import runs");

        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].class_name, "JSS 1A\n(boarding)");
        let lines: Vec<(usize, Option<&str>)> = report
            .rejected
            .iter()
            .map(|row| (row.line, row.id.as_deref()))
            .collect();
        assert_eq!(lines, vec![(4, Some("UC/24/002")), (5, Some("UC/24/003"))]);
    }
}
