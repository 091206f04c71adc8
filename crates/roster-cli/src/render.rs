//! Output rendering for search results.

use anyhow::Result;
use owo_colors::OwoColorize;
use roster_core::{Location, QueryParams, ResultRow, ResultSet, ResultStatus};
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::OutputFormat;

#[derive(Serialize)]
struct SearchOutput<'a> {
    location: String,
    params: Vec<(&'a str, &'a str)>,
    status: ResultStatus,
    rows: &'a [ResultRow],
}

#[derive(Tabled)]
struct RowView {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Age")]
    age: String,
    #[tabled(rename = "Sex")]
    sex: String,
}

impl From<&ResultRow> for RowView {
    fn from(row: &ResultRow) -> Self {
        Self {
            id: row.id.to_string(),
            name: row.name_text().unwrap_or_else(|| "?".to_string()),
            age: row.age_text().unwrap_or_else(|| "?".to_string()),
            sex: row.sex_text().unwrap_or_else(|| "?".to_string()),
        }
    }
}

/// Parameters as shown to a person: decoded `key=value` pairs joined by `&`,
/// or `(none)`.
#[must_use]
pub fn display_params(params: &QueryParams) -> String {
    if params.is_empty() {
        return "(none)".to_string();
    }
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Renders the location and its results in `format`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn search_results(
    location: &Location,
    results: &ResultSet,
    format: &OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let output = SearchOutput {
                location: location.to_string(),
                params: location.params.iter().collect(),
                status: results.status,
                rows: &results.rows,
            };
            Ok(serde_json::to_string_pretty(&output)?)
        }
        OutputFormat::Text => {
            let mut lines = vec![format!(
                "{} {}",
                "Current URL params:".bold(),
                display_params(&location.params)
            )];
            lines.extend(status_line(results));
            for row in &results.rows {
                let view = RowView::from(row);
                lines.push(format!(
                    "  {} - {} - age {} - {}",
                    view.id, view.name, view.age, view.sex
                ));
            }
            Ok(lines.join("\n"))
        }
        OutputFormat::Table => {
            let mut lines = vec![format!(
                "{} {}",
                "Current URL params:".bold(),
                display_params(&location.params)
            )];
            lines.extend(status_line(results));
            if !results.rows.is_empty() {
                let rows: Vec<RowView> = results.rows.iter().map(RowView::from).collect();
                lines.push(Table::new(rows).to_string());
            }
            Ok(lines.join("\n"))
        }
    }
}

fn status_line(results: &ResultSet) -> Option<String> {
    match results.status {
        ResultStatus::Failed => Some(
            "Search failed; showing no results (see logs)"
                .red()
                .to_string(),
        ),
        _ if results.rows.is_empty() => Some("No results".dimmed().to_string()),
        _ => None,
    }
}
