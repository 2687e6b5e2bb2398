// src/core/export.rs

use crate::models::{Column, Target};
use crate::recon::Discovery;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to serialize options: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    /// Aligned columns.
    #[default]
    Table,
    Csv,
    /// The raw options.
    Json,
}

/// The columns to export.
///
/// With no request, every non-hidden column of every module; otherwise the
/// columns whose key or name was requested, hidden or not. Keys are unique.
pub fn columns<M: Discovery>(modules: &[M], requested: &[String]) -> Vec<Column> {
    let mut columns: Vec<Column> = Vec::new();
    for column in modules.iter().flat_map(|m| m.columns()) {
        if columns.iter().any(|c| c.key == column.key) {
            continue;
        }
        let wanted = if requested.is_empty() {
            !column.hidden
        } else {
            requested.iter().any(|r| *r == column.key || *r == column.name)
        };
        if wanted {
            columns.push(column);
        }
    }
    columns
}

/// The value of one cell.
pub fn cell(target: &Target, key: &str) -> String {
    match key {
        "module" => target.provider_name.clone(),
        "id" => target.id.clone(),
        "name" => target.name.clone(),
        "display_name" => target.display_name.clone(),
        "directory" => target.resolve_start_directory().display().to_string(),
        other => target.context.get(other).cloned().unwrap_or_default(),
    }
}

pub fn render(options: &[Target], columns: &[Column], format: ExportFormat) -> Result<String, ExportError> {
    let headers: Vec<&str> = columns.iter().map(|c| c.key.as_str()).collect();
    let rows: Vec<Vec<String>> = options
        .iter()
        .map(|o| columns.iter().map(|c| cell(o, &c.key)).collect())
        .collect();

    match format {
        ExportFormat::Table => Ok(render_table(&headers, &rows)),
        ExportFormat::Csv => Ok(render_csv(&headers, &rows)),
        ExportFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(options)?)),
    }
}

/// Writes `content` to `output`, or stdout when there is none.
pub fn write_output(content: &str, output: Option<&Path>) -> Result<(), ExportError> {
    match output {
        Some(path) => fs::write(path, content).map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}", table_line(headers, &widths));
    for row in rows {
        let values: Vec<&str> = row.iter().map(String::as_str).collect();
        let _ = writeln!(out, "{}", table_line(&values, &widths));
    }
    out
}

fn table_line(values: &[&str], widths: &[usize]) -> String {
    let padded: Vec<String> = values
        .iter()
        .zip(widths)
        .map(|(value, width)| format!("{:<width$}", value, width = *width))
        .collect();
    padded.join(" ").trim_end().to_string()
}

/// RFC 4180 quoting: fields with commas, quotes or line breaks are quoted, quotes doubled.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_csv(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    let header: Vec<String> = headers.iter().map(|h| csv_field(h)).collect();
    let _ = writeln!(out, "{}", header.join(","));
    for row in rows {
        let fields: Vec<String> = row.iter().map(|v| csv_field(v)).collect();
        let _ = writeln!(out, "{}", fields.join(","));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SshModuleConfig, StaticModuleConfig};
    use crate::recon::{SshModule, StaticModule};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn host(id: &str, user: &str) -> Target {
        Target {
            provider_name: "ssh".into(),
            id: id.into(),
            name: id.into(),
            display_name: format!("{} [{}@{}]", id, user, id),
            context: BTreeMap::from([
                ("host".to_string(), id.to_string()),
                ("user".to_string(), user.to_string()),
            ]),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_columns_skip_hidden_and_duplicates() {
        let modules = [
            SshModule::new(SshModuleConfig::default()),
            SshModule::new(SshModuleConfig::default()),
        ];
        let keys: Vec<String> = columns(&modules, &[]).into_iter().map(|c| c.key).collect();
        assert_eq!(keys, vec!["module", "display_name", "host", "user"]);
    }

    #[test]
    fn test_requested_columns_include_hidden() {
        let modules = [StaticModule::new(StaticModuleConfig::default())];
        let requested = vec!["ID".to_string(), "module".to_string()];
        let keys: Vec<String> = columns(&modules, &requested).into_iter().map(|c| c.key).collect();
        // Column order follows the modules, not the request.
        assert_eq!(keys, vec!["module", "id"]);
    }

    #[test]
    fn test_table_is_aligned() {
        let cols = vec![Column::new("id", "ID"), Column::new("user", "User")];
        let out = render(&[host("db1", "root"), host("web-frontend", "deploy")], &cols, ExportFormat::Table).unwrap();
        assert_eq!(
            out,
            "id           user\ndb1          root\nweb-frontend deploy\n"
        );
    }

    #[test]
    fn test_csv_quotes_fields() {
        let mut target = host("db1", "root");
        target.display_name = "db \"primary\", eu".into();
        let cols = vec![Column::new("id", "ID"), Column::new("display_name", "Display Name")];
        let out = render(&[target], &cols, ExportFormat::Csv).unwrap();
        assert_eq!(out, "id,display_name\ndb1,\"db \"\"primary\"\", eu\"\n");
    }

    #[test]
    fn test_json_is_raw_options() {
        let out = render(&[host("db1", "root")], &[], ExportFormat::Json).unwrap();
        let parsed: Vec<Target> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, vec![host("db1", "root")]);
    }

    #[test]
    fn test_unknown_key_reads_context() {
        let target = host("db1", "root");
        assert_eq!(cell(&target, "user"), "root");
        assert_eq!(cell(&target, "missing"), "");
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_output("a,b\n", Some(&path)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b\n");
    }
}
