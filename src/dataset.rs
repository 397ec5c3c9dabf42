use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};

use crate::error::{Result, TableTalkError};
use crate::models::{ColumnSummary, ColumnType, DatasetSummary};

/// Cell tokens treated as missing values, compared case-insensitively
const MISSING_TOKENS: &[&str] = &["", "na", "n/a", "null", "nan"];

/// In-memory tabular dataset parsed from an upload. Owned by the session and
/// replaced wholesale on every new upload, never patched.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if columns.is_empty() {
            return Err(TableTalkError::MalformedUpload {
                format: "tabular".to_string(),
                detail: "no columns found".to_string(),
            });
        }
        for (i, name) in columns.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(TableTalkError::MalformedUpload {
                    format: "tabular".to_string(),
                    detail: format!("column {} has an empty name", i + 1),
                });
            }
            if columns[..i].iter().any(|other| other == name) {
                return Err(TableTalkError::MalformedUpload {
                    format: "tabular".to_string(),
                    detail: format!("duplicate column name '{name}'"),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Resolve a user-supplied column name: exact match first, then
    /// case-insensitive, so "age" finds "Age".
    pub fn resolve_column(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.eq_ignore_ascii_case(name))
            })
    }

    /// Cell values of one column, in row order
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| row[idx].as_str())
    }

    /// Non-missing cells of one column parsed as f64, in row order
    pub fn numeric_values(&self, idx: usize) -> Vec<f64> {
        self.column_values(idx)
            .filter(|cell| !is_missing(cell))
            .filter_map(|cell| cell.trim().parse::<f64>().ok())
            .collect()
    }

    pub fn missing_count(&self, idx: usize) -> usize {
        self.column_values(idx).filter(|cell| is_missing(cell)).count()
    }

    /// Infer a column type from its non-missing cells
    pub fn column_type(&self, idx: usize) -> ColumnType {
        let mut any = false;
        let mut all_int = true;
        let mut all_float = true;
        let mut all_bool = true;
        for cell in self.column_values(idx).filter(|c| !is_missing(c)) {
            any = true;
            let cell = cell.trim();
            if cell.parse::<i64>().is_err() {
                all_int = false;
            }
            if cell.parse::<f64>().is_err() {
                all_float = false;
            }
            if !cell.eq_ignore_ascii_case("true") && !cell.eq_ignore_ascii_case("false") {
                all_bool = false;
            }
        }
        if !any {
            return ColumnType::Text;
        }
        if all_int {
            ColumnType::Integer
        } else if all_float {
            ColumnType::Float
        } else if all_bool {
            ColumnType::Boolean
        } else {
            ColumnType::Text
        }
    }

    /// Shape, missing counts and inferred types, shown to the user after upload
    pub fn summary(&self) -> DatasetSummary {
        let column_summaries = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| ColumnSummary {
                name: name.clone(),
                dtype: self.column_type(idx),
                missing: self.missing_count(idx),
            })
            .collect();
        DatasetSummary {
            rows: self.n_rows(),
            columns: self.n_columns(),
            column_summaries,
        }
    }

    /// Fixed-width text rendering of the first `n` rows, embedded in prompts
    pub fn preview_text(&self, n: usize) -> String {
        let shown = &self.rows[..self.rows.len().min(n)];
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.len()).collect();
        for row in shown {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.len());
            }
        }

        let mut out = String::new();
        let header = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(header.trim_end());
        for row in shown {
            out.push('\n');
            let line = row
                .iter()
                .enumerate()
                .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
                .collect::<Vec<_>>()
                .join("  ");
            out.push_str(line.trim_end());
        }
        out
    }

    /// Example questions derived from the leading columns
    pub fn suggestions(&self) -> Vec<String> {
        let cols = &self.columns;
        let mut out = vec![format!("What is the mean of {}?", cols[0])];
        out.push(format!(
            "Plot a histogram of {}.",
            cols.get(1).unwrap_or(&cols[0])
        ));
        out.push("Group by category and sum sales.".to_string());
        out
    }
}

fn is_missing(cell: &str) -> bool {
    let trimmed = cell.trim();
    MISSING_TOKENS
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
}

/// Parse an uploaded file into a Dataset. The byte cap is enforced before any
/// parsing; failures are classified and leave no partial state behind.
pub fn load_dataset(filename: &str, bytes: &[u8], max_bytes: usize) -> Result<Dataset> {
    if bytes.len() > max_bytes {
        return Err(TableTalkError::UploadTooLarge {
            size: bytes.len(),
            max: max_bytes,
        });
    }

    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => load_csv(bytes),
        "xlsx" => load_xlsx(bytes),
        _ => Err(TableTalkError::UnsupportedExtension(extension)),
    }
}

fn load_csv(bytes: &[u8]) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| TableTalkError::MalformedUpload {
            format: "CSV".to_string(),
            detail: e.to_string(),
        })?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| TableTalkError::MalformedUpload {
            format: "CSV".to_string(),
            detail: e.to_string(),
        })?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    Dataset::new(columns, rows)
}

fn load_xlsx(bytes: &[u8]) -> Result<Dataset> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes.to_vec())).map_err(|e| TableTalkError::MalformedUpload {
            format: "XLSX".to_string(),
            detail: e.to_string(),
        })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| TableTalkError::MalformedUpload {
            format: "XLSX".to_string(),
            detail: "workbook has no sheets".to_string(),
        })?
        .map_err(|e| TableTalkError::MalformedUpload {
            format: "XLSX".to_string(),
            detail: e.to_string(),
        })?;

    let mut row_iter = range.rows();
    let columns: Vec<String> = row_iter
        .next()
        .ok_or_else(|| TableTalkError::MalformedUpload {
            format: "XLSX".to_string(),
            detail: "sheet is empty".to_string(),
        })?
        .iter()
        .map(format_cell)
        .collect();

    let n_columns = columns.len();
    let rows: Vec<Vec<String>> = row_iter
        .map(|row| {
            let mut cells: Vec<String> = row.iter().map(format_cell).collect();
            cells.resize(n_columns, String::new());
            cells
        })
        .collect();

    Dataset::new(columns, rows)
}

fn format_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        // Spreadsheets store whole numbers as floats; render them without the
        // trailing ".0" so type inference sees integers.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
