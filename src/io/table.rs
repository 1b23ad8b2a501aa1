//! Already-parsed tabular input: a header row plus string cells.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::AnalysisError;

/// An uploaded CSV held as raw strings.
///
/// Column names are trimmed but otherwise kept verbatim; type coercion is
/// left to the normalizer so that bad cells can be counted and dropped
/// rather than failing the whole upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Builds a table from column names and rows.
    ///
    /// Rows shorter than the header are padded with empty cells; extra
    /// cells are discarded.
    pub fn new<S: Into<String>>(columns: Vec<S>, rows: Vec<Vec<String>>) -> Self {
        let columns: Vec<String> = columns
            .into_iter()
            .map(|c| c.into().trim().to_string())
            .collect();
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Parses CSV text with a header row from any reader.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Csv`] if the payload is not valid CSV.
    pub fn from_reader(reader: impl Read) -> Result<Self, AnalysisError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self::new(columns, rows))
    }

    /// Parses a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Io`] if the file cannot be opened, or
    /// [`AnalysisError::Csv`] if it is not valid CSV.
    pub fn from_path(path: &Path) -> Result<Self, AnalysisError> {
        let file = File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Column names in file order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Index of the named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns `true` if the named column is present.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Names from `required` that are absent, in `required` order.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| name.to_string())
            .collect()
    }

    /// All data rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
