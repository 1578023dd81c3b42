//! Row-labelled CSV tables.
//!
//! Optimization results are stored transposed: the first column holds
//! metric names, the header row holds scenario labels, and each cell is
//! one metric for one scenario.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::DssError;

/// A CSV table addressed by `(row label, column label)`.
#[derive(Debug, Clone, Default)]
pub struct TransposedTable {
    columns: Vec<String>,
    column_index: HashMap<String, usize>,
    row_index: HashMap<String, usize>,
    cells: Vec<Vec<String>>,
}

impl TransposedTable {
    /// Reads a table from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`DssError::MissingFile`] if the file does not exist, or a
    /// [`DssError::Csv`] if it cannot be parsed.
    pub fn from_path(path: &Path) -> Result<Self, DssError> {
        if !path.is_file() {
            return Err(DssError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Reads a table from CSV text whose first column holds row labels.
    ///
    /// Duplicate labels keep their first occurrence. Short rows are padded
    /// with empty cells.
    ///
    /// # Errors
    ///
    /// Returns a [`DssError::Csv`] if the input is not valid CSV.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DssError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = rdr
            .headers()?
            .iter()
            .skip(1)
            .map(|h| h.trim().to_string())
            .collect();

        let mut column_index = HashMap::new();
        for (i, name) in columns.iter().enumerate() {
            column_index.entry(name.clone()).or_insert(i);
        }

        let mut row_index = HashMap::new();
        let mut cells = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let mut fields = record.iter();
            let Some(label) = fields.next() else {
                continue;
            };
            let mut row: Vec<String> = fields.map(|f| f.trim().to_string()).collect();
            row.resize(columns.len(), String::new());

            row_index.entry(label.trim().to_string()).or_insert(cells.len());
            cells.push(row);
        }

        Ok(Self {
            columns,
            column_index,
            row_index,
            cells,
        })
    }

    /// Column labels in file order, excluding the row-label column.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether a row with this label exists.
    #[must_use]
    pub fn has_row(&self, row: &str) -> bool {
        self.row_index.contains_key(row)
    }

    /// Raw cell text; `None` when the row or column is absent.
    #[must_use]
    pub fn cell(&self, row: &str, column: &str) -> Option<&str> {
        let r = *self.row_index.get(row)?;
        let c = *self.column_index.get(column)?;
        self.cells.get(r)?.get(c).map(String::as_str)
    }

    /// Cell parsed as a finite number.
    #[must_use]
    pub fn number(&self, row: &str, column: &str) -> Option<f64> {
        self.cell(row, column)?
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
,existing,p=25%,p=50%
|I|,,5000,5000
Primary coverage,2500,3250.0,3600
Customer Avg dist to fac,9438.2,6500,nan
";

    #[test]
    fn addresses_cells_by_labels() {
        let table = TransposedTable::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.columns(), ["existing", "p=25%", "p=50%"]);
        assert_eq!(table.cell("|I|", "p=25%"), Some("5000"));
        assert_eq!(table.cell("|I|", "existing"), Some(""));
        assert_eq!(table.number("Primary coverage", "p=25%"), Some(3250.0));
        assert!(table.has_row("Customer Avg dist to fac"));
        assert!(!table.has_row("Customer Max dist to fac"));
    }

    #[test]
    fn non_numeric_and_missing_cells_are_none() {
        let table = TransposedTable::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.number("Customer Avg dist to fac", "p=50%"), None);
        assert_eq!(table.number("|I|", "existing"), None);
        assert_eq!(table.number("Primary coverage", "p=75%"), None);
    }

    #[test]
    fn missing_file_is_reported() {
        let path = std::env::temp_dir().join("school_share_no_such_table.csv");
        assert!(matches!(
            TransposedTable::from_path(&path),
            Err(DssError::MissingFile { .. })
        ));
    }
}
