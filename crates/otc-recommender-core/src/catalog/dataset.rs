//! Historical OTC dataset reader.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::{CatalogError, CatalogResult};

/// Survey export header → internal column key.
pub const COLUMN_RENAMES: [(&str, &str); 12] = [
    ("Best OTC", "best_otc"),
    ("OTCSleep", "otc_sleep"),
    ("OTC Cause", "otc_cause"),
    ("OTC PainLocation", "otc_pain_location"),
    ("OTC PainTime", "otc_pain_time"),
    ("OTC CocomtSymptom", "otc_cocomt_symptom"),
    ("Gender", "gender"),
    ("Age", "age"),
    ("Height", "height"),
    ("Weight", "weight"),
    ("Ethnicity", "ethnicity"),
    ("Race", "race"),
];

/// Target label column.
pub const LABEL_COLUMN: &str = "best_otc";

/// Map a raw header to its internal key. Unknown headers pass through trimmed.
pub fn canonical_column(header: &str) -> String {
    let header = header.trim();
    COLUMN_RENAMES
        .iter()
        .find(|(display, key)| *display == header || *key == header)
        .map(|(_, key)| key.to_string())
        .unwrap_or_else(|| header.to_string())
}

/// Tabular dataset with named columns, read once at startup.
#[derive(Debug, Clone, Default)]
pub struct HistoricalDataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl HistoricalDataset {
    /// Read a CSV file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Read CSV from any reader. Headers are mapped with [`canonical_column`];
    /// cells are trimmed and short rows are padded with empty cells.
    pub fn from_reader<R: Read>(reader: R) -> CatalogResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(canonical_column)
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(columns.len(), String::new());
            rows.push(row);
        }

        tracing::debug!(columns = columns.len(), rows = rows.len(), "Read historical dataset");
        Ok(Self { columns, rows })
    }

    /// Internal column keys in file order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether a column is present.
    pub fn has_column(&self, key: &str) -> bool {
        self.columns.iter().any(|c| c == key)
    }

    /// Fail with `SchemaMismatch` naming every absent column.
    pub fn require_columns(&self, keys: &[&str]) -> CatalogResult<()> {
        let missing: Vec<String> = keys
            .iter()
            .filter(|k| !self.has_column(k))
            .map(|k| k.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::SchemaMismatch { missing })
        }
    }

    /// Cell values of one column, in row order.
    pub fn column(&self, key: &str) -> CatalogResult<impl Iterator<Item = &str> + '_> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == key)
            .ok_or_else(|| CatalogError::SchemaMismatch {
                missing: vec![key.to_string()],
            })?;
        Ok(self.rows.iter().map(move |row| row[idx].as_str()))
    }
}
