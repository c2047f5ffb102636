//! LaneChangeDataset - GMM training rows
//!
//! Comma-delimited numeric table, one row per observed lane change,
//! columns `V, H, DL, DF, dt`, no header. Values are written in
//! scientific notation with 18 fractional digits and a signed, two-digit
//! minimum exponent (`9.000000000000000000e+00`).

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use contracts::ContractError;

use crate::fs::write_atomic;

/// Column names, in file order
pub const DATASET_COLUMNS: [&str; 5] = ["V", "H", "DL", "DF", "dt"];

/// One lane-change observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetRow {
    /// Ego longitudinal speed at lane-change start (m/s)
    pub speed: f64,
    /// Lateral displacement (m)
    pub lateral_displacement: f64,
    /// Gap to the leading vehicle in the target lane (m)
    pub leading_gap: f64,
    /// Gap to the following vehicle in the target lane (m)
    pub following_gap: f64,
    /// Lane-change duration (s)
    pub duration: f64,
}

impl DatasetRow {
    pub fn to_array(&self) -> [f64; 5] {
        [
            self.speed,
            self.lateral_displacement,
            self.leading_gap,
            self.following_gap,
            self.duration,
        ]
    }

    pub fn from_array(values: [f64; 5]) -> Self {
        Self {
            speed: values[0],
            lateral_displacement: values[1],
            leading_gap: values[2],
            following_gap: values[3],
            duration: values[4],
        }
    }

    fn to_line(self) -> String {
        self.to_array()
            .iter()
            .map(|v| format_scientific(*v))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// `{:.18e}` with the exponent padded to `e+NN` / `e-NN`
fn format_scientific(value: f64) -> String {
    let formatted = format!("{value:.18e}");
    match formatted.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => formatted,
    }
}

/// Append-only dataset file
#[derive(Debug, Clone)]
pub struct LaneChangeDataset {
    path: PathBuf,
}

impl LaneChangeDataset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all rows; a missing file is an empty dataset
    ///
    /// A file holding a single row is read as one 5-column row.
    pub fn read_rows(&self) -> Result<Vec<DatasetRow>, ContractError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        self.parse(&content)
    }

    /// Append a row, rewriting the file atomically
    ///
    /// Returns the row count after the append.
    #[instrument(name = "dataset_append", skip(self), fields(path = %self.path.display()))]
    pub fn append(&self, row: DatasetRow) -> Result<usize, ContractError> {
        let mut rows = self.read_rows()?;
        rows.push(row);

        let mut content = String::new();
        for r in &rows {
            content.push_str(&r.to_line());
            content.push('\n');
        }
        write_atomic(&self.path, content.as_bytes())?;

        debug!(rows = rows.len(), "Dataset row appended");
        Ok(rows.len())
    }

    fn parse(&self, content: &str) -> Result<Vec<DatasetRow>, ContractError> {
        let mut rows = Vec::new();
        for (idx, raw) in content.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let values = line
                .split(',')
                .map(|field| field.trim().parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ContractError::dataset_malformed(&self.path, idx + 1, e.to_string()))?;

            let values: [f64; 5] = values.as_slice().try_into().map_err(|_| {
                ContractError::dataset_malformed(
                    &self.path,
                    idx + 1,
                    format!(
                        "expected {} columns, found {}",
                        DATASET_COLUMNS.len(),
                        values.len()
                    ),
                )
            })?;
            rows.push(DatasetRow::from_array(values));
        }
        Ok(rows)
    }
}
