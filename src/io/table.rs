//! Expression table loading
//!
//! Tables are delimited text: a header row of column names, one row per sample,
//! and a leading row-identifier column that is never analysed.

use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use ndarray::Array2;

use crate::error::{DiffExprError, Result};

/// Metadata column that is never treated as a gene.
pub const CELL_TYPE_COLUMN: &str = "Cell_type";

/// Cell contents read as a missing observation.
const MISSING_TOKENS: [&str; 8] = ["", "NA", "NaN", "nan", "-nan", "N/A", "NULL", "null"];

/// One group's expression table, kept as raw text until genes are selected.
#[derive(Debug, Clone)]
pub struct ExpressionTable {
    source: PathBuf,
    row_ids: Vec<String>,
    columns: Vec<String>,
    column_index: HashMap<String, usize>,
    cells: Vec<Vec<String>>,
}

impl ExpressionTable {
    /// Read a table from a CSV or TSV file.
    ///
    /// The delimiter is a tab for `.tsv`/`.tab` files, or when the header line
    /// contains tabs but no commas; a comma otherwise.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| DiffExprError::DataLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let delimiter = detect_delimiter(path, &text);
        let table = Self::from_reader(text.as_bytes(), delimiter, path)?;
        info!(
            "Loaded {} samples x {} columns from {}",
            table.n_rows(),
            table.n_columns(),
            path.display()
        );
        Ok(table)
    }

    /// Parse a table from any reader. `source` names the table in errors.
    pub fn from_reader<R: Read, P: AsRef<Path>>(reader: R, delimiter: u8, source: P) -> Result<Self> {
        let source = source.as_ref().to_path_buf();
        let load_error = |reason: String| DiffExprError::DataLoad {
            path: source.clone(),
            reason,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(reader);

        let header = reader.headers().map_err(|e| load_error(e.to_string()))?.clone();
        if header.is_empty() {
            return Err(load_error("no header row".to_string()));
        }

        // First header cell labels the row identifiers
        let columns: Vec<String> = header.iter().skip(1).map(str::to_string).collect();
        let mut column_index = HashMap::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            if column_index.contains_key(name) {
                warn!(
                    "Duplicate column '{}' in {}, using its first occurrence",
                    name,
                    source.display()
                );
                continue;
            }
            column_index.insert(name.clone(), idx);
        }

        let mut row_ids = Vec::new();
        let mut cells = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| load_error(e.to_string()))?;
            let mut fields = record.iter();
            row_ids.push(fields.next().unwrap_or_default().to_string());
            cells.push(fields.map(str::to_string).collect::<Vec<_>>());
        }

        debug!(
            "Parsed {} rows from {} with delimiter {:?}",
            row_ids.len(),
            source.display(),
            delimiter as char
        );

        Ok(ExpressionTable {
            source,
            row_ids,
            columns,
            column_index,
            cells,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Number of samples (data rows)
    pub fn n_rows(&self) -> usize {
        self.row_ids.len()
    }

    /// Number of columns, not counting the row-identifier column
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_ids.is_empty() || self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_ids(&self) -> &[String] {
        &self.row_ids
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index.contains_key(name)
    }

    /// Numeric values of `genes` as a samples × genes matrix.
    ///
    /// Missing cells become NaN. Any other non-numeric cell, or a gene column
    /// without a single numeric observation, is a [`DiffExprError::Numeric`].
    pub fn gene_matrix(&self, genes: &[String]) -> Result<Array2<f64>> {
        let table = self.source.display().to_string();
        let numeric_error = |gene: &str, reason: String| DiffExprError::Numeric {
            gene: gene.to_string(),
            table: table.clone(),
            reason,
        };

        let col_indices = genes
            .iter()
            .map(|gene| {
                self.column_index
                    .get(gene)
                    .copied()
                    .ok_or_else(|| numeric_error(gene, "column not present".to_string()))
            })
            .collect::<Result<Vec<usize>>>()?;

        let mut data = Vec::with_capacity(self.n_rows() * genes.len());
        for (row_id, row) in self.row_ids.iter().zip(&self.cells) {
            for (gene, &col) in genes.iter().zip(&col_indices) {
                let value = parse_cell(&row[col])
                    .map_err(|reason| numeric_error(gene, format!("row '{row_id}': {reason}")))?;
                data.push(value);
            }
        }

        let matrix = Array2::from_shape_vec((self.n_rows(), genes.len()), data)
            .map_err(|e| numeric_error("*", e.to_string()))?;

        for (gene, column) in genes.iter().zip(matrix.columns()) {
            if column.iter().all(|v| v.is_nan()) {
                return Err(numeric_error(gene, "no numeric observations".to_string()));
            }
        }

        Ok(matrix)
    }
}

/// Sorted genes present in both tables, without the cell type column.
///
/// Empty when either table has no samples or no columns.
pub fn common_genes(first: &ExpressionTable, second: &ExpressionTable) -> Vec<String> {
    for table in [first, second] {
        if table.is_empty() {
            warn!("{} holds no data, no genes to compare", table.source().display());
            return Vec::new();
        }
    }

    let genes: BTreeSet<&str> = first
        .columns()
        .iter()
        .map(String::as_str)
        .filter(|name| *name != CELL_TYPE_COLUMN && second.has_column(name))
        .collect();

    if genes.is_empty() {
        warn!("The expression tables share no gene columns");
    }
    genes.into_iter().map(str::to_string).collect()
}

fn parse_cell(raw: &str) -> std::result::Result<f64, String> {
    let cell = raw.trim();
    if MISSING_TOKENS.contains(&cell) {
        return Ok(f64::NAN);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(format!("non-finite value '{cell}'")),
        Err(_) => Err(format!("non-numeric value '{cell}'")),
    }
}

fn detect_delimiter(path: &Path, text: &str) -> u8 {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext == "tsv" || ext == "tab" {
        return b'\t';
    }
    let header = text.lines().next().unwrap_or("");
    if header.contains('\t') && !header.contains(',') {
        b'\t'
    } else {
        b','
    }
}
