//! Reading expression tables and writing result tables

mod results;
mod table;

pub use results::{result_columns, write_results};
pub use table::{common_genes, ExpressionTable, CELL_TYPE_COLUMN};

/// Shortest round-trip rendering of a float, switching to exponent notation
/// for very small and very large magnitudes. Missing values render empty.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{value:?}")
    }
}
