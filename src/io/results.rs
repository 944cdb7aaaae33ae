//! Result table output

use std::path::Path;

use log::info;

use super::format_float;
use crate::error::Result;
use crate::testing::DiffExprResults;

/// Header of the written table. Columns for analyses that were not requested
/// are left out.
pub fn result_columns(results: &DiffExprResults) -> Vec<String> {
    let mut columns = vec![
        "gene_name".to_string(),
        "first_cell_type_expression_means".to_string(),
        "second_cell_type_expressions_means".to_string(),
        "mean_difference".to_string(),
    ];
    if results.ci_significant.is_some() {
        columns.push("ci_test_results".to_string());
    }
    columns.push("z_test_p_values".to_string());
    if let Some(adjusted) = &results.adjusted_p_values {
        columns.push(adjusted.column_name());
    }
    columns.push("test_outcome".to_string());
    columns
}

/// Write one row per gene, header included, no index column.
pub fn write_results<P: AsRef<Path>>(results: &DiffExprResults, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(result_columns(results))?;

    for i in 0..results.len() {
        let mut row = vec![
            results.gene_names[i].clone(),
            format_float(results.first_means[i]),
            format_float(results.second_means[i]),
            format_float(results.mean_differences[i]),
        ];
        if let Some(ci) = &results.ci_significant {
            row.push(format_bool(ci[i]));
        }
        row.push(format_float(results.p_values[i]));
        if let Some(adjusted) = &results.adjusted_p_values {
            row.push(format_float(adjusted.values[i]));
        }
        row.push(format_bool(results.outcome[i]));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    info!("Wrote {} genes to {}", results.len(), path.display());
    Ok(())
}

fn format_bool(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::correction::CorrectionMethod;
    use crate::testing::AdjustedPValues;

    fn base_results() -> DiffExprResults {
        DiffExprResults {
            gene_names: vec!["A".into(), "B".into()],
            first_means: vec![1.0, 2.0],
            second_means: vec![1.5, 2.0],
            mean_differences: vec![0.5, 0.0],
            ci_significant: None,
            p_values: vec![0.01, 1.0],
            adjusted_p_values: None,
            outcome: vec![true, false],
        }
    }

    #[test]
    fn test_columns_without_optional_analyses() {
        let columns = result_columns(&base_results());
        assert_eq!(
            columns,
            vec![
                "gene_name",
                "first_cell_type_expression_means",
                "second_cell_type_expressions_means",
                "mean_difference",
                "z_test_p_values",
                "test_outcome",
            ]
        );
    }

    #[test]
    fn test_columns_with_optional_analyses() {
        let mut results = base_results();
        results.ci_significant = Some(vec![true, false]);
        results.adjusted_p_values = Some(AdjustedPValues {
            method: CorrectionMethod::Holm,
            alpha: 0.1,
            values: vec![0.02, 1.0],
        });
        let columns = result_columns(&results);
        assert_eq!(columns[4], "ci_test_results");
        assert_eq!(columns[6], "p_values_adjusted_method_holm_alpha_0.1");
        assert_eq!(columns.len(), 8);
    }

    #[test]
    fn test_write_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut results = base_results();
        results.ci_significant = Some(vec![true, false]);
        write_results(&results, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "A,1.0,1.5,0.5,True,0.01,True");
        assert_eq!(lines[2], "B,2.0,2.0,0.0,False,1.0,False");
    }
}
