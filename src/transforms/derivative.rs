use super::grouping::group_rows;
use super::spline::spline_fit;
use super::TransformError;
use crate::schema;
use crate::table::{CellValue, TidyTable};

/// Numerical gradient with unit sample spacing.
///
/// Central differences inside, one-sided differences at both ends; a single
/// point has zero slope.
pub fn gradient(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n)
            .map(|i| {
                if i == 0 {
                    values[1] - values[0]
                } else if i == n - 1 {
                    values[n - 1] - values[n - 2]
                } else {
                    (values[i + 1] - values[i - 1]) / 2.0
                }
            })
            .collect(),
    }
}

/// Name of the derivative column for `column` in the given units
pub fn derivative_column_name(column: &str, units: &str) -> String {
    format!("{} ({}/sec)", column, units)
}

/// Fit splines, then append the gradient of each series' spline values.
///
/// The derivative column is named `"<column> (<units>/sec)"` after the units
/// of each series, so tables mixing units gain one column per unit and
/// rows of other units leave it empty.
pub fn smoothed_derivative(
    table: &TidyTable,
    column: &str,
    smoothing: Option<f64>,
    extra_group_cols: &[String],
) -> Result<TidyTable, TransformError> {
    let splined = spline_fit(table, column, smoothing, extra_group_cols)?;
    let groups = group_rows(&splined, extra_group_cols)?;

    let mut result = TidyTable::new(splined.extra_columns().to_vec());
    for (_, rows) in groups {
        let units = rows.first().map(|r| r.units.clone()).unwrap_or_default();
        let name = derivative_column_name(column, &units);
        result.add_column(&name);

        let fitted: Vec<f64> = rows
            .iter()
            .map(|r| r.numeric(schema::SPLINE_FIT).unwrap_or(f64::NAN))
            .collect();

        for (row, slope) in rows.into_iter().zip(gradient(&fitted)) {
            let mut out = row.clone();
            out.extra.insert(name.clone(), CellValue::Number(slope));
            result.push(out);
        }
    }

    Ok(result)
}
