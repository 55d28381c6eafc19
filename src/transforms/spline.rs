//! Cubic smoothing splines.
//!
//! The fit minimizes `Σ (yᵢ - g(xᵢ))² + λ ∫ g''(x)² dx` over natural cubic
//! splines with knots at the data points (Reinsch's formulation). Writing the
//! second derivatives at the interior knots as `γ`, the penalized problem
//! reduces to the symmetric pentadiagonal system
//!
//! ```text
//! (R + λ QᵀQ) γ = Qᵀ y,    g = y - λ Q γ
//! ```
//!
//! where `Q` is the `n × (n-2)` second-difference matrix and `R` the
//! `(n-2) × (n-2)` tridiagonal Gram matrix of the knot spacings.
//!
//! Rather than exposing `λ`, callers give a smoothing budget `s` on the
//! residual sum of squares. The residual grows monotonically with `λ`, from
//! zero (interpolation) to the residual of the least-squares line, so `λ` is
//! found by bisection on `log10 λ` until the residual matches `s`.

use super::grouping::{group_rows, sort_by_time};
use super::TransformError;
use crate::schema;
use crate::table::{CellValue, TidyTable};

/// Relative tolerance on the residual when searching for `λ`
const RSS_TOLERANCE: f64 = 1e-6;
const MAX_BRACKET_STEPS: usize = 300;
const MAX_BISECTION_STEPS: usize = 200;

/// Penalized system in banded form, built once per series
struct ReinschSystem {
    /// Diagonal of `R`
    r_diag: Vec<f64>,
    /// First off-diagonal of `R`
    r_off: Vec<f64>,
    /// Column `c` of `Q` has entries (a, b, d) on rows c, c+1, c+2
    q: Vec<(f64, f64, f64)>,
    /// `QᵀQ` bands: diagonal, first and second off-diagonals
    qtq: (Vec<f64>, Vec<f64>, Vec<f64>),
    /// `Qᵀ y`
    qty: Vec<f64>,
}

impl ReinschSystem {
    fn new(x: &[f64], y: &[f64]) -> Self {
        let n = x.len();
        let m = n - 2;
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

        let mut r_diag = vec![0.0; m];
        let mut r_off = vec![0.0; m.saturating_sub(1)];
        let mut q = Vec::with_capacity(m);
        for c in 0..m {
            r_diag[c] = (h[c] + h[c + 1]) / 3.0;
            if c + 1 < m {
                r_off[c] = h[c + 1] / 3.0;
            }
            q.push((1.0 / h[c], -1.0 / h[c] - 1.0 / h[c + 1], 1.0 / h[c + 1]));
        }

        let mut diag = vec![0.0; m];
        let mut off1 = vec![0.0; m.saturating_sub(1)];
        let mut off2 = vec![0.0; m.saturating_sub(2)];
        let mut qty = vec![0.0; m];
        for c in 0..m {
            let (a, b, d) = q[c];
            diag[c] = a * a + b * b + d * d;
            if c + 1 < m {
                let (a1, b1, _) = q[c + 1];
                off1[c] = b * a1 + d * b1;
            }
            if c + 2 < m {
                off2[c] = d * q[c + 2].0;
            }
            qty[c] = a * y[c] + b * y[c + 1] + d * y[c + 2];
        }

        Self {
            r_diag,
            r_off,
            q,
            qtq: (diag, off1, off2),
            qty,
        }
    }

    /// Fitted values at the knots for a given `λ`
    fn fit(&self, y: &[f64], lambda: f64) -> Vec<f64> {
        let m = self.qty.len();
        let (qd, q1, q2) = &self.qtq;

        let diag: Vec<f64> = (0..m).map(|i| self.r_diag[i] + lambda * qd[i]).collect();
        let off1: Vec<f64> = (0..q1.len()).map(|i| self.r_off[i] + lambda * q1[i]).collect();
        let off2: Vec<f64> = q2.iter().map(|v| lambda * v).collect();

        let gamma = solve_pentadiagonal(&diag, &off1, &off2, &self.qty);

        let mut fitted = y.to_vec();
        for (c, (a, b, d)) in self.q.iter().enumerate() {
            fitted[c] -= lambda * a * gamma[c];
            fitted[c + 1] -= lambda * b * gamma[c];
            fitted[c + 2] -= lambda * d * gamma[c];
        }
        fitted
    }
}

/// Solve a symmetric positive-definite pentadiagonal system by `LDLᵀ`.
///
/// `diag` has length m, `off1` m-1 and `off2` m-2.
fn solve_pentadiagonal(diag: &[f64], off1: &[f64], off2: &[f64], rhs: &[f64]) -> Vec<f64> {
    let m = diag.len();
    let mut d = vec![0.0; m];
    let mut l1 = vec![0.0; m];
    let mut l2 = vec![0.0; m];

    for i in 0..m {
        let mut di = diag[i];
        if i >= 1 {
            di -= l1[i - 1] * l1[i - 1] * d[i - 1];
        }
        if i >= 2 {
            di -= l2[i - 2] * l2[i - 2] * d[i - 2];
        }
        d[i] = di;

        if i + 1 < m {
            let mut v = off1[i];
            if i >= 1 {
                v -= l2[i - 1] * l1[i - 1] * d[i - 1];
            }
            l1[i] = v / di;
        }
        if i + 2 < m {
            l2[i] = off2[i] / di;
        }
    }

    let mut z = vec![0.0; m];
    for i in 0..m {
        let mut v = rhs[i];
        if i >= 1 {
            v -= l1[i - 1] * z[i - 1];
        }
        if i >= 2 {
            v -= l2[i - 2] * z[i - 2];
        }
        z[i] = v;
    }

    let mut x = vec![0.0; m];
    for i in (0..m).rev() {
        let mut v = z[i] / d[i];
        if i + 1 < m {
            v -= l1[i] * x[i + 1];
        }
        if i + 2 < m {
            v -= l2[i] * x[i + 2];
        }
        x[i] = v;
    }
    x
}

fn residual(y: &[f64], fitted: &[f64]) -> f64 {
    y.iter().zip(fitted).map(|(a, b)| (a - b) * (a - b)).sum()
}

/// Least-squares straight line through the points, evaluated at `x`
fn linear_fit(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let sxx: f64 = x.iter().map(|v| (v - mx) * (v - mx)).sum();
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    x.iter().map(|v| my + slope * (v - mx)).collect()
}

/// Smoothing spline values at the data points.
///
/// `x` must be strictly increasing. `smoothing` bounds the residual sum of
/// squares and defaults to the number of points; 0 interpolates. With fewer
/// than three points the data are returned unchanged.
pub fn smoothing_spline(x: &[f64], y: &[f64], smoothing: Option<f64>) -> Vec<f64> {
    let n = x.len();
    if n < 3 || y.len() != n {
        return y.to_vec();
    }
    let s = smoothing.unwrap_or(n as f64);
    if s <= 0.0 || y.iter().any(|v| !v.is_finite()) {
        return y.to_vec();
    }

    let line = linear_fit(x, y);
    if residual(y, &line) <= s {
        return line;
    }

    let system = ReinschSystem::new(x, y);
    let rss_at = |log_lambda: f64| residual(y, &system.fit(y, 10f64.powf(log_lambda)));

    // Bracket the target residual in log10 λ
    let mut lo = 0.0;
    let mut hi = 0.0;
    if rss_at(0.0) < s {
        for _ in 0..MAX_BRACKET_STEPS {
            hi += 1.0;
            if rss_at(hi) >= s {
                break;
            }
            lo = hi;
        }
    } else {
        for _ in 0..MAX_BRACKET_STEPS {
            lo -= 1.0;
            if rss_at(lo) <= s {
                break;
            }
            hi = lo;
        }
    }

    let mut mid = 0.5 * (lo + hi);
    for _ in 0..MAX_BISECTION_STEPS {
        mid = 0.5 * (lo + hi);
        let rss = rss_at(mid);
        if (rss - s).abs() <= RSS_TOLERANCE * s {
            break;
        }
        if rss < s {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    system.fit(y, 10f64.powf(mid))
}

/// Append a `spline fit` column: a smoothing spline of `column` against
/// `Time (sec)`, fitted per series.
///
/// Rows come back sorted by series and then by time.
pub fn spline_fit(
    table: &TidyTable,
    column: &str,
    smoothing: Option<f64>,
    extra_group_cols: &[String],
) -> Result<TidyTable, TransformError> {
    if !table.has_column(column) {
        return Err(TransformError::UnknownColumn(column.to_string()));
    }
    let groups = group_rows(table, extra_group_cols)?;

    let mut result = TidyTable::new(table.extra_columns().to_vec());
    result.add_column(schema::SPLINE_FIT);

    for (_, mut rows) in groups {
        sort_by_time(&mut rows)?;

        let x: Vec<f64> = rows.iter().map(|r| r.time_sec).collect();
        let y = rows
            .iter()
            .map(|r| {
                r.numeric(column).ok_or_else(|| TransformError::NonNumericColumn {
                    column: column.to_string(),
                    well: r.well.clone(),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let fitted = smoothing_spline(&x, &y, smoothing);
        for (row, value) in rows.into_iter().zip(fitted) {
            let mut out = row.clone();
            out.extra.insert(schema::SPLINE_FIT.to_string(), CellValue::Number(value));
            result.push(out);
        }
    }

    log::debug!("Fitted smoothing splines to {} rows", result.len());
    Ok(result)
}
