use std::cmp::Ordering;

use crate::data::model::{DHI, DNI, GHI, NumericColumn, RH, SolarTable, TAMB, WS};

/// Columns considered for the correlation heatmap, in display order.
pub const CORRELATION_COLUMNS: [&str; 6] = [GHI, DNI, DHI, TAMB, RH, WS];

/// Symmetric matrix of Pearson coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `values[i][j]` pairs `columns[i]` with `columns[j]`.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.values[self.index_of(a)?][self.index_of(b)?])
    }

    /// Coefficients of every other column with `column`, strongest positive
    /// first; undefined (NaN) coefficients sort last.
    pub fn correlations_with(&self, column: &str) -> Option<Vec<(String, f64)>> {
        let i = self.index_of(column)?;
        let mut out: Vec<(String, f64)> = self
            .columns
            .iter()
            .zip(&self.values[i])
            .filter(|(name, _)| name.as_str() != column)
            .map(|(name, &r)| (name.clone(), r))
            .collect();
        out.sort_by(|a, b| match (a.1.is_nan(), b.1.is_nan()) {
            (false, false) => b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal),
            (x, y) => x.cmp(&y),
        });
        Some(out)
    }
}

/// Pearson correlation over rows where both values are present. NaN when
/// fewer than two such rows exist or either side has zero variance.
pub fn pearson(a: &NumericColumn, b: &NumericColumn) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .values
        .iter()
        .zip(&b.values)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for &(x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Correlation matrix of the `candidates` present in the table, in candidate
/// order. `None` when fewer than two candidates are present.
///
/// The diagonal is exactly 1.0 and each coefficient is computed once and
/// mirrored, so the matrix is symmetric bit for bit.
pub fn correlation_matrix(table: &SolarTable, candidates: &[&str]) -> Option<CorrelationMatrix> {
    let present: Vec<&NumericColumn> = candidates
        .iter()
        .filter_map(|&name| table.column(name))
        .collect();
    if present.len() < 2 {
        return None;
    }

    let n = present.len();
    let mut values = vec![vec![1.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let r = pearson(present[i], present[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Some(CorrelationMatrix {
        columns: present.iter().map(|c| c.name.clone()).collect(),
        values,
    })
}
