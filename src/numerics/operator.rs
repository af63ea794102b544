use kryst::matrix::sparse::CsrMatrix;
use nalgebra::DVector;
use thiserror::Error;

use crate::discretization::mesh::{Axis, Location, Mesh, Neighbor, Side};

#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("point {index} has no neighbors along {axis:?}: mesh not built or dimension mismatch")]
    MissingNeighbor { index: usize, axis: Axis },
    #[error("vector length {len} does not match operator dimension {expected}")]
    ShapeMismatch { len: usize, expected: usize },
    #[error("matrix row {row} has no coefficient slot for column {col}")]
    MissingEntry { row: usize, col: usize },
    #[error("point index {index} out of range for {size} points")]
    IndexOutOfRange { index: usize, size: usize },
}

/// Truncation order requested from the [`gradient`] assembler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    First,
    Second,
}

/// Second-difference weights `(w_minus, w_center, w_plus)` through three
/// points at spacings `d_m` and `d_p`, from the quadratic interpolant. For
/// `d_m == d_p == h` this is the standard `1/h²` central stencil; with an
/// inserted border point on one side it is the irregular-spacing correction
/// that keeps the truncation error second order.
#[inline]
fn second_difference(d_m: f64, d_p: f64) -> (f64, f64, f64) {
    (
        2.0 / (d_m * (d_m + d_p)),
        -2.0 / (d_m * d_p),
        2.0 / (d_p * (d_m + d_p)),
    )
}

/// First-derivative weights `(w_minus, w_center, w_plus)` from the same
/// quadratic interpolant.
#[inline]
fn first_derivative(d_m: f64, d_p: f64) -> (f64, f64, f64) {
    (
        -d_p / (d_m * (d_m + d_p)),
        (d_p - d_m) / (d_m * d_p),
        d_m / (d_p * (d_m + d_p)),
    )
}

fn axis_pair<'a>(
    mesh: &'a Mesh,
    index: usize,
    axis: Axis,
) -> Result<(&'a Neighbor, &'a Neighbor), OperatorError> {
    let point = mesh.point(index);
    let minus = point.neighbor(axis, Side::Minus);
    let plus = point.neighbor(axis, Side::Plus);
    match (minus, plus) {
        (Some(m), Some(p)) => Ok((m, p)),
        _ => Err(OperatorError::MissingNeighbor { index, axis }),
    }
}

/// Append a row to a CSR triplet, sorting columns and merging duplicates
/// (a two-point axis aliases its wrap link onto the regular neighbor).
fn push_row(
    row: &mut Vec<(usize, f64)>,
    indices: &mut Vec<usize>,
    data: &mut Vec<f64>,
    indptr: &mut Vec<usize>,
) {
    row.sort_by_key(|e| e.0);
    for &(col, val) in row.iter() {
        if indices.len() > *indptr.last().unwrap() && *indices.last().unwrap() == col {
            *data.last_mut().unwrap() += val;
        } else {
            indices.push(col);
            data.push(val);
        }
    }
    indptr.push(indices.len());
    row.clear();
}

/// Assemble the discrete Laplacian over the mesh, one sparse row per point.
///
/// Exterior and border points receive identity rows; border rows are
/// placeholders that the Dirichlet imposer overwrites. Interior points get
/// the three-point stencil per active axis, with the irregular-spacing
/// weights wherever a neighbor is an inserted border point. Wrap links are
/// included, so the operator is periodic until [`remove_periodicity`] strips
/// the closing couplings.
pub fn laplacian(mesh: &Mesh) -> Result<CsrMatrix<f64>, OperatorError> {
    let n = mesh.num_points();
    let mut indptr = Vec::with_capacity(n + 1);
    let mut indices = Vec::new();
    let mut data = Vec::new();
    indptr.push(0);

    let mut row: Vec<(usize, f64)> = Vec::with_capacity(7);
    for r in 0..n {
        let point = mesh.point(r);
        match point.location() {
            Location::Exterior | Location::Border => row.push((r, 1.0)),
            Location::Interior => {
                let mut diag = 0.0;
                for &axis in mesh.active_axes() {
                    let (m, p) = axis_pair(mesh, r, axis)?;
                    let (w_m, w_0, w_p) = second_difference(m.distance, p.distance);
                    row.push((m.index, w_m));
                    row.push((p.index, w_p));
                    diag += w_0;
                }
                row.push((r, diag));
            }
        }
        push_row(&mut row, &mut indices, &mut data, &mut indptr);
    }

    Ok(CsrMatrix::from_csr(n, n, indptr, indices, data))
}

/// Assemble the first-derivative operator along one axis.
///
/// At the requested `Order::Second` the centered three-point weights are used
/// wherever both side neighbors exist; with a single available neighbor the
/// stencil degrades to the one-sided two-point difference. `Order::First`
/// always uses the one-sided difference. Points with no neighbors on the
/// axis produce a zero row when they are not interior (inserted border points
/// only carry neighbors along their own axis); an interior point missing the
/// axis entirely is an assembly defect.
pub fn gradient(mesh: &Mesh, axis: Axis, order: Order) -> Result<CsrMatrix<f64>, OperatorError> {
    let n = mesh.num_points();
    let mut indptr = Vec::with_capacity(n + 1);
    let mut indices = Vec::new();
    let mut data = Vec::new();
    indptr.push(0);

    let mut row: Vec<(usize, f64)> = Vec::with_capacity(3);
    for r in 0..n {
        let point = mesh.point(r);
        let minus = point.neighbor(axis, Side::Minus);
        let plus = point.neighbor(axis, Side::Plus);
        match (minus, plus, point.location()) {
            (_, _, Location::Exterior) => row.push((r, 0.0)),
            (Some(m), Some(p), _) => match order {
                Order::Second => {
                    let (w_m, w_0, w_p) = first_derivative(m.distance, p.distance);
                    row.push((m.index, w_m));
                    row.push((r, w_0));
                    row.push((p.index, w_p));
                }
                Order::First => {
                    row.push((r, -1.0 / p.distance));
                    row.push((p.index, 1.0 / p.distance));
                }
            },
            (None, Some(p), _) => {
                row.push((r, -1.0 / p.distance));
                row.push((p.index, 1.0 / p.distance));
            }
            (Some(m), None, _) => {
                row.push((m.index, -1.0 / m.distance));
                row.push((r, 1.0 / m.distance));
            }
            (None, None, Location::Interior) => {
                return Err(OperatorError::MissingNeighbor { index: r, axis });
            }
            (None, None, _) => row.push((r, 0.0)),
        }
        push_row(&mut row, &mut indices, &mut data, &mut indptr);
    }

    Ok(CsrMatrix::from_csr(n, n, indptr, indices, data))
}

/// Fold a sampled coefficient field into an assembled Laplacian in place,
/// turning `Δ` into the variable-coefficient operator `∇·(β∇)`:
/// each interior row becomes `β_i · Δ + (∇β)_i · ∇`, with `∇β` differenced
/// from the sampled values over the same neighbor stencil. Only existing
/// coefficient slots are written; the gradient support is a subset of the
/// Laplacian's. Identity rows (exterior, border) are left untouched.
pub fn insert_beta(
    mesh: &Mesh,
    a: &mut CsrMatrix<f64>,
    beta: &DVector<f64>,
) -> Result<(), OperatorError> {
    let n = mesh.num_points();
    check_dims(a, n)?;
    if beta.len() != n {
        return Err(OperatorError::ShapeMismatch {
            len: beta.len(),
            expected: n,
        });
    }

    for r in 0..n {
        if mesh.point(r).location() != Location::Interior {
            continue;
        }

        let start = a.row_ptr()[r];
        let end = a.row_ptr()[r + 1];
        let cols: Vec<usize> = a.col_idx()[start..end].to_vec();
        let mut vals: Vec<f64> = a.values()[start..end]
            .iter()
            .map(|v| v * beta[r])
            .collect();

        let mut add = |col: usize, delta: f64| -> Result<(), OperatorError> {
            match cols.binary_search(&col) {
                Ok(pos) => {
                    vals[pos] += delta;
                    Ok(())
                }
                Err(_) => Err(OperatorError::MissingEntry { row: r, col }),
            }
        };

        for &axis in mesh.active_axes() {
            let (m, p) = axis_pair(mesh, r, axis)?;
            let (w_m, w_0, w_p) = first_derivative(m.distance, p.distance);
            let grad_beta = w_m * beta[m.index] + w_0 * beta[r] + w_p * beta[p.index];
            add(m.index, grad_beta * w_m)?;
            add(r, grad_beta * w_0)?;
            add(p.index, grad_beta * w_p)?;
        }

        a.row_values_mut(r).copy_from_slice(&vals);
    }

    Ok(())
}

/// Zero the wrap-link couplings (last point back to first per axis) so the
/// operator no longer closes the grid periodically. Rows without a slot for
/// the wrapped column (identity rows) are skipped.
pub fn remove_periodicity(mesh: &Mesh, a: &mut CsrMatrix<f64>) -> Result<(), OperatorError> {
    let n = mesh.num_points();
    check_dims(a, n)?;

    for r in 0..n {
        let wrapped: Vec<usize> = mesh
            .point(r)
            .neighbors()
            .iter()
            .filter(|nb| nb.wrap)
            .map(|nb| nb.index)
            .collect();
        if wrapped.is_empty() {
            continue;
        }
        let start = a.row_ptr()[r];
        let end = a.row_ptr()[r + 1];
        let positions: Vec<usize> = wrapped
            .iter()
            .filter_map(|col| {
                a.col_idx()[start..end]
                    .iter()
                    .position(|c| c == col)
            })
            .collect();
        let vals = a.row_values_mut(r);
        for pos in positions {
            vals[pos] = 0.0;
        }
    }

    Ok(())
}

/// Sparse matrix-vector product over the mesh index space.
pub fn apply(a: &CsrMatrix<f64>, x: &DVector<f64>) -> Result<DVector<f64>, OperatorError> {
    let n = a.row_ptr().len() - 1;
    if x.len() != n {
        return Err(OperatorError::ShapeMismatch {
            len: x.len(),
            expected: n,
        });
    }
    let mut y = DVector::zeros(n);
    for r in 0..n {
        let start = a.row_ptr()[r];
        let end = a.row_ptr()[r + 1];
        let mut sum = 0.0;
        for pos in start..end {
            sum += a.values()[pos] * x[a.col_idx()[pos]];
        }
        y[r] = sum;
    }
    Ok(y)
}

pub(crate) fn check_dims(a: &CsrMatrix<f64>, expected: usize) -> Result<(), OperatorError> {
    let n = a.row_ptr().len() - 1;
    if n != expected {
        return Err(OperatorError::ShapeMismatch {
            len: n,
            expected,
        });
    }
    Ok(())
}
