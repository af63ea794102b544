use glam::DVec3;
use kryst::matrix::sparse::CsrMatrix;
use nalgebra::DVector;

use crate::discretization::mesh::Mesh;
use crate::numerics::operator::{check_dims, OperatorError};

/// Enforce Dirichlet values on the listed point indices by row modification.
///
/// Each listed row of `a` is overwritten with the identity row and the
/// matching right-hand-side entry is set to the boundary-value function
/// evaluated at the point's coordinates and `t`. Every index is handled
/// independently; an out-of-range index or a shape mismatch aborts before
/// any row is touched.
pub fn impose_dirichlet(
    mesh: &Mesh,
    a: &mut CsrMatrix<f64>,
    b: &mut DVector<f64>,
    g: impl Fn(DVec3, f64) -> f64,
    indices: &[usize],
    t: f64,
) -> Result<(), OperatorError> {
    let n = mesh.num_points();
    check_dims(a, n)?;
    if b.len() != n {
        return Err(OperatorError::ShapeMismatch {
            len: b.len(),
            expected: n,
        });
    }
    if let Some(&bad) = indices.iter().find(|&&idx| idx >= n) {
        return Err(OperatorError::IndexOutOfRange {
            index: bad,
            size: n,
        });
    }

    for &idx in indices {
        let start = a.row_ptr()[idx];
        let end = a.row_ptr()[idx + 1];
        let diag = (start..end)
            .position(|pos| a.col_idx()[pos] == idx)
            .ok_or(OperatorError::MissingEntry { row: idx, col: idx })?;

        let vals = a.row_values_mut(idx);
        vals.fill(0.0);
        vals[diag] = 1.0;

        b[idx] = g(mesh.point(idx).coords(), t);
    }

    Ok(())
}
