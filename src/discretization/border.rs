use nalgebra::DVector;

use crate::discretization::mesh::{Axis, Location, Mesh, MeshError};

/// Classify the mesh against a level-set sampled at its grid points and
/// insert border points at the zero crossings.
///
/// `phi` holds the signed-distance values, negative inside the embedded
/// domain. Grid points are classified `Interior`/`Exterior` by sign; a value
/// of exactly zero means the boundary coincides with the grid point, which is
/// reclassified `Border` without inserting anything. For every axis-adjacent
/// pair with a strict sign change, the zero crossing is located by linear
/// interpolation of the two level-set values and a new `Border` point is
/// spliced into both neighbor lists, replacing the direct grid link and
/// recording the non-uniform distances to each side.
///
/// Returns the indices of all border points for later Dirichlet imposition.
pub fn make_border_points(
    mesh: &mut Mesh,
    phi: &DVector<f64>,
) -> Result<Vec<usize>, MeshError> {
    let n_grid = mesh.num_grid_points();
    if phi.len() != n_grid {
        return Err(MeshError::ShapeMismatch {
            len: phi.len(),
            expected: n_grid,
        });
    }

    for idx in 0..n_grid {
        let location = if phi[idx] < 0.0 {
            Location::Interior
        } else if phi[idx] > 0.0 {
            Location::Exterior
        } else {
            Location::Border
        };
        mesh.set_location(idx, location);
    }

    let (nx, ny, nz) = (mesh.nx(), mesh.ny(), mesh.nz());
    for &axis in mesh.active_axes() {
        let (ni, nj, nk) = match axis {
            Axis::X => (nx - 1, ny, nz),
            Axis::Y => (nx, ny - 1, nz),
            Axis::Z => (nx, ny, nz - 1),
        };
        for k in 0..nk {
            for j in 0..nj {
                for i in 0..ni {
                    let p = mesh.index(i, j, k);
                    let q = match axis {
                        Axis::X => mesh.index(i + 1, j, k),
                        Axis::Y => mesh.index(i, j + 1, k),
                        Axis::Z => mesh.index(i, j, k + 1),
                    };
                    if phi[p] * phi[q] < 0.0 {
                        // Linear interpolation of the level-set locates the
                        // crossing to second order in the grid spacing.
                        let theta = phi[p] / (phi[p] - phi[q]);
                        let h = mesh.point(q).coords() - mesh.point(p).coords();
                        let coords = mesh.point(p).coords() + theta * h;
                        mesh.splice_border_point(p, q, axis, coords);
                    }
                }
            }
        }
    }

    Ok(mesh.border_indices().to_vec())
}
