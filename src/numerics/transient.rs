use glam::DVec3;
use kryst::matrix::sparse::CsrMatrix;
use nalgebra::DVector;

use crate::discretization::mesh::{Location, Mesh};
use crate::numerics::operator::{apply, check_dims};
use crate::numerics::solver::{SolverError, SparseSolver};
use crate::numerics::Scheme;
use crate::physics::bc::impose_dirichlet;
use crate::physics::fun_to_vec;

/// Fixed-step parabolic solver: steps `u_t = A u + f(t)` with the tagged
/// discretization scheme, re-imposing the Dirichlet values on the border
/// indices at each step's time and pinning exterior points to zero.
pub struct TransientSolver {
    pub t_start: f64,
    pub t_end: f64,
    pub dt: f64,
    pub scheme: Scheme,
    pub tolerance: f64,
    pub logging: bool,
}

impl Default for TransientSolver {
    fn default() -> Self {
        Self {
            t_start: 0.0,
            t_end: 1.0,
            dt: 1e-3,
            scheme: Scheme::BackwardEuler,
            tolerance: 1e-10,
            logging: false,
        }
    }
}

impl TransientSolver {
    pub fn solve(
        &self,
        mesh: &Mesh,
        a: &CsrMatrix<f64>,
        source: impl Fn(DVec3, f64) -> f64,
        boundary: impl Fn(DVec3, f64) -> f64,
        border: &[usize],
        initial: DVector<f64>,
        mut callback: impl FnMut(f64, &DVector<f64>),
    ) -> Result<DVector<f64>, SolverError> {
        let n = mesh.num_points();
        check_dims(a, n)?;
        if initial.len() != n {
            return Err(SolverError::ShapeMismatch {
                len: initial.len(),
                expected: n,
            });
        }

        let solver = SparseSolver {
            tolerance: self.tolerance,
            ..SparseSolver::default()
        };

        let mut u = initial;
        mesh.zero_exterior_in(&mut u)
            .map_err(|_| SolverError::ShapeMismatch {
                len: u.len(),
                expected: n,
            })?;
        let mut u_prev: Option<DVector<f64>> = None;

        let theta = self.scheme.theta();
        let mut lhs_main: Option<CsrMatrix<f64>> = None;
        let mut lhs_bootstrap: Option<CsrMatrix<f64>> = None;

        let mut t = self.t_start;
        let mut f_old = fun_to_vec(mesh, &source, t);

        if self.logging {
            println!(
                "Starting transient run: T={:.2} -> {:.2}, dt={:.3e}, {:?}",
                self.t_start, self.t_end, self.dt, self.scheme
            );
        }

        let mut step = 0usize;
        while t < self.t_end - 1e-12 {
            step += 1;
            let t_next = t + self.dt;
            let f_new = fun_to_vec(mesh, &source, t_next);

            let bootstrapping = self.scheme == Scheme::Bdf2 && u_prev.is_none();
            let lhs = if bootstrapping {
                lhs_bootstrap
                    .get_or_insert_with(|| build_lhs(mesh, a, self.dt))
            } else {
                let coeff = match self.scheme {
                    Scheme::BackwardEuler => self.dt,
                    Scheme::CrankNicolson => 0.5 * self.dt,
                    Scheme::Bdf2 => 2.0 * self.dt / 3.0,
                };
                lhs_main.get_or_insert_with(|| build_lhs(mesh, a, coeff))
            };

            let au = if theta < 1.0 {
                Some(apply(a, &u)?)
            } else {
                None
            };

            let mut rhs = DVector::zeros(n);
            for point in mesh.points() {
                if point.location() != Location::Interior {
                    continue;
                }
                let r = point.index();
                rhs[r] = match self.scheme {
                    Scheme::BackwardEuler => u[r] + self.dt * f_new[r],
                    Scheme::CrankNicolson => {
                        let au = au.as_ref().expect("spatial term cached for theta < 1");
                        u[r] + 0.5 * self.dt * (f_new[r] + f_old[r] + au[r])
                    }
                    Scheme::Bdf2 => {
                        if bootstrapping {
                            u[r] + self.dt * f_new[r]
                        } else {
                            let prev = u_prev.as_ref().expect("history after bootstrap");
                            (4.0 * u[r] - prev[r]) / 3.0 + 2.0 * self.dt / 3.0 * f_new[r]
                        }
                    }
                };
            }

            impose_dirichlet(mesh, lhs, &mut rhs, &boundary, border, t_next)?;

            let u_next = solver.solve(lhs, &rhs, false)?;

            u_prev = Some(std::mem::replace(&mut u, u_next));
            f_old = f_new;
            t = t_next;

            if self.logging {
                println!("Step {:>4} | t = {:.4e} | dt = {:.3e}", step, t, self.dt);
            }

            callback(t, &u);
        }

        Ok(u)
    }
}

/// Left-hand-side matrix `I − c·A` on interior rows; identity rows are
/// carried through unchanged.
fn build_lhs(mesh: &Mesh, a: &CsrMatrix<f64>, c: f64) -> CsrMatrix<f64> {
    let n = mesh.num_points();
    let indptr = a.row_ptr().to_vec();
    let indices = a.col_idx().to_vec();
    let mut data = a.values().to_vec();

    for r in 0..n {
        if mesh.point(r).location() != Location::Interior {
            continue;
        }
        let start = indptr[r];
        let end = indptr[r + 1];
        for val in &mut data[start..end] {
            *val *= -c;
        }
        for pos in start..end {
            if indices[pos] == r {
                data[pos] += 1.0;
            }
        }
    }

    CsrMatrix::from_csr(n, n, indptr, indices, data)
}
