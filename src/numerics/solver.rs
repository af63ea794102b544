use kryst::solver::LinearSolver;
use kryst::{
    parallel::{NoComm, UniverseComm},
    preconditioner::PcSide,
};
use nalgebra::DVector;
use thiserror::Error;

use kryst::matrix::sparse::CsrMatrix;

use crate::numerics::operator::check_dims;
#[allow(unused)]
use crate::numerics::timing::{finalize_and_print, record_linear_solve, reset_timing};

use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("linear solve failed")]
    LinearSolveFailed,
    #[error("linear solver did not converge")]
    NonConvergence,
    #[error("right-hand side length {len} does not match matrix dimension {expected}")]
    ShapeMismatch { len: usize, expected: usize },
    #[error(transparent)]
    Operator(#[from] crate::numerics::operator::OperatorError),
}

/// Iterative sparse solver for the assembled systems.
///
/// The matrix rows are Jacobi-scaled by their diagonal before handing the
/// system to BiCGStab; the identity rows produced by the Dirichlet imposer
/// and the exterior convention keep the diagonal nonzero everywhere. A
/// singular or non-converging system is fatal for the resolution being run;
/// there is no retry.
pub struct SparseSolver {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for SparseSolver {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 10_000,
        }
    }
}

impl SparseSolver {
    pub fn solve(
        &self,
        a: &CsrMatrix<f64>,
        b: &DVector<f64>,
        logging: bool,
    ) -> Result<DVector<f64>, SolverError> {
        reset_timing();
        let solve_start = Instant::now();

        let n = b.len();
        check_dims(a, n)?;

        // Jacobi row scaling to improve conditioning.
        let d: Vec<f64> = (0..n)
            .map(|row_idx| {
                let row_start = a.row_ptr()[row_idx];
                let row_end = a.row_ptr()[row_idx + 1];
                let diag = (row_start..row_end)
                    .find(|&idx| a.col_idx()[idx] == row_idx)
                    .map(|idx| a.values()[idx])
                    .unwrap_or(1.0);
                if diag.abs() < 1e-14 { 1.0 } else { diag }
            })
            .collect();

        let indptr = a.row_ptr().to_vec();
        let indices = a.col_idx().to_vec();
        let mut data = a.values().to_vec();
        for row_idx in 0..n {
            let scale = 1.0 / d[row_idx];
            for val in &mut data[indptr[row_idx]..indptr[row_idx + 1]] {
                *val *= scale;
            }
        }
        let scaled = CsrMatrix::from_csr(n, n, indptr, indices, data);

        let rhs: DVector<f64> = DVector::from_iterator(n, (0..n).map(|idx| b[idx] / d[idx]));
        if !rhs.iter().all(|x| x.is_finite()) {
            eprintln!("Error: scaled RHS contains NaN or Inf");
            return Err(SolverError::LinearSolveFailed);
        }

        if logging {
            println!("{} unknowns, rhs norm {:.3e}", n, rhs.norm());
        }

        let op = kryst::matrix::op::CsrOp::new(Arc::new(scaled));
        let mut bicgstab_solver =
            kryst::solver::bicgstab::BiCgStabSolver::new(self.tolerance, self.max_iterations);
        let mut workspace = kryst::context::ksp_context::Workspace::new(n);
        bicgstab_solver.setup_workspace(&mut workspace);

        let mut x = DVector::from_element(n, 0.0);
        let result = record_linear_solve(|| {
            bicgstab_solver.solve(
                &op,
                None,
                rhs.as_slice(),
                x.as_mut_slice(),
                PcSide::Left,
                &UniverseComm::NoComm(NoComm {}),
                None,
                Some(&mut workspace),
            )
        });

        finalize_and_print(solve_start.elapsed());

        match result {
            Ok(stats) => {
                if logging {
                    println!("Linear solve result: {:?}", stats);
                }
                if !x.iter().all(|val| val.is_finite()) {
                    eprintln!("Error: linear solver produced NaN/Inf");
                    return Err(SolverError::LinearSolveFailed);
                }
                Ok(x)
            }
            Err(e) => {
                eprintln!("Linear solve failed: {:?}", e);
                Err(SolverError::NonConvergence)
            }
        }
    }
}
