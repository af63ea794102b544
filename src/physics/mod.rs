pub mod bc;

use std::sync::Arc;

use glam::DVec3;
use nalgebra::DVector;

use crate::discretization::mesh::Mesh;

/// Shared function type for the problem-definition callbacks: level-set,
/// coefficient, source and boundary value are all scalar functions of a
/// point and a time. The time parameter is carried even by stationary
/// problems, which ignore it.
pub type ScalarField = Arc<dyn Fn(DVec3, f64) -> f64 + Send + Sync>;

/// Local trait allowing convenient conversion into [`ScalarField`].
pub trait IntoScalarField {
    fn into_scalar_field(self) -> ScalarField;
}

impl IntoScalarField for f64 {
    fn into_scalar_field(self) -> ScalarField {
        let val = self;
        Arc::new(move |_, _| val)
    }
}

impl<F> IntoScalarField for F
where
    F: Fn(DVec3, f64) -> f64 + Send + Sync + 'static,
{
    fn into_scalar_field(self) -> ScalarField {
        Arc::new(self)
    }
}

/// A problem definition: the closures the pipeline consumes. The core stays
/// pure with respect to the problem choice; no process-wide state is needed.
#[derive(Clone)]
pub struct Problem {
    pub level_set: ScalarField,
    pub coefficient: Option<ScalarField>,
    pub source: ScalarField,
    pub boundary_value: ScalarField,
    pub solution: Option<ScalarField>,
}

impl Problem {
    pub fn new(
        level_set: impl IntoScalarField,
        source: impl IntoScalarField,
        boundary_value: impl IntoScalarField,
    ) -> Self {
        Self {
            level_set: level_set.into_scalar_field(),
            coefficient: None,
            source: source.into_scalar_field(),
            boundary_value: boundary_value.into_scalar_field(),
            solution: None,
        }
    }

    pub fn with_coefficient(mut self, beta: impl IntoScalarField) -> Self {
        self.coefficient = Some(beta.into_scalar_field());
        self
    }

    pub fn with_solution(mut self, u: impl IntoScalarField) -> Self {
        self.solution = Some(u.into_scalar_field());
        self
    }
}

/// Sample a scalar field at every mesh point (grid points and inserted
/// border points alike), aligned with the mesh index space.
pub fn fun_to_vec(mesh: &Mesh, f: impl Fn(DVec3, f64) -> f64, t: f64) -> DVector<f64> {
    DVector::from_iterator(mesh.num_points(), mesh.points().map(|p| f(p.coords(), t)))
}
