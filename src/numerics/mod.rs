pub mod operator;
pub mod solver;
pub mod timing;
pub mod transient;

/// Time-discretization tag for the parabolic stepping pipeline.
///
/// A closed variant set: each tag selects the coefficient set the transient
/// solver applies, not a dispatch hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    /// First-order implicit Euler.
    BackwardEuler,
    /// Second-order trapezoidal rule.
    CrankNicolson,
    /// Second-order backward differentiation (two-step; bootstrapped with an
    /// implicit Euler step).
    Bdf2,
}

impl Scheme {
    /// Implicitness weight of the spatial operator in the theta formulation.
    pub fn theta(self) -> f64 {
        match self {
            Scheme::BackwardEuler | Scheme::Bdf2 => 1.0,
            Scheme::CrankNicolson => 0.5,
        }
    }
}
