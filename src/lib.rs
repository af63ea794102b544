//! Second-order fictitious-domain finite differences on a Cartesian grid.
//!
//! An implicitly-defined sub-region (negative side of a level-set) is
//! embedded in a larger structured grid; border points inserted at the
//! level-set zero crossings get an irregular-spacing stencil correction that
//! preserves second-order convergence.

pub mod discretization;
pub mod numerics;
pub mod physics;
pub mod processing;
