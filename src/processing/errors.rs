use nalgebra::DVector;
use thiserror::Error;

use crate::discretization::mesh::{Location, Mesh};

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("vector length {len} does not match mesh size {expected}")]
    ShapeMismatch { len: usize, expected: usize },
    #[error("convergence order needs at least two refinement levels, got {0}")]
    TooFewLevels(usize),
    #[error("errors and spacings have different lengths ({errors} vs {spacings})")]
    LengthMismatch { errors: usize, spacings: usize },
    #[error("refinement spacings must be distinct")]
    DegenerateSpacing,
}

fn check(mesh: &Mesh, ana: &DVector<f64>, num: &DVector<f64>) -> Result<(), MetricsError> {
    let expected = mesh.num_points();
    for v in [ana, num] {
        if v.len() != expected {
            return Err(MetricsError::ShapeMismatch {
                len: v.len(),
                expected,
            });
        }
    }
    Ok(())
}

/// Pointwise absolute error `|ana − num|` over the full index space.
pub fn error_abs(
    mesh: &Mesh,
    ana: &DVector<f64>,
    num: &DVector<f64>,
) -> Result<DVector<f64>, MetricsError> {
    check(mesh, ana, num)?;
    Ok(DVector::from_iterator(
        ana.len(),
        ana.iter().zip(num.iter()).map(|(a, n)| (a - n).abs()),
    ))
}

fn restricted<'a>(
    mesh: &'a Mesh,
    ana: &'a DVector<f64>,
    num: &'a DVector<f64>,
) -> impl Iterator<Item = (f64, f64)> + 'a {
    mesh.points()
        .filter(|p| p.location() != Location::Exterior)
        .map(move |p| (ana[p.index()], num[p.index()]))
}

/// Discrete l1 error over interior and border points, weighted by the cell
/// measure.
pub fn error_l1(mesh: &Mesh, ana: &DVector<f64>, num: &DVector<f64>) -> Result<f64, MetricsError> {
    check(mesh, ana, num)?;
    let sum: f64 = restricted(mesh, ana, num)
        .map(|(a, n)| (a - n).abs())
        .sum();
    Ok(mesh.cell_measure() * sum)
}

/// Discrete l2 error over interior and border points, weighted by the cell
/// measure.
pub fn error_l2(mesh: &Mesh, ana: &DVector<f64>, num: &DVector<f64>) -> Result<f64, MetricsError> {
    check(mesh, ana, num)?;
    let sum: f64 = restricted(mesh, ana, num)
        .map(|(a, n)| (a - n) * (a - n))
        .sum();
    Ok((mesh.cell_measure() * sum).sqrt())
}

/// Maximum absolute error over interior and border points.
pub fn error_linf(
    mesh: &Mesh,
    ana: &DVector<f64>,
    num: &DVector<f64>,
) -> Result<f64, MetricsError> {
    check(mesh, ana, num)?;
    Ok(restricted(mesh, ana, num)
        .map(|(a, n)| (a - n).abs())
        .fold(0.0, f64::max))
}

/// Relative l2 error: the restricted l2 norm of the error over the
/// restricted l2 norm of the analytic solution.
pub fn error_rela(
    mesh: &Mesh,
    ana: &DVector<f64>,
    num: &DVector<f64>,
) -> Result<f64, MetricsError> {
    check(mesh, ana, num)?;
    let (mut err_sq, mut ana_sq) = (0.0, 0.0);
    for (a, n) in restricted(mesh, ana, num) {
        err_sq += (a - n) * (a - n);
        ana_sq += a * a;
    }
    Ok(err_sq.sqrt() / ana_sq.sqrt())
}

/// Empirical convergence order from successive refinements: the mean of the
/// log-ratio slopes `ln(e_k/e_{k+1}) / ln(h_k/h_{k+1})` over consecutive
/// pairs. Fewer than two levels is an error, never a number.
pub fn order(errors: &[f64], spacings: &[f64]) -> Result<f64, MetricsError> {
    if errors.len() != spacings.len() {
        return Err(MetricsError::LengthMismatch {
            errors: errors.len(),
            spacings: spacings.len(),
        });
    }
    if errors.len() < 2 {
        return Err(MetricsError::TooFewLevels(errors.len()));
    }

    let mut slopes = Vec::with_capacity(errors.len() - 1);
    for k in 0..errors.len() - 1 {
        let dh = (spacings[k] / spacings[k + 1]).ln();
        if dh == 0.0 {
            return Err(MetricsError::DegenerateSpacing);
        }
        slopes.push((errors[k] / errors[k + 1]).ln() / dh);
    }
    Ok(slopes.iter().sum::<f64>() / slopes.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn order_recovers_exact_slope() {
        let spacings = [0.1, 0.05, 0.025];
        let errors: Vec<f64> = spacings.iter().map(|h| 3.0 * h * h).collect();
        let p = order(&errors, &spacings).unwrap();
        assert!((p - 2.0).abs() < 1e-12);
    }

    #[test]
    fn order_with_one_level_is_an_error() {
        assert!(matches!(
            order(&[1e-3], &[0.1]),
            Err(MetricsError::TooFewLevels(1))
        ));
    }

    #[test]
    fn order_with_equal_spacings_is_an_error() {
        assert!(matches!(
            order(&[1e-3, 1e-4], &[0.1, 0.1]),
            Err(MetricsError::DegenerateSpacing)
        ));
    }

    #[test]
    fn norms_match_hand_computed_values() {
        // 1D mesh on [0, 1] with 5 points, everything interior: h = 0.25.
        let mut mesh = Mesh::new();
        mesh.set_bounds(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0));
        mesh.set_nx(5);
        mesh.build().unwrap();

        let ana = DVector::from_element(5, 1.0);
        let num = DVector::from_element(5, 1.5);

        assert!((error_l1(&mesh, &ana, &num).unwrap() - 0.625).abs() < 1e-14);
        assert!((error_l2(&mesh, &ana, &num).unwrap() - 0.3125f64.sqrt()).abs() < 1e-14);
        assert!((error_linf(&mesh, &ana, &num).unwrap() - 0.5).abs() < 1e-14);
        assert!((error_rela(&mesh, &ana, &num).unwrap() - 0.5).abs() < 1e-14);

        let abs = error_abs(&mesh, &ana, &num).unwrap();
        assert!(abs.iter().all(|&e| (e - 0.5).abs() < 1e-14));
    }

    #[test]
    fn norms_reject_foreign_vectors() {
        let mut mesh = Mesh::new();
        mesh.set_bounds(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0));
        mesh.set_nx(5);
        mesh.build().unwrap();

        let ana = DVector::zeros(9);
        let num = DVector::zeros(5);
        assert!(matches!(
            error_l1(&mesh, &ana, &num),
            Err(MetricsError::ShapeMismatch { .. })
        ));
    }
}
