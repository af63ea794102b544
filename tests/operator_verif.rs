use glam::DVec3;
use nalgebra::DVector;

use fidom_rs::discretization::border::make_border_points;
use fidom_rs::discretization::mesh::{Axis, Location, Mesh, Side};
use fidom_rs::numerics::operator::{
    apply, gradient, insert_beta, laplacian, remove_periodicity, Order, OperatorError,
};
use fidom_rs::physics::bc::impose_dirichlet;
use fidom_rs::physics::fun_to_vec;

fn disc_mesh(nx: usize) -> (Mesh, Vec<usize>) {
    let mut mesh = Mesh::new();
    mesh.set_bounds(DVec3::ZERO, DVec3::new(1.0, 1.0, 0.0));
    mesh.set_nx(nx);
    mesh.set_ny(nx);
    mesh.build().expect("build");

    let phi = fun_to_vec(
        &mesh,
        |p, _| (p - DVec3::new(0.5, 0.5, 0.0)).length() - 0.3,
        0.0,
    );
    let border = make_border_points(&mut mesh, &phi).expect("border detection");
    (mesh, border)
}

#[test]
fn laplacian_annihilates_constant_fields() {
    let (mesh, _) = disc_mesh(31);
    let mut a = laplacian(&mesh).unwrap();
    remove_periodicity(&mesh, &mut a).unwrap();

    let ones = DVector::from_element(mesh.num_points(), 1.0);
    let v = apply(&a, &ones).unwrap();

    for p in mesh.points() {
        if p.location() == Location::Interior {
            assert!(
                v[p.index()].abs() < 1e-8,
                "Laplacian of a constant is {} at interior point {}",
                v[p.index()],
                p.index()
            );
        }
    }
}

#[test]
fn laplacian_is_exact_on_quadratics() {
    let (mesh, _) = disc_mesh(31);
    let mut a = laplacian(&mesh).unwrap();
    remove_periodicity(&mesh, &mut a).unwrap();

    // Δ(x² + y²) = 4, including next to inserted border points: the
    // quadratic-interpolation stencil is exact on quadratics.
    let u = fun_to_vec(&mesh, |p, _| p.x * p.x + p.y * p.y, 0.0);
    let v = apply(&a, &u).unwrap();

    for p in mesh.points() {
        if p.location() == Location::Interior {
            assert!(
                (v[p.index()] - 4.0).abs() < 1e-7,
                "got {} at point {}",
                v[p.index()],
                p.index()
            );
        }
    }
}

#[test]
fn gradient_is_exact_on_linear_fields() {
    let (mesh, _) = disc_mesh(31);
    let u = fun_to_vec(&mesh, |p, _| 3.0 * p.x + 2.0 * p.y, 0.0);

    for order in [Order::Second, Order::First] {
        let mut g = gradient(&mesh, Axis::X, order).unwrap();
        remove_periodicity(&mesh, &mut g).unwrap();
        let v = apply(&g, &u).unwrap();

        for p in mesh.points() {
            let interior = p.location() == Location::Interior;
            let on_grid_edge = p.neighbors().iter().any(|n| n.wrap);
            if interior && !on_grid_edge {
                assert!(
                    (v[p.index()] - 3.0).abs() < 1e-9,
                    "d/dx of 3x+2y is {} at point {} ({order:?})",
                    v[p.index()],
                    p.index()
                );
            }
        }
    }
}

#[test]
fn insert_beta_applies_the_product_rule() {
    // 1D problem on [0, 2] with the embedded interval |x - 1| < 0.53.
    let mut mesh = Mesh::new();
    mesh.set_bounds(DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0));
    mesh.set_nx(41);
    mesh.build().unwrap();
    let phi = fun_to_vec(&mesh, |p, _| (p.x - 1.0).abs() - 0.53, 0.0);
    make_border_points(&mut mesh, &phi).unwrap();

    let mut a = laplacian(&mesh).unwrap();
    remove_periodicity(&mesh, &mut a).unwrap();

    // beta = x + 2, u = x²: ∇·(β∇u) = β'u' + βu'' = 2x + 2(x+2) = 4x + 4.
    let beta = fun_to_vec(&mesh, |p, _| p.x + 2.0, 0.0);
    insert_beta(&mesh, &mut a, &beta).unwrap();

    let u = fun_to_vec(&mesh, |p, _| p.x * p.x, 0.0);
    let v = apply(&a, &u).unwrap();

    for p in mesh.points() {
        if p.location() == Location::Interior {
            let expected = 4.0 * p.x() + 4.0;
            assert!(
                (v[p.index()] - expected).abs() < 1e-7,
                "expected {expected}, got {} at x = {}",
                v[p.index()],
                p.x()
            );
        }
    }
}

#[test]
fn insert_beta_rejects_mismatched_coefficients() {
    let (mesh, _) = disc_mesh(11);
    let mut a = laplacian(&mesh).unwrap();
    let beta = DVector::from_element(3, 1.0);
    assert!(matches!(
        insert_beta(&mesh, &mut a, &beta),
        Err(OperatorError::ShapeMismatch { .. })
    ));
}

#[test]
fn dirichlet_rows_become_identity_with_boundary_rhs() {
    let (mesh, border) = disc_mesh(21);
    let mut a = laplacian(&mesh).unwrap();
    remove_periodicity(&mesh, &mut a).unwrap();
    let mut b = fun_to_vec(&mesh, |_, _| -1.0, 0.0);

    let g = |p: DVec3, _t: f64| 2.0 * p.x - p.y;
    impose_dirichlet(&mesh, &mut a, &mut b, g, &border, 0.0).unwrap();

    for &idx in &border {
        let start = a.row_ptr()[idx];
        let end = a.row_ptr()[idx + 1];
        for pos in start..end {
            let col = a.col_idx()[pos];
            let val = a.values()[pos];
            if col == idx {
                assert_eq!(val, 1.0);
            } else {
                assert_eq!(val, 0.0);
            }
        }
        let p = mesh.point(idx);
        assert_eq!(b[idx], g(p.coords(), 0.0));
    }
}

#[test]
fn remove_periodicity_strips_wrap_couplings() {
    // No embedded domain: every point stays interior and the edge rows carry
    // the closing couplings until they are removed.
    let mut mesh = Mesh::new();
    mesh.set_bounds(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0));
    mesh.set_nx(6);
    mesh.build().unwrap();

    let mut a = laplacian(&mesh).unwrap();

    let coupling = |a: &kryst::matrix::sparse::CsrMatrix<f64>, row: usize, col: usize| {
        let start = a.row_ptr()[row];
        let end = a.row_ptr()[row + 1];
        (start..end)
            .find(|&pos| a.col_idx()[pos] == col)
            .map(|pos| a.values()[pos])
    };

    assert!(coupling(&a, 0, 5).unwrap() != 0.0);
    assert!(coupling(&a, 5, 0).unwrap() != 0.0);

    remove_periodicity(&mesh, &mut a).unwrap();

    assert_eq!(coupling(&a, 0, 5).unwrap(), 0.0);
    assert_eq!(coupling(&a, 5, 0).unwrap(), 0.0);

    // Interior couplings survive.
    assert!(coupling(&a, 2, 3).unwrap() != 0.0);
}

#[test]
fn irregular_distances_appear_next_to_the_border() {
    let (mesh, border) = disc_mesh(21);
    let h = mesh.hx();

    let mut found_irregular = false;
    for p in mesh.points() {
        if p.location() != Location::Interior {
            continue;
        }
        for axis in [Axis::X, Axis::Y] {
            for side in [Side::Minus, Side::Plus] {
                if let Some(n) = p.neighbor(axis, side) {
                    if border.contains(&n.index) && (n.distance - h).abs() > 1e-12 {
                        assert!(n.distance > 0.0 && n.distance < h + 1e-12);
                        found_irregular = true;
                    }
                }
            }
        }
    }
    assert!(found_irregular, "no irregular neighbor distances detected");
}
