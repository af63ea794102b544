use glam::DVec3;
use nalgebra::DVector;

use fidom_rs::discretization::border::make_border_points;
use fidom_rs::discretization::mesh::{Location, Mesh};
use fidom_rs::physics::fun_to_vec;
use fidom_rs::processing::errors::{error_l1, error_linf, error_rela};

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
fn index_bijection_round_trips() {
    let mut mesh = Mesh::new();
    mesh.set_bounds(DVec3::ZERO, DVec3::new(1.0, 2.0, 3.0));
    mesh.set_nx(5);
    mesh.set_ny(4);
    mesh.set_nz(3);
    mesh.build().unwrap();

    let mut seen = vec![false; mesh.num_grid_points()];
    for k in 0..3 {
        for j in 0..4 {
            for i in 0..5 {
                let idx = mesh.index(i, j, k);
                assert!(idx < mesh.num_grid_points());
                assert!(!seen[idx], "index {idx} hit twice");
                seen[idx] = true;
                assert_eq!(mesh.unravel(idx), (i, j, k));
            }
        }
    }
    assert!(seen.iter().all(|&s| s));
}

#[test]
fn spacing_matches_bounds_exactly() {
    let mut mesh = Mesh::new();
    mesh.set_bounds(DVec3::new(0.0, -1.0, 2.0), DVec3::new(2.0, 1.0, 5.0));
    mesh.set_nx(21);
    mesh.set_ny(11);
    mesh.set_nz(7);
    mesh.build().unwrap();

    assert_eq!(mesh.hx(), 2.0 / 20.0);
    assert_eq!(mesh.hy(), 2.0 / 10.0);
    assert_eq!(mesh.hz(), 3.0 / 6.0);
}

#[test]
fn classification_is_a_partition() {
    let (mesh, border) = disc_mesh(41);

    let mut interior = 0;
    let mut on_border = 0;
    let mut exterior = 0;
    for p in mesh.points() {
        match p.location() {
            Location::Interior => interior += 1,
            Location::Border => on_border += 1,
            Location::Exterior => exterior += 1,
        }
    }

    assert_eq!(interior + on_border + exterior, mesh.num_points());
    assert!(interior > 0 && on_border > 0 && exterior > 0);
    assert_eq!(on_border, border.len());
    for &b in &border {
        assert_eq!(mesh.point(b).location(), Location::Border);
    }
}

#[test]
fn border_points_sit_on_the_circle() {
    let (mesh, border) = disc_mesh(41);
    let h = mesh.hx();

    for &b in &border {
        let p = mesh.point(b);
        let r = (p.coords() - DVec3::new(0.5, 0.5, 0.0)).length();
        // Linear interpolation of a smooth level-set locates the crossing to
        // second order in the sampling.
        assert!(
            (r - 0.3).abs() < h * h,
            "border point at radius {r} is too far from 0.3"
        );
    }
}

#[test]
fn rebuild_reconstructs_from_scratch() {
    let (mut mesh, border) = disc_mesh(21);
    assert!(!border.is_empty());
    assert!(mesh.num_points() > mesh.num_grid_points());

    mesh.build().unwrap();
    assert_eq!(mesh.num_points(), mesh.num_grid_points());
    assert!(mesh.border_indices().is_empty());
    assert!(mesh.points().all(|p| p.location() == Location::Interior));
}

#[test]
fn exterior_zeroing_is_exact_and_norms_ignore_it() {
    let (mesh, _) = disc_mesh(21);

    let u_ana = fun_to_vec(&mesh, |p, _| p.x + p.y, 0.0);
    let mut u_num = fun_to_vec(&mesh, |p, _| p.x + p.y + 0.01, 0.0);

    // Garbage on the exterior must not affect the restricted norms.
    let mut polluted = u_num.clone();
    for p in mesh.points() {
        if p.location() == Location::Exterior {
            polluted[p.index()] = 1e6;
        }
    }

    let l1 = error_l1(&mesh, &u_ana, &u_num).unwrap();
    let linf = error_linf(&mesh, &u_ana, &u_num).unwrap();
    let rela = error_rela(&mesh, &u_ana, &u_num).unwrap();

    assert_eq!(error_l1(&mesh, &u_ana, &polluted).unwrap(), l1);
    assert_eq!(error_linf(&mesh, &u_ana, &polluted).unwrap(), linf);
    assert_eq!(error_rela(&mesh, &u_ana, &polluted).unwrap(), rela);

    mesh.zero_exterior_in(&mut u_num).unwrap();
    for p in mesh.points() {
        if p.location() == Location::Exterior {
            assert_eq!(u_num[p.index()], 0.0);
        }
    }
}

#[test]
fn vectors_from_another_mesh_are_rejected() {
    let (mesh, _) = disc_mesh(21);
    let mut foreign = DVector::<f64>::zeros(10);
    assert!(mesh.zero_exterior_in(&mut foreign).is_err());
}
