//! Heat equation on an interval embedded in [-1, 1], stepped with each of
//! the three time-discretization schemes and compared against the exact
//! decaying mode at the final time.

use std::f64::consts::PI;

use glam::DVec3;

use fidom_rs::discretization::border::make_border_points;
use fidom_rs::discretization::mesh::Mesh;
use fidom_rs::numerics::operator::{laplacian, remove_periodicity};
use fidom_rs::numerics::transient::TransientSolver;
use fidom_rs::numerics::Scheme;
use fidom_rs::physics::fun_to_vec;
use fidom_rs::processing::errors::error_linf;
use fidom_rs::processing::writer::write_xy;

const T_END: f64 = 0.1;

fn exact(p: DVec3, t: f64) -> f64 {
    (-PI * PI * t).exp() * (PI * p.x).sin()
}

fn level_set(p: DVec3, _t: f64) -> f64 {
    p.x.abs() - 0.5
}

fn main() {
    println!("{}", "-".repeat(45));
    println!("{:^45}", "1D HEAT EQUATION, EMBEDDED INTERVAL");
    println!("{}", "-".repeat(45));

    for scheme in [Scheme::BackwardEuler, Scheme::CrankNicolson, Scheme::Bdf2] {
        match run_scheme(scheme) {
            Ok(err) => println!("{scheme:?}: linf error at T = {T_END} is {err:.4e}"),
            Err(e) => eprintln!("{scheme:?} failed: {e}"),
        }
    }
}

fn run_scheme(scheme: Scheme) -> Result<f64, Box<dyn std::error::Error>> {
    let mut mesh = Mesh::new();
    mesh.set_bounds(DVec3::new(-1.0, 0.0, 0.0), DVec3::new(1.0, 0.0, 0.0));
    mesh.set_nx(81);
    mesh.build()?;

    let phi_vec = fun_to_vec(&mesh, level_set, 0.0);
    let border = make_border_points(&mut mesh, &phi_vec)?;

    let mut a = laplacian(&mesh)?;
    remove_periodicity(&mesh, &mut a)?;

    let u0 = fun_to_vec(&mesh, exact, 0.0);

    let solver = TransientSolver {
        t_start: 0.0,
        t_end: T_END,
        dt: 2e-3,
        scheme,
        ..TransientSolver::default()
    };
    let mut u_num = solver.solve(
        &mesh,
        &a,
        |_, _| 0.0,
        exact,
        &border,
        u0,
        |_t, _u| {},
    )?;

    let mut u_ana = fun_to_vec(&mesh, exact, T_END);
    mesh.zero_exterior_in(&mut u_ana)?;
    mesh.zero_exterior_in(&mut u_num)?;

    let x: Vec<f64> = mesh.points().map(|p| p.x()).collect();
    let u: Vec<f64> = u_num.iter().copied().collect();
    write_xy(
        format!("heat_1d_{scheme:?}.csv").to_lowercase(),
        "x",
        "u",
        &x,
        &u,
    )?;

    Ok(error_linf(&mesh, &u_ana, &u_num)?)
}
