//! Poisson problem on a disc embedded in the unit square, refined three
//! times to exhibit the second-order convergence of the corrected stencil.

use std::f64::consts::PI;

use glam::DVec3;

use fidom_rs::discretization::border::make_border_points;
use fidom_rs::discretization::mesh::Mesh;
use fidom_rs::numerics::operator::{laplacian, remove_periodicity};
use fidom_rs::numerics::solver::SparseSolver;
use fidom_rs::physics::bc::impose_dirichlet;
use fidom_rs::physics::{fun_to_vec, Problem};
use fidom_rs::processing::errors::{error_l1, error_linf, error_rela};
use fidom_rs::processing::summary::{ConvergenceSummary, ResolutionRecord};

fn main() {
    println!("{}", "-".repeat(45));
    println!("{:^45}", "EMBEDDED DISC CONVERGENCE STUDY");
    println!("{}", "-".repeat(45));

    let exact = |p: DVec3, _t: f64| (2.0 * PI * p.x).sin() * (2.0 * PI * p.y).sin();
    let problem = Problem::new(
        |p: DVec3, _t: f64| (p - DVec3::new(0.5, 0.5, 0.0)).length() - 0.3,
        move |p: DVec3, t: f64| -8.0 * PI * PI * exact(p, t),
        exact,
    )
    .with_solution(exact);

    let mut summary = ConvergenceSummary::new("2D embedded disc, Poisson");

    for nx in [21usize, 41, 81] {
        match run_resolution(&problem, nx) {
            Ok(record) => summary.push(record),
            Err(e) => eprintln!("Resolution {nx} failed: {e}"),
        }
    }

    summary.print_to_console();
}

fn run_resolution(
    problem: &Problem,
    nx: usize,
) -> Result<ResolutionRecord, Box<dyn std::error::Error>> {
    let mut mesh = Mesh::new();
    mesh.set_bounds(DVec3::ZERO, DVec3::new(1.0, 1.0, 0.0));
    mesh.set_nx(nx);
    mesh.set_ny(nx);
    mesh.build()?;

    let phi_vec = fun_to_vec(&mesh, |p, t| (problem.level_set)(p, t), 0.0);
    let border = make_border_points(&mut mesh, &phi_vec)?;

    let mut a = laplacian(&mesh)?;
    remove_periodicity(&mesh, &mut a)?;

    let mut b = fun_to_vec(&mesh, |p, t| (problem.source)(p, t), 0.0);
    mesh.zero_exterior_in(&mut b)?;
    impose_dirichlet(
        &mesh,
        &mut a,
        &mut b,
        |p, t| (problem.boundary_value)(p, t),
        &border,
        0.0,
    )?;

    let solver = SparseSolver {
        tolerance: 1e-12,
        max_iterations: 20_000,
    };
    let mut u_num = solver.solve(&a, &b, false)?;

    let exact = problem.solution.as_ref().expect("analytic solution");
    let mut u_ana = fun_to_vec(&mesh, |p, t| exact(p, t), 0.0);
    mesh.zero_exterior_in(&mut u_ana)?;
    mesh.zero_exterior_in(&mut u_num)?;

    let l1 = error_l1(&mesh, &u_ana, &u_num)?;
    let linf = error_linf(&mesh, &u_ana, &u_num)?;
    let rela = error_rela(&mesh, &u_ana, &u_num)?;
    println!(
        "Nx = {nx:>3}: {} border points, l1 = {l1:.4e}, linf = {linf:.4e}",
        border.len()
    );

    Ok(ResolutionRecord {
        n: nx,
        h: DVec3::new(mesh.hx(), mesh.hy(), 0.0).length(),
        l1,
        linf,
        rela,
    })
}
