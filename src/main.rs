use std::f64::consts::PI;
use std::fs;

use glam::DVec3;

use fidom_rs::discretization::border::make_border_points;
use fidom_rs::discretization::mesh::Mesh;
use fidom_rs::numerics::operator::{insert_beta, laplacian, remove_periodicity};
use fidom_rs::numerics::solver::SparseSolver;
use fidom_rs::numerics::timing::record_assembly;
use fidom_rs::physics::bc::impose_dirichlet;
use fidom_rs::physics::{fun_to_vec, Problem};
use fidom_rs::processing::errors::{error_abs, error_l1, error_linf, error_rela};
use fidom_rs::processing::summary::{ConvergenceSummary, ResolutionRecord};
use fidom_rs::processing::writer::Writer;

fn main() {
    fs::create_dir_all("output/sphere").expect("Failed to create output directory");

    println!("{}", "-".repeat(45));
    println!("{:^45}", "EMBEDDED SPHERE CONVERGENCE STUDY");
    println!("{}", "-".repeat(45));

    let problem = Problem::new(level_set, source, solution)
        .with_coefficient(beta)
        .with_solution(solution);

    let list_nx = [21usize, 41, 81];
    let mut summary = ConvergenceSummary::new("3D embedded sphere, variable coefficient");

    for &nx in &list_nx {
        println!("\nResolution Nx = Ny = Nz = {nx}");
        match run_resolution(&problem, nx) {
            Ok(record) => summary.push(record),
            Err(e) => eprintln!("Resolution {nx} failed: {e}"),
        }
    }

    summary.print_to_console();
    summary
        .write_to_file("output/sphere/convergence_summary.txt")
        .expect("Failed to write summary");
    println!("Summary saved to output/sphere/convergence_summary.txt");
}

fn run_resolution(
    problem: &Problem,
    nx: usize,
) -> Result<ResolutionRecord, Box<dyn std::error::Error>> {
    let mut mesh = Mesh::new();
    mesh.set_bounds(DVec3::ZERO, DVec3::ONE);
    mesh.set_nx(nx);
    mesh.set_ny(nx);
    mesh.set_nz(nx);
    mesh.build()?;

    let phi_vec = fun_to_vec(&mesh, |p, t| (problem.level_set)(p, t), 0.0);
    let border = make_border_points(&mut mesh, &phi_vec)?;
    println!(
        "  {} grid points, {} border points",
        mesh.num_grid_points(),
        border.len()
    );

    let mut a = record_assembly(|| laplacian(&mesh))?;
    remove_periodicity(&mesh, &mut a)?;

    if let Some(coefficient) = &problem.coefficient {
        let beta_vec = fun_to_vec(&mesh, |p, t| coefficient(p, t), 0.0);
        insert_beta(&mesh, &mut a, &beta_vec)?;
    }

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
        tolerance: 1e-11,
        max_iterations: 50_000,
    };
    let mut u_num = solver.solve(&a, &b, true)?;

    let exact = problem.solution.as_ref().expect("analytic solution");
    let mut u_ana = fun_to_vec(&mesh, |p, t| exact(p, t), 0.0);

    mesh.zero_exterior_in(&mut u_ana)?;
    mesh.zero_exterior_in(&mut u_num)?;

    let err_abs = error_abs(&mesh, &u_ana, &u_num)?;
    let l1 = error_l1(&mesh, &u_ana, &u_num)?;
    let linf = error_linf(&mesh, &u_ana, &u_num)?;
    let rela = error_rela(&mesh, &u_ana, &u_num)?;
    println!("  l1 = {l1:.4e}, linf = {linf:.4e}, rela = {rela:.4e}");

    let mut writer = Writer::new(&mesh);
    writer.set_filename(format!("output/sphere/sphere_{nx}"));
    writer.add_vector("numerical", &u_num);
    writer.add_vector("analytical", &u_ana);
    writer.add_vector("error_abs", &err_abs);
    writer.set_include_exterior(true);
    writer.write()?;

    let h = DVec3::new(mesh.hx(), mesh.hy(), mesh.hz()).length();
    Ok(ResolutionRecord {
        n: nx,
        h,
        l1,
        linf,
        rela,
    })
}

/// Signed distance to a sphere of radius 0.3 centered in the unit cube.
fn level_set(p: DVec3, _t: f64) -> f64 {
    (p - DVec3::new(0.5, 0.5, 0.5)).length() - 0.3
}

fn beta(p: DVec3, _t: f64) -> f64 {
    p.x * p.y * p.z
}

fn solution(p: DVec3, _t: f64) -> f64 {
    (4.0 * PI * p.x).sin() * (4.0 * PI * p.y).sin() * (4.0 * PI * p.z).sin()
}

/// Source matching `∇·(β∇u)` for the manufactured solution above.
fn source(p: DVec3, _t: f64) -> f64 {
    let (x, y, z) = (p.x, p.y, p.z);
    let (sx, sy, sz) = (
        (4.0 * PI * x).sin(),
        (4.0 * PI * y).sin(),
        (4.0 * PI * z).sin(),
    );
    let (cx, cy, cz) = (
        (4.0 * PI * x).cos(),
        (4.0 * PI * y).cos(),
        (4.0 * PI * z).cos(),
    );

    let mut value = 0.0;
    value += 4.0 * x * y * PI * cz * sx * sy;
    value += 4.0 * x * z * PI * cy * sx * sz;
    value += 4.0 * y * z * PI * cx * sy * sz;
    value += -48.0 * x * y * z * PI * PI * sx * sy * sz;
    value
}
