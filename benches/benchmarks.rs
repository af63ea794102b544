use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use glam::DVec3;

use fidom_rs::discretization::border::make_border_points;
use fidom_rs::discretization::mesh::Mesh;
use fidom_rs::numerics::operator::{laplacian, remove_periodicity};
use fidom_rs::numerics::solver::SparseSolver;
use fidom_rs::physics::bc::impose_dirichlet;
use fidom_rs::physics::fun_to_vec;

fn grid_sizes() -> Vec<usize> {
    vec![21, 41]
}

fn level_set(p: DVec3, _t: f64) -> f64 {
    (p - DVec3::new(0.5, 0.5, 0.0)).length() - 0.3
}

fn built_mesh(nx: usize) -> Mesh {
    let mut mesh = Mesh::new();
    mesh.set_bounds(DVec3::ZERO, DVec3::new(1.0, 1.0, 0.0));
    mesh.set_nx(nx);
    mesh.set_ny(nx);
    mesh.build().expect("build");
    mesh
}

fn detected_mesh(nx: usize) -> Mesh {
    let mut mesh = built_mesh(nx);
    let phi = fun_to_vec(&mesh, level_set, 0.0);
    make_border_points(&mut mesh, &phi).expect("border detection");
    mesh
}

fn bench_mesh_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("mesh_build");
    for &size in &grid_sizes() {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &nx| {
            b.iter(|| {
                let mesh = built_mesh(nx);
                std::hint::black_box(mesh.num_points());
            });
        });
    }
    group.finish();
}

fn bench_border_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("border_detection");
    for &size in &grid_sizes() {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &nx| {
            b.iter_batched(
                || {
                    let mesh = built_mesh(nx);
                    let phi = fun_to_vec(&mesh, level_set, 0.0);
                    (mesh, phi)
                },
                |(mut mesh, phi)| {
                    let border = make_border_points(&mut mesh, &phi).expect("border detection");
                    std::hint::black_box(border.len());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_laplacian_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("laplacian_assembly");
    for &size in &grid_sizes() {
        let mesh = detected_mesh(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &_| {
            b.iter(|| {
                let a = laplacian(&mesh).expect("assembly");
                std::hint::black_box(a.nnz());
            });
        });
    }
    group.finish();
}

fn bench_poisson_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("poisson_solve");
    group.sample_size(10);
    for &size in &grid_sizes() {
        let mesh = detected_mesh(size);
        let border = mesh.border_indices().to_vec();
        let solver = SparseSolver {
            tolerance: 1e-10,
            max_iterations: 20_000,
        };
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &_| {
            b.iter_batched(
                || {
                    let mut a = laplacian(&mesh).expect("assembly");
                    remove_periodicity(&mesh, &mut a).expect("periodicity");
                    let mut rhs = fun_to_vec(&mesh, |p, _| p.x * p.y, 0.0);
                    mesh.zero_exterior_in(&mut rhs).expect("zeroing");
                    impose_dirichlet(&mesh, &mut a, &mut rhs, |_, _| 0.0, &border, 0.0)
                        .expect("dirichlet");
                    (a, rhs)
                },
                |(a, rhs)| {
                    let u = solver.solve(&a, &rhs, false).expect("solve");
                    std::hint::black_box(u.norm());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_mesh_build,
    bench_border_detection,
    bench_laplacian_assembly,
    bench_poisson_solve
);
criterion_main!(benches);
