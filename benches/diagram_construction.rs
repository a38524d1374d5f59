//! Benchmarks for end-to-end diagram construction with the reference hull
//! engine.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use powerdiagram::prelude::*;

/// A perturbed grid of spheres with varied radii; generic position, no two
/// poles coincident.
fn grid_spheres(side: usize) -> Vec<Sphere> {
    let mut spheres = Vec::with_capacity(side * side);
    for row in 0..side {
        for column in 0..side {
            let jitter = ((row * 7 + column * 3) % 10) as f64 / 17.0;
            let x = column as f64 * 2.0 + jitter;
            let y = row as f64 * 2.0 + jitter * 0.5;
            let radius = 0.25 + ((row + 2 * column) % 5) as f64 / 8.0;
            spheres.push(sphere!([x, y], radius));
        }
    }
    spheres
}

fn bench_convert_to_lattice(c: &mut Criterion) {
    let pipeline = PowerDiagram::new(ExhaustiveHull);

    for side in [2usize, 3] {
        let spheres = grid_spheres(side);
        let name = format!("minimal_diagram_2d_{}_spheres", spheres.len());
        c.bench_function(&name, |b| {
            b.iter(|| {
                pipeline
                    .convert_to_lattice(black_box(&spheres), DiagramFamily::Minimal)
                    .unwrap()
            });
        });
    }
}

fn bench_stages(c: &mut Criterion) {
    let spheres = grid_spheres(3);
    let poles = lift_spheres(&spheres).unwrap();
    let hull = ExhaustiveHull.hull_of(&poles).unwrap();

    c.bench_function("hull_of_9_poles", |b| {
        b.iter(|| ExhaustiveHull.hull_of(black_box(&poles)).unwrap());
    });
    c.bench_function("separate_9_pole_hull", |b| {
        b.iter(|| separate(black_box(&hull)).unwrap());
    });
}

criterion_group!(benches, bench_convert_to_lattice, bench_stages);
criterion_main!(benches);
