use criterion::{black_box, criterion_group, criterion_main, Criterion};
use geom::Point3;
use toolpath::remove_perimeter_overlaps;

/// A comb-shaped perimeter: every tooth is a thin slot whose two sides are
/// antiparallel within the merge tolerance, so the detector has real work
/// on every pass.
fn comb_perimeter(teeth: i64) -> Vec<Point3> {
    let mut points = Vec::new();
    for tooth in 0..teeth {
        let x = tooth * 1_000;
        points.push(Point3::new(x, 0, 0));
        points.push(Point3::new(x, 20_000, 0));
        points.push(Point3::new(x + 50, 20_000, 0));
        points.push(Point3::new(x + 50, 0, 0));
    }
    points.push(Point3::new(teeth * 1_000, 0, 0));
    points.push(Point3::new(teeth * 1_000, -5_000, 0));
    points.push(Point3::new(0, -5_000, 0));
    points
}

fn benchmark_overlap(c: &mut Criterion) {
    let perimeter = comb_perimeter(50);

    c.bench_function("merge_comb_perimeter", |b| {
        b.iter(|| {
            let (modified, fragments) =
                remove_perimeter_overlaps(black_box(&perimeter), black_box(400));
            assert!(modified);
            black_box(fragments)
        })
    });
}

criterion_group!(benches, benchmark_overlap);
criterion_main!(benches);
