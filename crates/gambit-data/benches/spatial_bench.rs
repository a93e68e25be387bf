use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gambit_core::{EntityKey, Point};
use gambit_data::SpatialIndex;

fn bench_radius_queries(c: &mut Criterion) {
    let mut index = SpatialIndex::new(64.0).unwrap();

    // Setup 10,000 entities on a 4096 x 4096 board
    for i in 0..10_000u64 {
        let x = ((i * 7_919) % 4_096) as f64;
        let y = ((i * 104_729) % 4_096) as f64;
        index.insert_at(EntityKey::new(i), Some(Point::new(x, y)));
    }
    let center = Point::new(2_048.0, 2_048.0);

    let mut group = c.benchmark_group("Spatial Queries");

    group.bench_function("Grid (radius 128)", |b| {
        b.iter(|| black_box(index.query_grid(black_box(center), 128.0).len()));
    });

    group.bench_function("Linear scan (radius 128)", |b| {
        b.iter(|| black_box(index.query_linear(black_box(center), 128.0).len()));
    });

    group.bench_function("Relocate across cells", |b| {
        let mut step = 0u64;
        b.iter(|| {
            step += 1;
            let offset = (step % 256) as f64;
            index.relocate_to(EntityKey::new(step % 10_000), Point::new(offset * 16.0, offset));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_radius_queries);
criterion_main!(benches);
