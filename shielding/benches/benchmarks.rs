use criterion::{criterion_group, criterion_main, Criterion};
use dem::{Grid, C};
use geo::geometry::Coord;
use shielding::{Batch, CancelToken, ResultStore, SamplePoint, ShieldingConfig, Skyline};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

/// 3 x 3 km of rolling hills at 10 m resolution.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn hills() -> Grid {
    let (n, cell_size) = (301, 10.0);
    let mut samples = Vec::with_capacity(n * n);
    for row in (0..n).rev() {
        for col in 0..n {
            let (x, y) = (col as C * cell_size, row as C * cell_size);
            samples.push((120.0 * (x / 430.0).sin() * (y / 610.0).cos() + 0.05 * x) as f32);
        }
    }
    Grid::new(Coord { x: -1505.0, y: -1505.0 }, cell_size, (n, n), None, samples).unwrap()
}

fn skyline(c: &mut Criterion) {
    let mut group = c.benchmark_group("Skyline");
    let grid = hills();
    let origin = Coord { x: 0.0, y: 0.0 };

    for (name, step) in [("1deg", 1.0), ("0.25deg", 0.25)] {
        let builder = Skyline::builder().observer(origin).azimuth_step(step);
        group.bench_with_input(name, &(&grid, builder), |b, (g, builder)| {
            b.iter(|| builder.build(*g).unwrap())
        });
    }
}

fn batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("Batch");
    group.sample_size(10);
    let grid = hills();
    let batch = Batch::new(&grid, &ShieldingConfig::default(), None, None).unwrap();
    let samples: Vec<SamplePoint> = (0..16)
        .map(|idx| {
            let offset = C::from(idx) * 25.0 - 200.0;
            SamplePoint::new(idx.to_string(), Coord { x: offset, y: -offset }).dip(10.0)
        })
        .collect();

    group.bench_function("16 samples", |b| {
        b.iter(|| batch.run(&samples, &ResultStore::new(), &CancelToken::new(), || ()))
    });
}

criterion_group!(benches, skyline, batch);
criterion_main!(benches);
