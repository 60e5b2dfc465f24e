//! Backend throughput comparison
//!
//! Run with: cargo bench --bench convolution

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use convr::harness::generate_image;
use convr::prelude::*;

fn bench_backends(c: &mut Criterion) {
    let mut group = c.benchmark_group("conv2d_i32");
    group.sample_size(10);

    // 256 for quick comparisons, 1024 is the canonical benchmark size.
    for &size in &[256usize, 1024] {
        let image = generate_image(size, size);
        let filter = Grid::splat(1, 19, 19);

        for &backend in Backend::ALL {
            #[cfg(feature = "wgpu")]
            if backend == Backend::DeviceOffload && !convr::backend::wgpu::is_device_available() {
                continue;
            }

            group.bench_with_input(BenchmarkId::new(backend.name(), size), &size, |b, _| {
                b.iter(|| black_box(backend.convolve(&image, &filter).unwrap()));
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_backends);
criterion_main!(benches);
