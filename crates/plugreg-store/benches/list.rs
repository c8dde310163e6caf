//! Benchmarks for registry scans and plugin identifiers
//!
//! Measures how listing scales with the number of installed plugins and the
//! cost of install/uninstall on a single small image.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use plugreg_store::identity::plugin_id;
use plugreg_store::image::{BINARY_ENTRY, MANIFEST_ENTRY};
use plugreg_store::{Registry, RegistryConfig};
use std::fs::File;
use std::hint::black_box;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(format!("{}.image", name.replace('/', "_")));
    let manifest = format!(r#"{{"name":"{name}","version":"0.1.0"}}"#);
    let binary = vec![0u8; 4096];

    let mut builder = tar::Builder::new(File::create(&path).unwrap());
    for (entry, data) in [
        (MANIFEST_ENTRY, manifest.as_bytes()),
        (BINARY_ENTRY, binary.as_slice()),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, entry, data).unwrap();
    }
    builder.finish().unwrap();
    path
}

/// Benchmarks listing a registry of increasing size
fn bench_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("list");

    for count in [10, 100, 500] {
        let root = TempDir::new().unwrap();
        let images = TempDir::new().unwrap();
        let registry = Registry::new(RegistryConfig::new(root.path())).unwrap();

        for i in 0..count {
            let name = format!("vendor/plugin-{i}");
            let image = write_image(images.path(), &name);
            registry.install(&image, None).unwrap();
        }

        group.throughput(Throughput::Elements(count));
        group.bench_with_input(BenchmarkId::from_parameter(count), &registry, |b, registry| {
            b.iter(|| {
                let report = registry.list().unwrap();
                assert_eq!(report.plugins.len() as u64, count);
                black_box(report)
            });
        });
    }

    group.finish();
}

/// Benchmarks a full install followed by uninstall
fn bench_install_uninstall(c: &mut Criterion) {
    let root = TempDir::new().unwrap();
    let images = TempDir::new().unwrap();
    let registry = Registry::new(RegistryConfig::new(root.path())).unwrap();
    let image = write_image(images.path(), "bench");

    c.bench_function("install_uninstall", |b| {
        b.iter(|| {
            let meta = registry.install(black_box(&image), None).unwrap();
            registry.uninstall(&meta.name).unwrap();
        });
    });
}

/// Benchmarks plugin identifier derivation
fn bench_plugin_id(c: &mut Criterion) {
    c.bench_function("plugin_id", |b| {
        b.iter(|| plugin_id(black_box("vendor/some-fairly-long-plugin-name")));
    });
}

criterion_group!(benches, bench_list, bench_install_uninstall, bench_plugin_id);
criterion_main!(benches);
