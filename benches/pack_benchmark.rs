use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dxtpack::{
    archive::{self, ArchiveOptions},
    core::{discover, IgnoreList},
};
use std::fs;
use std::hint::black_box;
use std::path::Path;
use tempfile::TempDir;

/// Create an extension tree with `count` small source files
fn create_tree(root: &Path, count: usize) -> u64 {
    let mut total = 0u64;
    for i in 0..count {
        let dir = root.join(format!("server/mod{}/sub{}", i % 8, i % 3));
        fs::create_dir_all(&dir).unwrap();
        let body = format!("def handler_{}():\n    return {}\n", i, i).repeat(20);
        total += body.len() as u64;
        fs::write(dir.join(format!("file{}.py", i)), body).unwrap();
    }
    fs::write(root.join("manifest.json"), b"{}").unwrap();
    total
}

fn bench_discovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("discovery");

    for count in [100, 1000].iter() {
        let temp = TempDir::new().unwrap();
        let bytes = create_tree(temp.path(), *count);
        let ignore = IgnoreList::with_builtin();

        group.throughput(Throughput::Bytes(bytes));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| black_box(discover(temp.path(), &ignore).unwrap()));
        });
    }

    group.finish();
}

fn bench_archive_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("archive_build");

    let temp = TempDir::new().unwrap();
    let bytes = create_tree(temp.path(), 500);
    let files = discover(temp.path(), &IgnoreList::with_builtin())
        .unwrap()
        .into_files();

    group.throughput(Throughput::Bytes(bytes));
    for level in [1u32, 6, 9].iter() {
        let options = ArchiveOptions {
            compression_level: *level,
            verify: false,
            ..ArchiveOptions::default()
        };
        group.bench_with_input(BenchmarkId::new("level", level), level, |b, _| {
            b.iter(|| black_box(archive::build(&files, &options).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_discovery, bench_archive_build);
criterion_main!(benches);
