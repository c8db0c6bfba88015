//! Benchmarks for redundancy and availability queries
//!
//! Run with: cargo bench --bench redundancy

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use renter_core::{ContentHash, HostPublicKey, HostStatusMap, RenterConfig, SiaFile, Specifier};

/// Build a fully uploaded file spread round-robin over `num_hosts` hosts
fn uploaded_file(num_chunks: u64, num_hosts: usize) -> (SiaFile, Vec<HostPublicKey>) {
    let config = RenterConfig::default();
    let file = config
        .new_file("bench", config.chunk_size() * num_chunks, 0o600, "")
        .unwrap();
    let hosts: Vec<HostPublicKey> = (0..num_hosts)
        .map(|i| HostPublicKey::new(Specifier::ED25519, (i as u64).to_le_bytes().repeat(4)))
        .collect();

    let num_pieces = (config.data_pieces + config.parity_pieces) as u64;
    for chunk_index in 0..file.num_chunks() {
        for piece_index in 0..num_pieces {
            let host = &hosts[((chunk_index + piece_index) as usize) % num_hosts];
            let root = ContentHash::hash(&chunk_index.to_le_bytes());
            file.add_piece(host, chunk_index, piece_index, root).unwrap();
        }
    }
    (file, hosts)
}

fn status_maps(hosts: &[HostPublicKey]) -> (HostStatusMap, HostStatusMap) {
    let offline = hosts
        .iter()
        .enumerate()
        .map(|(i, h)| (h.clone(), i % 7 == 0))
        .collect();
    let good_for_renew = hosts
        .iter()
        .enumerate()
        .map(|(i, h)| (h.clone(), i % 3 != 0))
        .collect();
    (offline, good_for_renew)
}

fn bench_redundancy(c: &mut Criterion) {
    let mut group = c.benchmark_group("redundancy");

    for num_chunks in [10u64, 100, 1000] {
        let (file, hosts) = uploaded_file(num_chunks, 50);
        let (offline, good_for_renew) = status_maps(&hosts);

        group.bench_with_input(
            BenchmarkId::new("redundancy", num_chunks),
            &num_chunks,
            |b, _| b.iter(|| file.redundancy(black_box(&offline), black_box(&good_for_renew))),
        );
        group.bench_with_input(
            BenchmarkId::new("available", num_chunks),
            &num_chunks,
            |b, _| b.iter(|| file.available(black_box(&offline))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_redundancy);
criterion_main!(benches);
