use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use slot_algebra::{IndexAlgebraBuilder, ModPoly, ResidueCoder};

const CASES: [(u64, u64); 3] = [(45, 317), (128, 257), (105, 2)];

fn bench_index_algebra(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_algebra");
    for &(m, p) in &CASES {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("m{m}_p{p}")),
            &(m, p),
            |b, &(m, p)| {
                b.iter(|| black_box(IndexAlgebraBuilder::new(m).prime(p).build().unwrap()));
            },
        );
    }
    group.finish();
}

/// 4369 = 17 * 257 with `ord(2) = 16`: 256 slots.
fn bench_many_slots(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_algebra_many_slots");
    group.sample_size(10);
    group.bench_function("m4369_p2", |b| {
        b.iter(|| black_box(IndexAlgebraBuilder::new(4369).prime(2).build().unwrap()));
    });
    group.finish();
}

fn bench_residue_coder(c: &mut Criterion) {
    let mut group = c.benchmark_group("residue_coder");
    for &(m, p) in &CASES {
        let alg = IndexAlgebraBuilder::new(m).prime(p).build().unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("m{m}_p{p}")),
            &alg,
            |b, alg| {
                b.iter(|| black_box(ResidueCoder::new(alg.clone(), 1).unwrap()));
            },
        );
    }
    group.finish();
}

fn bench_crt_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("crt_round_trip");
    for &(m, p) in &CASES {
        let alg = IndexAlgebraBuilder::new(m).prime(p).build().unwrap();
        let coder = ResidueCoder::new(alg, 1).unwrap();
        let coeffs: Vec<u64> = (0..coder.zm_star().phi_m()).map(|i| (i * 17 + 11) % p).collect();
        let h = ModPoly::from_coeffs(&coeffs, p);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("m{m}_p{p}")),
            &h,
            |b, h| {
                b.iter(|| {
                    let slots = coder.crt_decompose(black_box(h)).unwrap();
                    black_box(coder.crt_reconstruct(&slots).unwrap())
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    construction,
    bench_index_algebra,
    bench_many_slots,
    bench_residue_coder,
    bench_crt_round_trip
);
criterion_main!(construction);
