use criterion::{criterion_group, criterion_main, Criterion};
use ledger_core::{pow::ProofOfWork, Amount, Ledger};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;

fn bench_pow(c: &mut Criterion) {
    let pow = ProofOfWork::default();
    c.bench_function("solve_after_genesis", |b| {
        b.iter(|| pow.solve(black_box(1)));
    });

    c.bench_function("verify_random_pairs", |b| {
        let mut rng = StdRng::seed_from_u64(42);
        b.iter(|| {
            let p: i64 = rng.gen_range(1..1_000_000);
            let q: i64 = rng.gen_range(1..1_000_000);
            pow.verify(black_box(q), black_box(p))
        });
    });
}

fn bench_validate(c: &mut Criterion) {
    let mut ledger = Ledger::default();
    for i in 0..5u64 {
        ledger.add_transaction(format!("alice-{i}"), "bob", Amount::from(i));
        let previous = ledger.latest_block().clone();
        let proof = ledger.pow().solve(previous.proof);
        ledger.create_block(proof, previous.hash());
    }
    c.bench_function("validate_six_blocks", |b| {
        b.iter(|| black_box(ledger.is_valid()));
    });
}

criterion_group!(benches, bench_pow, bench_validate);
criterion_main!(benches);
