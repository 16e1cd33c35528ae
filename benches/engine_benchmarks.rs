//! Criterion benchmarks: move generation throughput, evaluation and a
//! fixed-depth search.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use squall::board::{eval, perft, Position};
use squall::search::{Search, SearchLimits};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn bench_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");
    group.sample_size(20);

    group.bench_function("startpos_depth_4", |b| {
        let mut pos = Position::startpos();
        b.iter(|| black_box(perft(&mut pos, 4)));
    });

    group.bench_function("kiwipete_depth_3", |b| {
        let mut pos = Position::from_fen(KIWIPETE).unwrap();
        b.iter(|| black_box(perft(&mut pos, 3)));
    });

    group.finish();
}

fn bench_movegen(c: &mut Criterion) {
    c.bench_function("legal_moves_kiwipete", |b| {
        let pos = Position::from_fen(KIWIPETE).unwrap();
        b.iter(|| black_box(pos.legal_moves().len()));
    });
}

fn bench_evaluation(c: &mut Criterion) {
    c.bench_function("evaluate_kiwipete", |b| {
        let pos = Position::from_fen(KIWIPETE).unwrap();
        b.iter(|| black_box(eval::evaluate(&pos)));
    });
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);

    group.bench_function("startpos_depth_6", |b| {
        let pos = Position::startpos();
        b.iter(|| {
            let mut search = Search::new(16);
            search.settings.log_info = false;
            black_box(search.search_best_move(&pos, SearchLimits::depth(6)))
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_perft,
    bench_movegen,
    bench_evaluation,
    bench_search
);
criterion_main!(benches);
