use chess_dagger::{Archive, CostModel, GuidedSearch, PositionRecord, Preference};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Synthetic archive: `games` games of `plies` half-moves each, with every
/// game's head row sharing one hot fingerprint so round 1 sees a large
/// candidate set.
fn synthetic_archive(games: u32, plies: u32, seed: u64) -> Archive {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity((games * plies) as usize);

    for game_id in 1..=games {
        let final_evaluation = rng.gen_range(-300.0..300.0);
        for ply in 0..plies {
            let fingerprint = if ply == 0 {
                0xF00D
            } else {
                (u64::from(game_id) << 32) | u64::from(ply)
            };
            rows.push(PositionRecord {
                game_id,
                ply,
                fingerprint,
                evaluation: Some(rng.gen_range(-500.0..500.0)),
                final_evaluation: Some(final_evaluation),
                pgn: "1. e4 e5 2. Nf3 Nc6 *".to_string(),
            });
        }
    }

    Archive::from_records(rows)
}

fn bench_guided_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("guided_search");

    for games in [10u32, 100, 1000] {
        let archive = synthetic_archive(games, 40, 42);
        group.bench_with_input(
            BenchmarkId::new("run", games),
            &archive,
            |b, archive| {
                b.iter(|| {
                    let search = GuidedSearch::new(
                        black_box(archive),
                        black_box(0xF00D),
                        black_box(25.0),
                        Preference::White,
                    );
                    black_box(search.run())
                })
            },
        );
    }

    group.finish();
}

fn bench_cost_model(c: &mut Criterion) {
    let archive = synthetic_archive(100, 40, 7);
    let model = CostModel::new(25.0, Preference::White);

    c.bench_function("cost_model_window", |b| {
        b.iter(|| {
            let mut total = 0.0f32;
            for index in (0..archive.len()).step_by(37) {
                total += model.cost(black_box(&archive), black_box(index));
            }
            black_box(total)
        })
    });
}

criterion_group!(benches, bench_guided_search, bench_cost_model);
criterion_main!(benches);
