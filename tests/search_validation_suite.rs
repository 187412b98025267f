/// Search Validation Suite
///
/// End-to-end checks of the guided continuation search against synthetic
/// archive snapshots: determinism, round dependency, partial-result
/// semantics, and the documented cost-model scenario.
use chess_dagger::{
    Archive, DaggerError, GuidedSearch, PositionRecord, Preference, StopReason, LINE_LENGTH,
};

fn record(
    game_id: u32,
    ply: u32,
    fingerprint: u64,
    evaluation: Option<f32>,
    final_evaluation: Option<f32>,
) -> PositionRecord {
    PositionRecord {
        game_id,
        ply,
        fingerprint,
        evaluation,
        final_evaluation,
        pgn: "1. e4 e5 *".to_string(),
    }
}

/// Append one game: a head row with the shared fingerprint followed by
/// `tail` same-game rows, contiguous in archive order.
fn push_game(rows: &mut Vec<PositionRecord>, game_id: u32, head_fingerprint: u64, evals: &[f32]) {
    let final_evaluation = evals.last().copied();
    for (ply, &evaluation) in evals.iter().enumerate() {
        let fingerprint = if ply == 0 {
            head_fingerprint
        } else {
            u64::from(game_id) << 32 | ply as u64
        };
        rows.push(record(
            game_id,
            ply as u32,
            fingerprint,
            Some(evaluation),
            final_evaluation,
        ));
    }
}

#[test]
fn scenario_round_one_selects_window_averaging_48() {
    // Three candidates share fingerprint F with evaluations 10, 50, 90 and
    // 10-row lookahead windows averaging exactly 12, 48, and 95. With a
    // target of 50 the squared distance dominates the small regularization
    // term, so the 48-average window must win round 1.
    const F: u64 = 777;
    let mut rows = Vec::new();
    // candidate eval + nine followers chosen to hit the window sums exactly
    let mut game_a = vec![10.0];
    game_a.extend([12.0; 8]);
    game_a.push(14.0); // sum 120, mean 12.0
    let mut game_b = vec![50.0];
    game_b.extend([48.0; 8]);
    game_b.push(46.0); // sum 480, mean 48.0
    let mut game_c = vec![90.0];
    game_c.extend([96.0; 8]);
    game_c.push(92.0); // sum 950, mean 95.0
    push_game(&mut rows, 1, F, &game_a);
    push_game(&mut rows, 2, F, &game_b);
    push_game(&mut rows, 3, F, &game_c);
    let archive = Archive::from_records(rows);

    let outcome = GuidedSearch::new(&archive, F, 50.0, Preference::White).run();
    assert!(!outcome.line.is_empty());
    assert_eq!(outcome.line[0].record.game_id, 2);
    assert_eq!(outcome.line[0].record.evaluation, Some(50.0));
}

#[test]
fn search_never_exceeds_five_rounds_and_never_mutates_the_snapshot() {
    let mut rows = Vec::new();
    push_game(&mut rows, 1, 777, &[20.0; 30]);
    let archive = Archive::from_records(rows);
    let before: Vec<PositionRecord> = archive.rows().to_vec();

    let outcome = GuidedSearch::new(&archive, 777, 20.0, Preference::White).run();
    assert_eq!(outcome.line.len(), LINE_LENGTH);
    assert!(outcome.is_complete());
    assert_eq!(archive.rows(), before.as_slice());
}

#[test]
fn identical_inputs_produce_identical_outcomes() {
    let mut rows = Vec::new();
    push_game(&mut rows, 1, 777, &[10.0; 15]);
    push_game(&mut rows, 2, 777, &[48.0; 15]);
    push_game(&mut rows, 3, 777, &[95.0; 15]);
    let archive = Archive::from_records(rows);

    let first = GuidedSearch::new(&archive, 777, 50.0, Preference::White).run();
    for _ in 0..10 {
        let rerun = GuidedSearch::new(&archive, 777, 50.0, Preference::White).run();
        assert_eq!(first, rerun);
        assert_eq!(format!("{:?}", first), format!("{:?}", rerun));
    }
}

#[test]
fn later_round_archive_edits_never_change_earlier_rounds() {
    // Two archives identical except in rows only round 3's filter reaches.
    let build = |round3_evals: &[f32]| {
        let mut rows = Vec::new();
        // game 1 chains rounds 1 and 2 through unique fingerprints
        push_game(&mut rows, 1, 777, &[20.0; 20]);
        // rival candidates for round 3: game 1's ply-2 fingerprint
        let round3_fingerprint = 1u64 << 32 | 2;
        for (i, &evaluation) in round3_evals.iter().enumerate() {
            let game_id = 50 + i as u32;
            let mut evals = vec![evaluation];
            evals.extend([evaluation; 12]);
            push_game(&mut rows, game_id, round3_fingerprint, &evals);
        }
        Archive::from_records(rows)
    };

    let base = build(&[20.0]);
    let edited = build(&[19.0, 21.0]);

    let base_outcome = GuidedSearch::new(&base, 777, 20.0, Preference::White).run();
    let edited_outcome = GuidedSearch::new(&edited, 777, 20.0, Preference::White).run();

    assert_eq!(base_outcome.line[0], edited_outcome.line[0]);
    assert_eq!(base_outcome.line[1], edited_outcome.line[1]);
}

#[test]
fn unmatched_fingerprint_stops_with_zero_rounds() {
    let mut rows = Vec::new();
    push_game(&mut rows, 1, 777, &[20.0; 12]);
    let archive = Archive::from_records(rows);

    let outcome = GuidedSearch::new(&archive, 424242, 20.0, Preference::White).run();
    assert!(outcome.line.is_empty());
    assert!(matches!(
        outcome.stop,
        StopReason::NoCandidates {
            fingerprint: 424242,
            round: 1
        }
    ));
    assert!(matches!(
        outcome.require_complete(),
        Err(DaggerError::NoCandidates { .. })
    ));
}

#[test]
fn game_ending_mid_line_returns_partial_rounds() {
    // Round 1 selects the head of a two-ply game; round 2 selects its final
    // ply; the session then stops without retrying a different candidate.
    let mut rows = Vec::new();
    push_game(&mut rows, 1, 777, &[20.0, 20.0]);
    // A worse-matching rival that could continue much longer
    push_game(&mut rows, 2, 777, &[90.0; 20]);
    let archive = Archive::from_records(rows);

    let outcome = GuidedSearch::new(&archive, 777, 20.0, Preference::White).run();
    assert_eq!(outcome.line.len(), 2);
    assert_eq!(outcome.line[0].record.game_id, 1);
    assert_eq!(outcome.line[1].record.game_id, 1);
    assert!(matches!(
        outcome.stop,
        StopReason::ContinuationExhausted {
            game_id: 1,
            ply: 1,
            round: 2
        }
    ));
}

#[test]
fn preference_flips_the_selected_side() {
    // Mirror-image candidates: -60 favors black, +60 favors white.
    let mut rows = Vec::new();
    push_game(&mut rows, 1, 777, &[-60.0; 12]);
    push_game(&mut rows, 2, 777, &[60.0; 12]);
    let archive = Archive::from_records(rows);

    let white = GuidedSearch::new(&archive, 777, 60.0, Preference::White).run();
    let black = GuidedSearch::new(&archive, 777, 60.0, Preference::Black).run();
    assert_eq!(white.line[0].record.game_id, 2);
    assert_eq!(black.line[0].record.game_id, 1);
}
