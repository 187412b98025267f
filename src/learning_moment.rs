use crate::archive::PositionRecord;
use crate::errors::{DaggerError, Result};

/// How many leading plies of the user's game the selector may look at.
///
/// Beyond this window the upstream oracle starts emitting moves-to-mate
/// values on the centipawn scale, which inflates successive differences and
/// drags the selection toward the end of decisive games. Truncating is a
/// deliberate, tested workaround, not an optimization.
pub const LEARNING_WINDOW_PLIES: usize = 12;

/// The ply judged most instructive to branch the archive search from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearningMoment {
    pub fingerprint: u64,
    pub evaluation: f32,
    pub index: usize,
}

/// Pick the ply with the sharpest evaluation swing in the user's game.
///
/// Only the first [`LEARNING_WINDOW_PLIES`] records are considered; a
/// missing evaluation counts as zero. Ties go to the earliest ply.
pub fn select_learning_moment(positions: &[PositionRecord]) -> Result<LearningMoment> {
    let usable = positions.len().min(LEARNING_WINDOW_PLIES);
    if usable < 2 {
        return Err(DaggerError::InsufficientHistory {
            usable_plies: usable,
        });
    }

    let evaluations: Vec<f32> = positions[..usable]
        .iter()
        .map(|record| record.evaluation.unwrap_or(0.0))
        .collect();

    let mut best_index = 0;
    let mut best_swing = f32::NEG_INFINITY;
    for i in 0..usable - 1 {
        let swing = (evaluations[i + 1] - evaluations[i]).abs();
        if swing > best_swing {
            best_swing = swing;
            best_index = i;
        }
    }

    Ok(LearningMoment {
        fingerprint: positions[best_index].fingerprint,
        evaluation: evaluations[best_index],
        index: best_index,
    })
}
