use crate::archive::{Archive, PositionRecord};
use crate::cost::{CostModel, Preference};
use crate::errors::{DaggerError, Result};
use rayon::prelude::*;
use std::cmp::Ordering;

/// A complete continuation is exactly this many half-moves.
pub const LINE_LENGTH: usize = 5;

/// Below this many candidates a sequential scan beats the rayon fan-out.
const PARALLEL_SCORING_THRESHOLD: usize = 64;

/// One selected continuation: the archived record, the ply at which to pick
/// up its game, and the cost that won the round.
#[derive(Debug, Clone, PartialEq)]
pub struct LineEntry {
    /// 1-based round that produced this entry
    pub round: usize,
    pub record: PositionRecord,
    pub ply: u32,
    pub cost: f32,
}

/// Why a search session stopped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopReason {
    /// All five rounds produced an entry
    Completed,
    /// The current fingerprint matched no evaluated archive rows
    NoCandidates { fingerprint: u64, round: usize },
    /// The selected continuation was the final ply of its game
    ContinuationExhausted {
        game_id: u32,
        ply: u32,
        round: usize,
    },
    /// External cancellation fired between rounds
    Cancelled { round: usize },
}

/// Result of a search session: the rounds that completed plus an explicit
/// signal of why the session stopped. A partial line is never silently
/// treated as complete; callers wanting all five rounds go through
/// [`SearchOutcome::require_complete`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub line: Vec<LineEntry>,
    pub stop: StopReason,
}

impl SearchOutcome {
    pub fn is_complete(&self) -> bool {
        self.stop == StopReason::Completed && self.line.len() == LINE_LENGTH
    }

    /// The full five-round line, or the error matching the early stop.
    pub fn require_complete(&self) -> Result<&[LineEntry]> {
        match self.stop {
            StopReason::Completed => Ok(&self.line),
            StopReason::NoCandidates { fingerprint, round } => {
                Err(DaggerError::NoCandidates { fingerprint, round })
            }
            StopReason::ContinuationExhausted {
                game_id,
                ply,
                round,
            } => Err(DaggerError::ContinuationExhausted {
                game_id,
                ply,
                round,
            }),
            StopReason::Cancelled { round } => Err(DaggerError::Cancelled { round }),
        }
    }
}

/// Guided continuation search across the archive ("Dagger").
///
/// Five rounds, strictly sequential: each round filters the archive to rows
/// sharing the session's current fingerprint, scores every candidate with
/// the cost model, records the minimum-cost row, and advances the
/// fingerprint to that row's successor position. Round k+1's filter set
/// depends on round k's selection, so rounds never run in parallel; scoring
/// within a round fans out over rayon when the candidate set is large.
///
/// The session owns its state exclusively and treats the archive snapshot
/// as immutable, so independent sessions may run concurrently against their
/// own snapshots.
pub struct GuidedSearch<'a> {
    archive: &'a Archive,
    cost_model: CostModel,
    current_fingerprint: u64,
    line: Vec<LineEntry>,
}

impl<'a> GuidedSearch<'a> {
    pub fn new(
        archive: &'a Archive,
        start_fingerprint: u64,
        target_evaluation: f32,
        preference: Preference,
    ) -> Self {
        Self::with_cost_model(
            archive,
            start_fingerprint,
            CostModel::new(target_evaluation, preference),
        )
    }

    /// Build a session with a non-default lookahead or lambda.
    pub fn with_cost_model(
        archive: &'a Archive,
        start_fingerprint: u64,
        cost_model: CostModel,
    ) -> Self {
        Self {
            archive,
            cost_model,
            current_fingerprint: start_fingerprint,
            line: Vec::with_capacity(LINE_LENGTH),
        }
    }

    /// Run the session to completion or early termination.
    ///
    /// Identical archive snapshot and inputs always produce the identical
    /// outcome: candidate ties break on original archive order, never on
    /// scoring completion order.
    pub fn run(self) -> SearchOutcome {
        self.run_with_cancel(|| false)
    }

    /// Like [`run`](Self::run), but checks `cancelled` between rounds.
    pub fn run_with_cancel<F: Fn() -> bool>(mut self, cancelled: F) -> SearchOutcome {
        for round in 1..=LINE_LENGTH {
            if cancelled() {
                return SearchOutcome {
                    line: self.line,
                    stop: StopReason::Cancelled { round },
                };
            }

            let Some((index, cost)) = self.select_candidate() else {
                return SearchOutcome {
                    line: self.line,
                    stop: StopReason::NoCandidates {
                        fingerprint: self.current_fingerprint,
                        round,
                    },
                };
            };

            let record = self.archive.row(index).clone();
            let (game_id, ply) = (record.game_id, record.ply);
            self.line.push(LineEntry {
                round,
                ply,
                cost,
                record,
            });

            // Advance to the successor position of the selected game, or
            // stop if that game ended here. The round above stays recorded.
            match self.archive.successor_index(game_id, ply) {
                Some(next) => {
                    self.current_fingerprint = self.archive.row(next).fingerprint;
                }
                None => {
                    return SearchOutcome {
                        line: self.line,
                        stop: StopReason::ContinuationExhausted {
                            game_id,
                            ply,
                            round,
                        },
                    };
                }
            }
        }

        SearchOutcome {
            line: self.line,
            stop: StopReason::Completed,
        }
    }

    /// Score the filtered candidate set and pick the minimum-cost row.
    ///
    /// Rows without an evaluation are never eligible. Candidates are
    /// enumerated in final-evaluation order (best for the session's
    /// preference first), kept from the historical priority-queue seeding;
    /// the observable tie-break is the original archive index.
    fn select_candidate(&self) -> Option<(usize, f32)> {
        let mut candidates: Vec<usize> = self
            .archive
            .candidates(self.current_fingerprint)
            .iter()
            .copied()
            .filter(|&index| self.archive.row(index).evaluation.is_some())
            .collect();

        if candidates.is_empty() {
            return None;
        }

        let maximizing = self.cost_model.preference.maximizes();
        let missing_rank = if maximizing {
            f32::NEG_INFINITY
        } else {
            f32::INFINITY
        };
        // Stable sort: equal final evaluations keep archive order.
        candidates.sort_by(|&a, &b| {
            let fa = self.archive.row(a).final_evaluation.unwrap_or(missing_rank);
            let fb = self.archive.row(b).final_evaluation.unwrap_or(missing_rank);
            let ordering = fa.partial_cmp(&fb).unwrap_or(Ordering::Equal);
            if maximizing {
                ordering.reverse()
            } else {
                ordering
            }
        });

        let scored: Vec<(usize, f32)> = if candidates.len() >= PARALLEL_SCORING_THRESHOLD {
            candidates
                .par_iter()
                .map(|&index| (index, self.cost_model.cost(self.archive, index)))
                .collect()
        } else {
            candidates
                .iter()
                .map(|&index| (index, self.cost_model.cost(self.archive, index)))
                .collect()
        };

        scored.into_iter().min_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        })
    }
}
