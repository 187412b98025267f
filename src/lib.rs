//! # Chess Dagger
//!
//! Guided continuation search over a partitioned archive of engine-analyzed
//! chess games. Given a position the user just reached (and the evaluation
//! they reached it with), the engine mines the archive for the best
//! five-half-move continuation other games demonstrate.
//!
//! The archive stores one row per half-move ever played: a positional
//! fingerprint ("board_sum"), a centipawn evaluation, and linkage back to
//! the originating game. The search ("Dagger") repeatedly filters the
//! archive to rows sharing the current fingerprint, scores every candidate
//! with a ridge-regularized cost function, records the minimum-cost row,
//! and advances to that row's successor position - five rounds in a row.
//!
//! ## Quick Start
//!
//! ```rust
//! use chess_dagger::{Archive, GuidedSearch, PositionRecord, Preference};
//!
//! // One archived game, twelve plies, flat evaluation
//! let rows: Vec<PositionRecord> = (0u32..12)
//!     .map(|ply| PositionRecord {
//!         game_id: 1,
//!         ply,
//!         fingerprint: 700 + ply as u64,
//!         evaluation: Some(25.0),
//!         final_evaluation: Some(25.0),
//!         pgn: "1. e4 e5 *".to_string(),
//!     })
//!     .collect();
//! let archive = Archive::from_records(rows);
//!
//! // Search from the position fingerprinted 700, targeting +25 for white
//! let outcome = GuidedSearch::new(&archive, 700, 25.0, Preference::White).run();
//! assert!(outcome.is_complete());
//! println!("Best line spans {} rounds", outcome.line.len());
//! ```
//!
//! For a real archive on disk, [`DaggerEngine`] wires the pieces together:
//! load the partitions once, parse the user's PGN, pick the learning moment,
//! and run the session.

// Core modules
pub mod errors;

// Re-export commonly used types
pub use errors::DaggerError;

pub mod archive;
pub mod cost;
pub mod dagger;
pub mod learning_moment;
pub mod oracle;
pub mod parser;

pub use archive::{Archive, PositionRecord};
pub use cost::{CostModel, Preference, DEFAULT_LAMBDA, DEFAULT_LOOKAHEAD};
pub use dagger::{GuidedSearch, LineEntry, SearchOutcome, StopReason, LINE_LENGTH};
pub use learning_moment::{select_learning_moment, LearningMoment, LEARNING_WINDOW_PLIES};
pub use oracle::{annotate_game, EvaluationOracle, MaterialOracle, UciEngineOracle, MATE_SCORE};
pub use parser::{fingerprint, parse_game, replay_mainline};

use errors::Result;
use std::path::Path;

/// Navigator-facing facade: one loaded archive snapshot plus the full
/// query pipeline (parse, pick the learning moment, search).
///
/// The snapshot is owned by the engine, not by any process-wide singleton,
/// so independent engines with different snapshots can coexist in one
/// process.
pub struct DaggerEngine {
    archive: Archive,
}

impl DaggerEngine {
    /// Load every partition under `storage_directory` into a fresh engine.
    pub fn load<P: AsRef<Path>>(storage_directory: P) -> Result<Self> {
        Ok(Self {
            archive: Archive::load(storage_directory)?,
        })
    }

    /// Wrap an already-built snapshot (tests, in-memory pipelines).
    pub fn from_archive(archive: Archive) -> Self {
        Self { archive }
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Run a search session branched from the sharpest evaluation swing in
    /// the user's already-parsed, already-annotated game.
    pub fn best_line(
        &self,
        user_positions: &[PositionRecord],
        preference: Preference,
    ) -> Result<SearchOutcome> {
        let moment = select_learning_moment(user_positions)?;
        let search = GuidedSearch::new(
            &self.archive,
            moment.fingerprint,
            moment.evaluation,
            preference,
        );
        Ok(search.run())
    }

    /// Full pipeline for raw PGN: parse the game, fill evaluations through
    /// the oracle, then search from the learning moment.
    pub fn best_line_for_game(
        &self,
        pgn: &str,
        oracle: &dyn EvaluationOracle,
        preference: Preference,
    ) -> Result<SearchOutcome> {
        let mut records = parse_game(pgn, 0)?;
        annotate_game(&mut records, oracle)?;
        self.best_line(&records, preference)
    }
}
