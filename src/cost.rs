use crate::archive::Archive;
use std::str::FromStr;

/// Number of consecutive archive rows averaged when scoring a candidate.
pub const DEFAULT_LOOKAHEAD: usize = 10;

/// Ridge regularization strength for the cost function.
pub const DEFAULT_LAMBDA: f32 = 0.01;

/// Which side the user wants the continuation to favor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    White,
    Black,
}

impl Preference {
    /// True when the preference favors maximal (white-positive) evaluations.
    pub fn maximizes(&self) -> bool {
        matches!(self, Preference::White)
    }
}

impl FromStr for Preference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "white" => Ok(Preference::White),
            "black" => Ok(Preference::Black),
            other => Err(format!("unknown preference '{}', expected white or black", other)),
        }
    }
}

/// Ridge-regularized divergence between a candidate continuation's average
/// evaluation and the user's target evaluation.
///
/// cost = (mean - target)^2 / lookahead + lambda * mean^2
///
/// The lambda term biases the search away from continuations whose window
/// average sits in the extreme-magnitude band (near-mate scores), trading a
/// small bias for robustness against single noisy evaluations.
#[derive(Debug, Clone, Copy)]
pub struct CostModel {
    pub target_evaluation: f32,
    pub preference: Preference,
    pub lookahead: usize,
    pub lambda: f32,
}

impl CostModel {
    pub fn new(target_evaluation: f32, preference: Preference) -> Self {
        Self {
            target_evaluation,
            preference,
            lookahead: DEFAULT_LOOKAHEAD,
            lambda: DEFAULT_LAMBDA,
        }
    }

    pub fn with_lookahead(mut self, lookahead: usize) -> Self {
        assert!(lookahead > 0, "lookahead must be at least 1");
        self.lookahead = lookahead;
        self
    }

    pub fn with_lambda(mut self, lambda: f32) -> Self {
        self.lambda = lambda;
        self
    }

    /// Score the candidate row at `start_index`.
    ///
    /// The window covers the candidate row and the rows following it in
    /// archive order, `lookahead` rows in total. A candidate within
    /// `lookahead - 1` rows of the archive end averages only the rows that
    /// exist; the squared-error divisor stays the configured lookahead
    /// either way. Missing evaluations inside the window count as zero.
    pub fn cost(&self, archive: &Archive, start_index: usize) -> f32 {
        let end = (start_index + self.lookahead).min(archive.len());
        let window = &archive.rows()[start_index..end];

        let mut mean = window
            .iter()
            .map(|record| record.evaluation.unwrap_or(0.0))
            .sum::<f32>()
            / window.len() as f32;

        if !self.preference.maximizes() {
            mean = -mean;
        }

        let mse_term = (mean - self.target_evaluation).powi(2) / self.lookahead as f32;
        let reg_term = self.lambda * mean * mean;
        mse_term + reg_term
    }
}
