use crate::archive::PositionRecord;
use crate::errors::{DaggerError, Result};
use crate::parser::replay_mainline;
use chess::{Board, Color, Piece};
use std::process::{Command, Stdio};

/// Centipawn band reserved for mate encodings: `score mate n` maps to
/// `sign * (MATE_SCORE - |n|)`. These values collide with the centipawn
/// scale in magnitude terms, which is exactly the confound the
/// learning-moment window truncation works around.
pub const MATE_SCORE: f32 = 100_000.0;

/// Opaque scoring oracle: the search never cares how a board turns into a
/// signed centipawn value, only that the same board always scores the same.
pub trait EvaluationOracle {
    /// White-positive centipawn estimate for the position.
    fn evaluate(&self, board: &Board) -> Result<f32>;
}

/// Deterministic material-count oracle. Useful for demos and tests where a
/// real engine subprocess is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialOracle;

impl MaterialOracle {
    const PIECE_VALUES: [(Piece, f32); 5] = [
        (Piece::Pawn, 100.0),
        (Piece::Knight, 320.0),
        (Piece::Bishop, 330.0),
        (Piece::Rook, 500.0),
        (Piece::Queen, 900.0),
    ];
}

impl EvaluationOracle for MaterialOracle {
    fn evaluate(&self, board: &Board) -> Result<f32> {
        let mut score = 0.0;
        for (piece, value) in Self::PIECE_VALUES {
            let white = (board.pieces(piece) & board.color_combined(Color::White)).popcnt();
            let black = (board.pieces(piece) & board.color_combined(Color::Black)).popcnt();
            score += value * (white as f32 - black as f32);
        }
        Ok(score)
    }
}

/// UCI engine subprocess oracle, one process per evaluation.
///
/// Spawning per position is slow but keeps the oracle stateless, which is
/// what lets the bulk annotation pass fan games out over rayon.
pub struct UciEngineOracle {
    engine_path: String,
    depth: u8,
}

impl UciEngineOracle {
    pub fn new(engine_path: impl Into<String>, depth: u8) -> Self {
        Self {
            engine_path: engine_path.into(),
            depth,
        }
    }
}

impl EvaluationOracle for UciEngineOracle {
    fn evaluate(&self, board: &Board) -> Result<f32> {
        let mut child = Command::new(&self.engine_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                DaggerError::EvaluationError(format!("failed to spawn {}: {}", self.engine_path, e))
            })?;

        {
            let stdin = child.stdin.as_mut().ok_or_else(|| {
                DaggerError::EvaluationError("failed to open engine stdin".to_string())
            })?;
            let fen = board.to_string();

            use std::io::Write;
            writeln!(stdin, "uci")?;
            writeln!(stdin, "isready")?;
            writeln!(stdin, "position fen {fen}")?;
            writeln!(stdin, "go depth {}", self.depth)?;
            writeln!(stdin, "quit")?;
        }

        let output = child.wait_with_output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        // The last info line before bestmove carries the deepest score.
        let mut evaluation = None;
        for line in stdout.lines() {
            if !line.starts_with("info") {
                continue;
            }
            if let Some(score) = parse_uci_score(line) {
                evaluation = Some(score);
            }
        }

        // UCI scores are from the side to move; normalize to white-positive.
        evaluation
            .map(|score| {
                if board.side_to_move() == Color::Black {
                    -score
                } else {
                    score
                }
            })
            .ok_or_else(|| {
                DaggerError::EvaluationError(format!(
                    "no score in output of {}",
                    self.engine_path
                ))
            })
    }
}

/// Extract a centipawn score from a UCI `info` line, mapping mate distances
/// into the reserved MATE_SCORE band.
fn parse_uci_score(line: &str) -> Option<f32> {
    let mut tokens = line.split_whitespace().peekable();
    while let Some(token) = tokens.next() {
        if token != "score" {
            continue;
        }
        return match (tokens.next(), tokens.next()) {
            (Some("cp"), Some(value)) => value.parse::<f32>().ok(),
            (Some("mate"), Some(value)) => {
                let moves = value.parse::<f32>().ok()?;
                Some(moves.signum() * (MATE_SCORE - moves.abs()))
            }
            _ => None,
        };
    }
    None
}

/// Fill missing evaluations for a single game's records and stamp every row
/// with the game's final evaluation.
///
/// The boards are replayed once from the game's movetext; the record
/// sequence must match the mainline it was parsed from. Returns how many
/// rows were newly evaluated.
pub fn annotate_game(
    records: &mut [PositionRecord],
    oracle: &dyn EvaluationOracle,
) -> Result<usize> {
    let Some(first) = records.first() else {
        return Ok(0);
    };
    let boards = replay_mainline(&first.pgn)?;
    if boards.len() < records.len() {
        return Err(DaggerError::InvalidGame(format!(
            "game {} movetext replays {} plies but the archive holds {}",
            first.game_id,
            boards.len(),
            records.len()
        )));
    }

    let mut evaluated = 0;
    for (record, board) in records.iter_mut().zip(boards.iter()) {
        if record.evaluation.is_none() {
            record.evaluation = Some(oracle.evaluate(board)?);
            evaluated += 1;
        }
    }

    let final_evaluation = records.iter().rev().find_map(|r| r.evaluation);
    for record in records.iter_mut() {
        record.final_evaluation = final_evaluation;
    }

    Ok(evaluated)
}
