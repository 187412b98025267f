use crate::archive::PositionRecord;
use crate::errors::{DaggerError, Result};
use chess::{Board, Color, Game, MoveGen, Piece};
use pgn_reader::{BufferedReader, RawHeader, SanPlus, Skip, Visitor};

/// Per-plane multipliers for the position fingerprint. Without them the sum
/// of the twelve piece bitboards would collapse same-square pieces of
/// different kinds or colors into the same hash.
const PLANE_SALTS: [u64; 12] = [
    0x9e3779b97f4a7c15,
    0xc2b2ae3d27d4eb4f,
    0x165667b19e3779f9,
    0x27d4eb2f165667c5,
    0x85ebca6b2b2ae35d,
    0xd6e8feb86659fd93,
    0xa0761d6478bd642f,
    0xe7037ed1a0b428db,
    0x8ebc6af09c88c6e3,
    0x589965cc75374cc3,
    0x1d8e4e27c47d124f,
    0xeb44accab455d165,
];

const SIDE_TO_MOVE_SALT: u64 = 0x2545f4914f6cdd1d;

const PIECE_PLANES: [Piece; 6] = [
    Piece::Pawn,
    Piece::Knight,
    Piece::Bishop,
    Piece::Rook,
    Piece::Queen,
    Piece::King,
];

/// Integer hash of a board's piece placement plus side to move.
///
/// This is the "board_sum" join key of the archive: identical positions
/// always hash identically, whichever game or ply they were reached from.
pub fn fingerprint(board: &Board) -> u64 {
    let mut sum: u64 = 0;
    let mut plane = 0;

    for piece in PIECE_PLANES {
        for color in [Color::White, Color::Black] {
            let bitboard = board.pieces(piece) & board.color_combined(color);
            sum = sum.wrapping_add(bitboard.0.wrapping_mul(PLANE_SALTS[plane]));
            plane += 1;
        }
    }

    if board.side_to_move() == Color::Black {
        sum = sum.wrapping_add(SIDE_TO_MOVE_SALT);
    }

    sum
}

/// PGN game visitor that replays the mainline and records the board after
/// every half-move. Variations are skipped; illegal or unparsable moves end
/// the usable mainline silently.
struct MainlineRecorder {
    game: Game,
    boards: Vec<Board>,
    halted: bool,
}

impl MainlineRecorder {
    fn new() -> Self {
        Self {
            game: Game::new(),
            boards: Vec::new(),
            halted: false,
        }
    }
}

impl Visitor for MainlineRecorder {
    type Result = ();

    fn begin_game(&mut self) {
        self.game = Game::new();
        self.boards.clear();
        self.halted = false;
    }

    fn header(&mut self, _key: &[u8], _value: RawHeader<'_>) {}

    fn san(&mut self, san_plus: SanPlus) {
        if self.halted {
            return;
        }

        let san_str = san_plus.san.to_string();
        let current_pos = self.game.current_position();

        match chess::ChessMove::from_san(&current_pos, &san_str) {
            Ok(chess_move) => {
                let legal_moves: Vec<chess::ChessMove> = MoveGen::new_legal(&current_pos).collect();
                if legal_moves.contains(&chess_move) && self.game.make_move(chess_move) {
                    self.boards.push(self.game.current_position());
                } else {
                    self.halted = true;
                }
            }
            Err(_) => {
                self.halted = true;
            }
        }
    }

    fn begin_variation(&mut self) -> Skip {
        Skip(true)
    }

    fn end_game(&mut self) -> Self::Result {}
}

/// Replay a single game's mainline, returning the board after each half-move.
pub fn replay_mainline(pgn: &str) -> Result<Vec<Board>> {
    let cursor = std::io::Cursor::new(pgn);
    let mut reader = BufferedReader::new(cursor);
    let mut recorder = MainlineRecorder::new();

    reader
        .read_game(&mut recorder)
        .map_err(|e| DaggerError::InvalidGame(e.to_string()))?;

    if recorder.boards.is_empty() {
        return Err(DaggerError::InvalidGame(
            "movetext yielded no legal mainline moves".to_string(),
        ));
    }

    Ok(recorder.boards)
}

/// Parse one game's movetext into an ordered sequence of position records.
///
/// Ply 0 is the position after the first half-move. Evaluations are left
/// absent; the annotation pass (see `oracle`) fills them in later.
pub fn parse_game(pgn: &str, game_id: u32) -> Result<Vec<PositionRecord>> {
    let boards = replay_mainline(pgn)?;

    let records = boards
        .iter()
        .enumerate()
        .map(|(ply, board)| PositionRecord {
            game_id,
            ply: ply as u32,
            fingerprint: fingerprint(board),
            evaluation: None,
            final_evaluation: None,
            pgn: pgn.to_string(),
        })
        .collect();

    Ok(records)
}
