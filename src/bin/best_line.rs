use chess_dagger::{DaggerEngine, MaterialOracle, Preference, UciEngineOracle};
use std::env;
use std::fs;
use std::process::ExitCode;
use std::str::FromStr;

fn main() -> ExitCode {
    println!("Chess Dagger - Best Continuation Finder");
    println!("=======================================");

    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        println!("Usage: {} <archive_dir> <pgn_file> [white|black]", args[0]);
        println!(
            "Example: {} Games/Storage my_game.pgn white",
            args[0]
        );
        return ExitCode::FAILURE;
    }

    let preference = if args.len() > 3 {
        match Preference::from_str(&args[3]) {
            Ok(preference) => preference,
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        Preference::White
    };

    let engine = match DaggerEngine::load(&args[1]) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Failed to load archive: {}", e);
            return ExitCode::FAILURE;
        }
    };
    println!(
        "Archive ready: {} positions across {} games",
        engine.archive().len(),
        engine.archive().game_count()
    );

    let pgn = match fs::read_to_string(&args[2]) {
        Ok(pgn) => pgn,
        Err(e) => {
            eprintln!("Failed to read {}: {}", args[2], e);
            return ExitCode::FAILURE;
        }
    };

    // Prefer a real engine when one is on PATH; fall back to material count
    let outcome = match env::var("DAGGER_ENGINE") {
        Ok(engine_path) => {
            println!("Evaluating user game with {}", engine_path);
            let oracle = UciEngineOracle::new(engine_path, 12);
            engine.best_line_for_game(&pgn, &oracle, preference)
        }
        Err(_) => {
            println!("DAGGER_ENGINE not set, using material-count evaluations");
            engine.best_line_for_game(&pgn, &MaterialOracle, preference)
        }
    };

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Search failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!();
    for entry in &outcome.line {
        println!(
            "Round {}: game {} at ply {} (cost {:.3})",
            entry.round, entry.record.game_id, entry.ply, entry.cost
        );
    }
    if outcome.is_complete() {
        println!("Found a full 5-move continuation");
    } else {
        println!(
            "Stopped early after {} round(s): {:?}",
            outcome.line.len(),
            outcome.stop
        );
    }

    ExitCode::SUCCESS
}
