use chess_dagger::{annotate_game, Archive, MaterialOracle, PositionRecord, UciEngineOracle};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

/// Fill missing centipawn evaluations across an archive and write the
/// revised partitions to a new location.
#[derive(Parser)]
#[command(name = "annotate_archive")]
struct Args {
    /// Directory containing the original archive partitions
    archive_dir: PathBuf,

    /// Directory to write revised partitions into
    output_dir: PathBuf,

    /// Path to a UCI engine binary; omit to use material-count evaluations
    #[arg(long)]
    engine: Option<String>,

    /// Engine search depth per position
    #[arg(long, default_value_t = 12)]
    depth: u8,

    /// Worker threads for per-game evaluation
    #[arg(long, default_value_t = 0)]
    threads: usize,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let threads = if args.threads == 0 {
        num_cpus::get().min(16)
    } else {
        args.threads
    };
    println!("Annotating archive with {} worker threads", threads);

    let pool = match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Failed to build thread pool: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let archive = match Archive::load(&args.archive_dir) {
        Ok(archive) => archive,
        Err(e) => {
            eprintln!("Failed to load archive: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Group rows by game so each game replays its movetext exactly once.
    let mut games: BTreeMap<u32, Vec<PositionRecord>> = BTreeMap::new();
    for record in archive.rows() {
        games.entry(record.game_id).or_default().push(record.clone());
    }

    let pb = ProgressBar::new(games.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} Annotating games")
            .unwrap()
            .progress_chars("#>-"),
    );

    let engine_path = args.engine.clone();
    let depth = args.depth;
    let annotated: Vec<(u32, Result<Vec<PositionRecord>, String>)> = pool.install(|| {
        games
            .into_par_iter()
            .map(|(game_id, mut records)| {
                let result = match &engine_path {
                    Some(path) => {
                        let oracle = UciEngineOracle::new(path.clone(), depth);
                        annotate_game(&mut records, &oracle)
                    }
                    None => annotate_game(&mut records, &MaterialOracle),
                };
                pb.inc(1);
                match result {
                    Ok(_) => (game_id, Ok(records)),
                    Err(e) => (game_id, Err(e.to_string())),
                }
            })
            .collect()
    });
    pb.finish_with_message("Annotation complete");

    let mut rows = Vec::new();
    let mut failed = 0usize;
    for (game_id, result) in annotated {
        match result {
            Ok(records) => rows.extend(records),
            Err(e) => {
                eprintln!("Game {}: {}", game_id, e);
                failed += 1;
            }
        }
    }

    if let Err(e) = write_partition(&args.output_dir, &rows) {
        eprintln!("Failed to write revised partition: {}", e);
        return ExitCode::FAILURE;
    }

    println!(
        "Wrote {} rows to {} ({} game(s) failed)",
        rows.len(),
        args.output_dir.display(),
        failed
    );
    ExitCode::SUCCESS
}

fn write_partition(
    output_dir: &PathBuf,
    rows: &[PositionRecord],
) -> Result<(), Box<dyn std::error::Error>> {
    let partition_dir = output_dir.join("partition=0");
    fs::create_dir_all(&partition_dir)?;

    let mut writer = csv::Writer::from_path(partition_dir.join("data.csv"))?;
    for record in rows {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
