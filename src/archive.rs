use crate::errors::{DaggerError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Columns every partition must declare; evaluation columns are optional
/// because the engine-annotation pass runs after games are first stored.
pub const REQUIRED_COLUMNS: [&str; 4] = ["game_id", "ply", "board_sum", "pgn"];

/// One archived half-move: the position fingerprint after the ply, its
/// engine evaluation, and enough linkage to rebuild the originating game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub game_id: u32,
    /// Zero-based half-move index within the game
    pub ply: u32,
    /// Position hash after this ply; identical positions share it across games
    #[serde(rename = "board_sum")]
    pub fingerprint: u64,
    /// Centipawn evaluation; None until the annotation pass has run
    #[serde(rename = "centipawn_evaluation", default)]
    pub evaluation: Option<f32>,
    /// Evaluation at the end of the originating game
    #[serde(default)]
    pub final_evaluation: Option<f32>,
    /// Movetext reconstructing the originating game from move zero
    pub pgn: String,
}

/// Immutable in-memory snapshot of the position archive, indexed for
/// equality lookup by fingerprint and by (game_id, ply).
///
/// A snapshot is loaded once per search session and never mutated while a
/// session is running; concurrent sessions may each own their own snapshot.
#[derive(Debug, Clone)]
pub struct Archive {
    rows: Vec<PositionRecord>,
    by_fingerprint: HashMap<u64, Vec<usize>>,
    by_game_ply: HashMap<(u32, u32), usize>,
}

impl Archive {
    /// Read every partition under `storage_directory` into a single snapshot.
    ///
    /// A partition is either a subdirectory containing a `data.csv` or a
    /// loose `*.csv` file directly under the location. Partitions may
    /// declare their columns in any order and may omit the optional
    /// evaluation columns entirely; unknown columns are ignored.
    pub fn load<P: AsRef<Path>>(storage_directory: P) -> Result<Self> {
        let root = storage_directory.as_ref();
        let partitions = discover_partitions(root)?;

        if partitions.is_empty() {
            return Err(DaggerError::StorageUnavailable(format!(
                "no partitions found under {}",
                root.display()
            )));
        }

        let pb = ProgressBar::new(partitions.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} Loading partitions")
                .unwrap()
                .progress_chars("#>-"),
        );

        // Partitions are independent, so parse them in parallel; the sorted
        // partition order from discovery defines the archive row order.
        let parsed: Vec<Result<Vec<PositionRecord>>> = partitions
            .par_iter()
            .map(|path| {
                let records = read_partition(path);
                pb.inc(1);
                records
            })
            .collect();
        pb.finish_with_message("Partitions loaded");

        let mut rows = Vec::new();
        for partition_rows in parsed {
            rows.extend(partition_rows?);
        }

        println!(
            "Loaded {} positions from {} partitions",
            rows.len(),
            partitions.len()
        );

        Ok(Self::from_records(rows))
    }

    /// Build a snapshot directly from records, preserving their order as
    /// the archive order used for deterministic tie-breaking.
    pub fn from_records(rows: Vec<PositionRecord>) -> Self {
        let mut by_fingerprint: HashMap<u64, Vec<usize>> = HashMap::new();
        let mut by_game_ply: HashMap<(u32, u32), usize> = HashMap::new();

        for (index, record) in rows.iter().enumerate() {
            by_fingerprint
                .entry(record.fingerprint)
                .or_default()
                .push(index);
            by_game_ply.insert((record.game_id, record.ply), index);
        }

        Self {
            rows,
            by_fingerprint,
            by_game_ply,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[PositionRecord] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &PositionRecord {
        &self.rows[index]
    }

    /// Row indices sharing a fingerprint, in original archive order.
    pub fn candidates(&self, fingerprint: u64) -> &[usize] {
        self.by_fingerprint
            .get(&fingerprint)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Index of the record at `(game_id, ply)`, if the archive holds one.
    pub fn index_of(&self, game_id: u32, ply: u32) -> Option<usize> {
        self.by_game_ply.get(&(game_id, ply)).copied()
    }

    /// Index of the successor record `(game_id, ply + 1)`. None means the
    /// game ended at `ply`.
    pub fn successor_index(&self, game_id: u32, ply: u32) -> Option<usize> {
        self.index_of(game_id, ply + 1)
    }

    /// Number of distinct games represented in the snapshot.
    pub fn game_count(&self) -> usize {
        let mut game_ids: Vec<u32> = self.rows.iter().map(|r| r.game_id).collect();
        game_ids.sort_unstable();
        game_ids.dedup();
        game_ids.len()
    }
}

/// Collect partition CSV paths under the storage root, sorted by path so
/// that archive row order is stable across loads.
fn discover_partitions(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(root).map_err(|e| {
        DaggerError::StorageUnavailable(format!("{}: {}", root.display(), e))
    })?;

    let mut partitions = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            DaggerError::StorageUnavailable(format!("{}: {}", root.display(), e))
        })?;
        let path = entry.path();

        if path.is_dir() {
            let data_file = path.join("data.csv");
            if data_file.is_file() {
                partitions.push(data_file);
            }
        } else if path.extension().map(|ext| ext == "csv").unwrap_or(false) {
            partitions.push(path);
        }
    }

    partitions.sort();
    Ok(partitions)
}

fn partition_name(path: &Path) -> String {
    // Directory partitions report the directory name, loose files their own
    let name = if path.file_name().map(|n| n == "data.csv").unwrap_or(false) {
        path.parent().and_then(|p| p.file_name())
    } else {
        path.file_name()
    };
    name.map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_partition(path: &Path) -> Result<Vec<PositionRecord>> {
    let name = partition_name(path);

    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        DaggerError::StorageUnavailable(format!("{}: {}", path.display(), e))
    })?;

    // Validate the declared schema up front so a missing required column is
    // reported as a schema problem, not as a row-level parse failure.
    let headers = reader
        .headers()
        .map_err(|e| DaggerError::SchemaMismatch {
            partition: name.clone(),
            detail: e.to_string(),
        })?
        .clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(DaggerError::SchemaMismatch {
                partition: name.clone(),
                detail: format!("missing required column '{}'", column),
            });
        }
    }

    let mut records = Vec::new();
    for row in reader.deserialize::<PositionRecord>() {
        let record = row.map_err(|e| DaggerError::SchemaMismatch {
            partition: name.clone(),
            detail: e.to_string(),
        })?;
        records.push(record);
    }

    Ok(records)
}
