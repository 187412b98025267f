/// Archive loading against on-disk partition fixtures: schema unification,
/// optional columns, and the storage error taxonomy.
use chess_dagger::{Archive, DaggerError};
use std::fs;
use std::path::Path;

fn write_partition(root: &Path, name: &str, contents: &str) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("data.csv"), contents).unwrap();
}

#[test]
fn loads_partitions_with_heterogeneous_schemas() {
    let tmp = tempfile::tempdir().unwrap();

    // Fully annotated partition, canonical column order
    write_partition(
        tmp.path(),
        "total_ply=20",
        "game_id,ply,board_sum,centipawn_evaluation,final_evaluation,pgn\n\
         1,0,1001,15.5,30.0,1. e4 e5 *\n\
         1,1,1002,-12.0,30.0,1. e4 e5 *\n",
    );

    // Not yet annotated: evaluation columns missing entirely, columns
    // reordered, and an extra column the reader must ignore
    write_partition(
        tmp.path(),
        "total_ply=24",
        "pgn,board_sum,game_id,ply,total_ply\n\
         1. d4 d5 *,2001,2,0,24\n\
         1. d4 d5 *,2002,2,1,24\n",
    );

    // Partially annotated: empty evaluation cells stay absent
    write_partition(
        tmp.path(),
        "total_ply=30",
        "game_id,ply,board_sum,centipawn_evaluation,pgn\n\
         3,0,3001,,1. c4 *\n\
         3,1,3002,44.0,1. c4 *\n",
    );

    let archive = Archive::load(tmp.path()).unwrap();
    assert_eq!(archive.len(), 6);

    // Partition order is sorted by path, so total_ply=20 rows come first
    assert_eq!(archive.row(0).game_id, 1);
    assert_eq!(archive.row(0).evaluation, Some(15.5));
    assert_eq!(archive.row(0).final_evaluation, Some(30.0));

    let game2_head = archive.index_of(2, 0).unwrap();
    assert_eq!(archive.row(game2_head).fingerprint, 2001);
    assert_eq!(archive.row(game2_head).evaluation, None);
    assert_eq!(archive.row(game2_head).final_evaluation, None);

    let game3_head = archive.index_of(3, 0).unwrap();
    assert_eq!(archive.row(game3_head).evaluation, None);
    assert_eq!(archive.successor_index(3, 0), Some(game3_head + 1));
    assert_eq!(archive.row(game3_head + 1).evaluation, Some(44.0));
}

#[test]
fn missing_required_column_is_a_schema_mismatch() {
    let tmp = tempfile::tempdir().unwrap();
    write_partition(
        tmp.path(),
        "total_ply=20",
        "game_id,ply,centipawn_evaluation,pgn\n1,0,15.5,1. e4 *\n",
    );

    match Archive::load(tmp.path()) {
        Err(DaggerError::SchemaMismatch { partition, detail }) => {
            assert_eq!(partition, "total_ply=20");
            assert!(detail.contains("board_sum"));
        }
        other => panic!("Expected SchemaMismatch, got {:?}", other.map(|a| a.len())),
    }
}

#[test]
fn incompatible_column_type_is_a_schema_mismatch() {
    let tmp = tempfile::tempdir().unwrap();
    write_partition(
        tmp.path(),
        "total_ply=20",
        "game_id,ply,board_sum,pgn\nnot_a_number,0,1001,1. e4 *\n",
    );

    assert!(matches!(
        Archive::load(tmp.path()),
        Err(DaggerError::SchemaMismatch { .. })
    ));
}

#[test]
fn empty_location_is_storage_unavailable() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(matches!(
        Archive::load(tmp.path()),
        Err(DaggerError::StorageUnavailable(_))
    ));

    assert!(matches!(
        Archive::load(tmp.path().join("does_not_exist")),
        Err(DaggerError::StorageUnavailable(_))
    ));
}

#[test]
fn loose_csv_files_count_as_partitions() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("backfill.csv"),
        "game_id,ply,board_sum,pgn\n9,0,9001,1. Nf3 *\n",
    )
    .unwrap();

    let archive = Archive::load(tmp.path()).unwrap();
    assert_eq!(archive.len(), 1);
    assert_eq!(archive.row(0).fingerprint, 9001);
}
