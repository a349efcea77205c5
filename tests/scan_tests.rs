mod common;

use common::{build_region, make_chunk, make_section, voxel_index};
use lodestone::{
    cluster_portals, scan_world, BlockState, Dimension, MemorySink, PortalAxis, ScanOptions,
};
use tempfile::TempDir;

fn air() -> BlockState {
    BlockState::new("minecraft:air")
}

/// A world root with one region file at the given dimension subpath.
fn world_with_region(subpath: &str, name: &str, data: &[u8]) -> TempDir {
    let root = TempDir::new().unwrap();
    let dir = root.path().join(subpath);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), data).unwrap();
    root
}

fn scan(root: &TempDir, options: &ScanOptions) -> (lodestone::ScanReport, MemorySink) {
    let mut sink = MemorySink::default();
    let report = scan_world(root.path(), options, &mut sink).unwrap();
    (report, sink)
}

#[test]
fn test_coordinate_mapping() {
    // Region (-1, 2), chunk (3, 10), section y=4, local (5, 0, 9).
    let palette = [air(), BlockState::new("minecraft:diamond_ore")];
    let mut indices = vec![0u16; 4096];
    indices[voxel_index(5, 0, 9)] = 1;
    let chunk = make_chunk(vec![make_section(4, &palette, Some(&indices))]);
    let data = build_region(&[((3, 10), chunk)]);
    let root = world_with_region("region", "r.-1.2.mca", &data);

    let options = ScanOptions {
        targets: vec!["diamond_ore".to_string()],
        dimensions: vec!["overworld".to_string()],
        parallel: false,
    };
    let (report, sink) = scan(&root, &options);

    assert_eq!(report.files_scanned, 1);
    assert_eq!(report.chunks_decoded, 1);
    assert_eq!(sink.records.len(), 1);
    let record = &sink.records[0];
    assert_eq!((record.x, record.y, record.z), (-459, 64, 1193));
    assert_eq!(record.dimension, Dimension::Overworld);
    assert_eq!(record.block, "minecraft:diamond_ore");
    assert_eq!(record.source_file, "r.-1.2.mca");
}

#[test]
fn test_palette_filter_skips_nonmatching_sections() {
    let stone = [BlockState::new("minecraft:stone")];
    let ore = [air(), BlockState::new("minecraft:diamond_ore")];
    let mut indices = vec![0u16; 4096];
    indices[0] = 1;
    let chunk = make_chunk(vec![
        make_section(0, &stone, None),
        make_section(1, &stone, None),
        make_section(2, &ore, Some(&indices)),
    ]);
    let data = build_region(&[((0, 0), chunk)]);
    let root = world_with_region("region", "r.0.0.mca", &data);

    let options = ScanOptions {
        targets: vec!["diamond_ore".to_string()],
        dimensions: vec!["overworld".to_string()],
        parallel: false,
    };
    let (report, sink) = scan(&root, &options);

    assert_eq!(report.sections_skipped, 2);
    assert_eq!(report.matches, 1);
    assert_eq!(sink.records.len(), 1);
    assert_eq!((sink.records[0].x, sink.records[0].y, sink.records[0].z), (0, 32, 0));
}

#[test]
fn test_target_normalization_is_equivalent() {
    let palette = [air(), BlockState::new("minecraft:diamond_ore")];
    let mut indices = vec![0u16; 4096];
    indices[voxel_index(1, 2, 3)] = 1;
    let chunk = make_chunk(vec![make_section(0, &palette, Some(&indices))]);
    let data = build_region(&[((0, 0), chunk)]);
    let root = world_with_region("region", "r.0.0.mca", &data);

    let mut results = Vec::new();
    for target in ["diamond_ore", "minecraft:diamond_ore"] {
        let options = ScanOptions {
            targets: vec![target.to_string()],
            dimensions: vec!["overworld".to_string()],
            parallel: false,
        };
        let (_, sink) = scan(&root, &options);
        results.push(sink.records);
    }
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0].len(), 1);
}

#[test]
fn test_unknown_dimension_is_skipped() {
    let palette = [BlockState::new("minecraft:diamond_ore")];
    let chunk = make_chunk(vec![make_section(0, &palette, None)]);
    let data = build_region(&[((0, 0), chunk)]);
    let root = world_with_region("region", "r.0.0.mca", &data);

    let options = ScanOptions {
        targets: vec!["diamond_ore".to_string()],
        dimensions: vec!["overworld".to_string(), "moon".to_string()],
        parallel: false,
    };
    let (report, sink) = scan(&root, &options);

    // The unknown name contributes nothing; the known one still scans.
    assert_eq!(report.files_scanned, 1);
    assert_eq!(sink.records.len(), 4096);
}

#[test]
fn test_nether_dimension_subpath() {
    let palette = [
        air(),
        BlockState::new("minecraft:nether_portal").with_property("axis", "z"),
    ];
    // A 2 wide x 3 tall portal plane at fixed local X=5.
    let mut indices = vec![0u16; 4096];
    for lz in 8..10 {
        for ly in 1..4 {
            indices[voxel_index(5, ly, lz)] = 1;
        }
    }
    let chunk = make_chunk(vec![make_section(4, &palette, Some(&indices))]);
    let data = build_region(&[((0, 0), chunk)]);
    let root = world_with_region("DIM-1/region", "r.0.0.mca", &data);

    let options = ScanOptions {
        targets: vec!["nether_portal".to_string()],
        dimensions: vec!["nether".to_string()],
        parallel: false,
    };
    let (report, sink) = scan(&root, &options);
    assert_eq!(report.matches, 6);
    assert!(sink.records.iter().all(|r| r.dimension == Dimension::Nether));

    let portals = cluster_portals(&sink.records);
    assert_eq!(portals.len(), 1);
    assert_eq!(portals[0].axis, PortalAxis::Z);
    assert_eq!(portals[0].anchor, (5, 65, 8));
    assert_eq!(portals[0].width, 2);
    assert_eq!(portals[0].height, 3);
    assert_eq!(portals[0].block_count, 6);
}

#[test]
fn test_parallel_and_sequential_agree() {
    let palette = [air(), BlockState::new("minecraft:ancient_debris")];
    let mut indices = vec![0u16; 4096];
    indices[voxel_index(0, 0, 0)] = 1;
    indices[voxel_index(15, 15, 15)] = 1;

    let root = TempDir::new().unwrap();
    let dir = root.path().join("region");
    std::fs::create_dir_all(&dir).unwrap();
    for name in ["r.0.0.mca", "r.1.0.mca"] {
        let chunk = make_chunk(vec![make_section(0, &palette, Some(&indices))]);
        let data = build_region(&[((0, 0), chunk)]);
        std::fs::write(dir.join(name), data).unwrap();
    }

    let mut results = Vec::new();
    for parallel in [false, true] {
        let options = ScanOptions {
            targets: vec!["ancient_debris".to_string()],
            dimensions: vec!["overworld".to_string()],
            parallel,
        };
        let (report, sink) = scan(&root, &options);
        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.matches, 4);
        assert_eq!(report.duplicates_dropped, 0);
        let mut records = sink.records;
        records.sort_by_key(|r| (r.x, r.y, r.z));
        results.push(records);
    }
    assert_eq!(results[0], results[1]);
}

#[test]
fn test_corrupt_file_is_skipped() {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("region");
    std::fs::create_dir_all(&dir).unwrap();
    // Too small for a header.
    std::fs::write(dir.join("r.0.0.mca"), vec![0u8; 64]).unwrap();

    let palette = [BlockState::new("minecraft:diamond_ore")];
    let chunk = make_chunk(vec![make_section(0, &palette, None)]);
    std::fs::write(dir.join("r.1.0.mca"), build_region(&[((0, 0), chunk)])).unwrap();

    let options = ScanOptions {
        targets: vec!["diamond_ore".to_string()],
        dimensions: vec!["overworld".to_string()],
        parallel: false,
    };
    let (report, sink) = scan(&root, &options);
    assert_eq!(report.files_scanned, 1);
    assert_eq!(sink.records.len(), 4096);
}
