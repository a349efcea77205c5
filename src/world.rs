//! World-directory scan driver.
//!
//! Resolves each configured dimension to its region directory under the world
//! root, walks the `r.<x>.<z>.mca` files there, and runs the palette-first
//! search over every chunk slot. One broken file never aborts a scan; it is
//! logged and contributes nothing.

use crate::block_location::{BlockLocation, Dimension};
use crate::formats::region::RegionFile;
use crate::formats::section::decode_sections;
use crate::search::{
    MemorySink, RecordSink, SearchAccumulator, SectionOrigin, SectionOutcome, TargetSet,
};
use crate::{Error, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What to scan for and where.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Block ids to search for; bare ids get the `minecraft:` namespace.
    pub targets: Vec<String>,
    /// Dimension names to cover. Unknown names are warned about and skipped.
    #[serde(default = "default_dimensions")]
    pub dimensions: Vec<String>,
    /// Process region files across threads.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_dimensions() -> Vec<String> {
    vec![
        "overworld".to_string(),
        "nether".to_string(),
        "end".to_string(),
    ]
}

fn default_parallel() -> bool {
    true
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            targets: Vec::new(),
            dimensions: default_dimensions(),
            parallel: default_parallel(),
        }
    }
}

/// Aggregate counters for one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub files_scanned: usize,
    pub chunks_decoded: usize,
    pub sections_skipped: usize,
    pub matches: usize,
    pub duplicates_dropped: usize,
}

/// Scan a world directory for the configured target blocks, feeding each
/// unique match to `sink`.
pub fn scan_world(
    root: &Path,
    options: &ScanOptions,
    sink: &mut dyn RecordSink,
) -> Result<ScanReport> {
    if options.targets.is_empty() {
        return Err(Error::Config(
            "no target blocks configured; nothing to scan for".to_string(),
        ));
    }
    let targets = TargetSet::new(&options.targets);

    let mut dimensions = Vec::new();
    for name in &options.dimensions {
        match Dimension::from_name(name) {
            Some(dimension) => dimensions.push(dimension),
            None => log::warn!("unknown dimension '{}', skipping", name),
        }
    }

    let mut accumulator = SearchAccumulator::new();
    let mut report = ScanReport::default();

    for dimension in dimensions {
        let region_dir = root.join(dimension.region_subpath());
        let files = match region_files(&region_dir) {
            Ok(files) => files,
            Err(e) => {
                log::warn!(
                    "cannot list region directory {}: {}",
                    region_dir.display(),
                    e
                );
                continue;
            }
        };
        log::info!(
            "scanning {} region file(s) in {}",
            files.len(),
            region_dir.display()
        );

        if options.parallel {
            // Files are searched in parallel into private buffers; the merge
            // below is the single consumer, so dedup still sees every record
            // exactly once.
            let per_file: Vec<(ScanReport, Vec<BlockLocation>)> = files
                .par_iter()
                .map(|path| {
                    let mut file_report = ScanReport::default();
                    let mut local = MemorySink::default();
                    let mut local_acc = SearchAccumulator::new();
                    scan_file(path, dimension, &targets, &mut local_acc, &mut local, &mut file_report);
                    file_report.duplicates_dropped = local_acc.duplicates_dropped;
                    (file_report, local.records)
                })
                .collect();
            for (file_report, records) in per_file {
                report.files_scanned += file_report.files_scanned;
                report.chunks_decoded += file_report.chunks_decoded;
                report.sections_skipped += file_report.sections_skipped;
                report.duplicates_dropped += file_report.duplicates_dropped;
                for record in records {
                    accumulator.emit(record, sink);
                }
            }
        } else {
            for path in &files {
                scan_file(path, dimension, &targets, &mut accumulator, sink, &mut report);
            }
        }
    }

    report.matches = accumulator.seen_count();
    report.duplicates_dropped += accumulator.duplicates_dropped;
    Ok(report)
}

/// Scan one region file. Any failure is downgraded to a warning; the file
/// contributes zero results.
fn scan_file(
    path: &Path,
    dimension: Dimension,
    targets: &TargetSet,
    accumulator: &mut SearchAccumulator,
    sink: &mut dyn RecordSink,
    report: &mut ScanReport,
) {
    log::info!("scanning {}", path.display());
    let region = match RegionFile::open(path) {
        Ok(region) => region,
        Err(e) => {
            log::warn!("skipping {}: {}", path.display(), e);
            return;
        }
    };
    report.files_scanned += 1;

    for cz in 0..32u32 {
        for cx in 0..32u32 {
            let chunk = match region.chunk(cx, cz) {
                Ok(Some(chunk)) => chunk,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!(
                        "chunk ({}, {}) in {}: {}",
                        cx,
                        cz,
                        path.display(),
                        e
                    );
                    continue;
                }
            };
            report.chunks_decoded += 1;

            let (base_x, base_z) = region.chunk_origin(cx, cz);
            let origin = SectionOrigin {
                dimension,
                base_x,
                base_z,
                source: region.source.clone(),
            };
            for section in decode_sections(&chunk) {
                match crate::search::search_section(targets, &section, &origin, accumulator, sink) {
                    SectionOutcome::SkippedByPalette => report.sections_skipped += 1,
                    SectionOutcome::Matched(_) | SectionOutcome::DecodeFailed => {}
                }
            }
        }
    }
}

/// List `*.mca` files in a region directory, sorted for stable scan order.
fn region_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map(|e| e == "mca").unwrap_or(false) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_targets_is_config_error() {
        let options = ScanOptions::default();
        let mut sink = MemorySink::default();
        let result = scan_world(Path::new("/nonexistent"), &options, &mut sink);
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(sink.records.is_empty());
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ScanOptions =
            serde_json::from_str(r#"{"targets": ["diamond_ore"]}"#).unwrap();
        assert_eq!(options.targets, vec!["diamond_ore"]);
        assert_eq!(options.dimensions.len(), 3);
        assert!(options.parallel);
    }

    #[test]
    fn test_options_round_trip() {
        let options = ScanOptions {
            targets: vec!["minecraft:nether_portal".to_string()],
            dimensions: vec!["nether".to_string()],
            parallel: false,
        };
        let json = serde_json::to_string(&options).unwrap();
        let back: ScanOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.targets, options.targets);
        assert_eq!(back.dimensions, options.dimensions);
        assert!(!back.parallel);
    }

    #[test]
    fn test_missing_world_root_yields_empty_report() {
        let options = ScanOptions {
            targets: vec!["diamond_ore".to_string()],
            ..Default::default()
        };
        let mut sink = MemorySink::default();
        let report = scan_world(Path::new("/nonexistent"), &options, &mut sink).unwrap();
        assert_eq!(report, ScanReport::default());
        assert!(sink.records.is_empty());
    }
}
