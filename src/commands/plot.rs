use super::scan::open_checked_reader;
use crate::cli::PlotArgs;
use crate::plot::{build_plots, scan_segments, RawSegment};
use crate::utils::{write_json, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::{collections::HashSet, fs::File, io::BufReader, path::Path};

/// Segment files hold either the per-locus map written by `scan` or a flat list.
#[derive(Deserialize)]
#[serde(untagged)]
enum SegmentFile {
    ByLocus(IndexMap<String, Vec<RawSegment>>),
    Flat(Vec<RawSegment>),
}

/// Loads segments from a JSON file, keeping the first copy of each segment.
fn read_segment_file(path: &Path) -> Result<Vec<RawSegment>> {
    let file = File::open(path).map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
    let parsed: SegmentFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("Invalid segment file {}: {}", path.display(), e))?;
    let all: Vec<RawSegment> = match parsed {
        SegmentFile::ByLocus(by_locus) => by_locus.into_values().flatten().collect(),
        SegmentFile::Flat(segments) => segments,
    };

    let mut seen = HashSet::new();
    let segments: Vec<RawSegment> = all.into_iter().filter(|s| seen.insert(s.clone())).collect();
    log::debug!("Loaded {} segments from {}", segments.len(), path.display());
    Ok(segments)
}

pub fn plot(args: PlotArgs) -> Result<()> {
    let segments = match (&args.reads_src, &args.segments_path) {
        (Some(reads_src), _) => {
            let mut reader = open_checked_reader(reads_src, &args.loci, args.extract.num_threads)?;
            scan_segments(&mut reader, &args.loci, &args.extract.scan_options())?
        }
        (None, Some(path)) => {
            if !args.loci.is_empty() {
                log::warn!("Loci are ignored when plotting from a segment file");
            }
            read_segment_file(path)?
        }
        (None, None) => return Err("Either a reads file or a segment file is required".into()),
    };
    log::info!("Plotting {} segments", segments.len());

    let plots = build_plots(&segments, &args.plot_options())?;
    log::info!("Built plots for {} chromosome(s)", plots.len());
    write_json(&plots, args.output_path.as_deref())
}
