pub mod cigar;
pub mod cluster;
pub mod layout;
pub mod model;
pub mod reads;
pub mod scanner;
pub mod segment;
mod union_find;

#[cfg(test)]
pub(crate) mod test_utils;

pub use cluster::{cluster_segments, Cluster};
pub use layout::{layout, LayoutParams, LayoutSlot};
pub use model::{build_plots, ChromPlot, PlacedSegment, PlotOptions, Window};
pub use reads::{group_reads, hash_color, GroupOptions, ReadInfo, ReadInfoMap};
pub use scanner::{scan_segments, AlignmentRecord, AlignmentSource, ScanOptions, DEFAULT_MAX_READS};
pub use segment::{RawSegment, Strand};
