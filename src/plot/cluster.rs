//! Grouping of segments into contiguous genomic windows.
//!
//! Large gaps between the places a read aligns to would squeeze a linear
//! x-axis into uselessness. Segments whose expanded intervals overlap,
//! directly or through other segments, are put in one cluster; every cluster
//! gets its own window on the axis and the gaps between clusters are dropped.
use super::{segment::RawSegment, union_find::UnionFind};
use itertools::Itertools;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    pub chrom: String,
    /// Smallest segment start
    pub min: i64,
    /// Largest segment end (exclusive)
    pub max: i64,
    /// Indices of the member segments in the clustered slice, ascending
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn span(&self) -> i64 {
        self.max - self.min
    }
}

fn overlaps(x: &RawSegment, y: &RawSegment) -> bool {
    let (x_begin, x_end) = x.expanded_bounds_x2();
    let (y_begin, y_end) = y.expanded_bounds_x2();
    x_begin <= y_end && y_begin <= x_end
}

/// Clusters segments of a single chromosome, ordered by ascending start.
/// Segments are compared pairwise.
pub fn cluster_segments(segments: &[RawSegment]) -> Vec<Cluster> {
    debug_assert!(
        segments.iter().map(|s| &s.chrom).all_equal(),
        "segments from several chromosomes clustered together"
    );

    let mut uf = UnionFind::new(segments.len());
    for (i, x) in segments.iter().enumerate() {
        for (j, y) in segments.iter().enumerate().skip(i + 1) {
            if overlaps(x, y) {
                uf.union(i, j);
            }
        }
    }

    let mut clusters: Vec<Cluster> = uf
        .groups()
        .into_iter()
        .map(|members| {
            let min = members.iter().map(|&i| segments[i].pos).min().unwrap_or_default();
            let max = members.iter().map(|&i| segments[i].end()).max().unwrap_or_default();
            Cluster {
                chrom: segments[members[0]].chrom.clone(),
                min,
                max,
                members,
            }
        })
        .collect();
    clusters.sort_by_key(|c| c.min);
    clusters
}
