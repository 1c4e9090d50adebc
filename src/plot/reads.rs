//! Per-read summaries: read extent, orientation and color.
use super::segment::{RawSegment, Strand};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy)]
pub struct GroupOptions {
    /// Keep reads that have a single segment
    pub include_singletons: bool,
    /// Flip reads whose leftmost segment is not their first in read order:
    /// a read is flipped unless some segment with `pos == start` also has
    /// `offset == begin`. With a single leftmost segment this is the same as
    /// flipping when that segment has `offset > begin`.
    pub enable_flipping: bool,
    /// Derive colors from the read name instead of the read's rank
    pub randomize_colors: bool,
}

impl Default for GroupOptions {
    fn default() -> Self {
        Self {
            include_singletons: false,
            enable_flipping: true,
            randomize_colors: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadInfo {
    /// Leftmost reference start over the read's segments
    pub start: i64,
    /// Read length as far as the segments reach (largest query end)
    pub length: u64,
    /// Smallest query offset
    pub begin: u32,
    pub flip: bool,
    /// Position of the read's color in `[0, 1)`
    pub color_index: f64,
}

impl ReadInfo {
    /// Read-space endpoints of a segment, in the order the segment is drawn
    /// along the reference. Reverse-strand segments run from their query end
    /// back to their query start.
    pub fn query_endpoints(&self, seg: &RawSegment) -> (i64, i64) {
        let (q_start, q_end) = (seg.offset as i64, seg.query_end() as i64);
        let (y1, y2) = match seg.strand {
            Strand::Forward => (q_start, q_end),
            Strand::Reverse => (q_end, q_start),
        };
        if self.flip {
            let length = self.length as i64;
            (length - y1, length - y2)
        } else {
            (y1, y2)
        }
    }

    pub fn is_read_start(&self, seg: &RawSegment) -> bool {
        seg.offset == self.begin
    }

    pub fn is_read_end(&self, seg: &RawSegment) -> bool {
        seg.query_end() == self.length
    }
}

pub type ReadInfoMap = IndexMap<String, ReadInfo>;

/// Summarizes the reads of one chromosome, in the order reads first appear.
///
/// Reads with a single segment are left out unless singletons are requested.
/// Rank colors spread the retained reads evenly over `[0, 1)`.
pub fn group_reads(segments: &[RawSegment], opts: &GroupOptions) -> ReadInfoMap {
    let mut by_read: IndexMap<&str, Vec<&RawSegment>> = IndexMap::new();
    for seg in segments {
        by_read.entry(seg.read_id.as_str()).or_default().push(seg);
    }

    let mut reads = ReadInfoMap::with_capacity(by_read.len());
    for (read_id, segs) in by_read {
        if segs.len() == 1 && !opts.include_singletons {
            continue;
        }
        let start = segs.iter().map(|s| s.pos).min().unwrap_or_default();
        let length = segs.iter().map(|s| s.query_end()).max().unwrap_or_default();
        let begin = segs.iter().map(|s| s.offset).min().unwrap_or_default();
        let leftmost_is_first = segs.iter().any(|s| s.pos == start && s.offset == begin);
        let flip = opts.enable_flipping && !leftmost_is_first;
        reads.insert(
            read_id.to_string(),
            ReadInfo {
                start,
                length,
                begin,
                flip,
                color_index: 0.0,
            },
        );
    }

    let n_reads = reads.len() as f64;
    for (rank, (read_id, info)) in reads.iter_mut().enumerate() {
        info.color_index = if opts.randomize_colors {
            hash_color(read_id)
        } else {
            rank as f64 / n_reads
        };
    }
    reads
}

/// Deterministic pseudo-random color position for a read name.
///
/// The name's UTF-16 code units go through a 64-bit multiply-add hash whose
/// bits are then folded, least significant first, into a binary fraction.
pub fn hash_color(read_id: &str) -> f64 {
    let mut hash: u64 = 50245149494948543;
    for unit in read_id.encode_utf16() {
        hash = hash
            .wrapping_mul(65978692084245217)
            .wrapping_add(237771813010709u64.wrapping_mul(unit as u64));
    }
    let mut value = 0.0;
    for _ in 0..64 {
        if hash & 1 == 1 {
            value += 1.0;
        }
        hash >>= 1;
        value /= 2.0;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::test_utils::make_segment;
    use approx::assert_relative_eq;

    #[test]
    fn flip_when_leftmost_segment_is_not_read_start() {
        let segments = vec![make_segment("R1", 100, 50, 0, 50), make_segment("R1", 100, 30, 60, 30)];
        let reads = group_reads(&segments, &GroupOptions::default());
        let info = &reads["R1"];
        assert_eq!(info.begin, 0);
        assert_eq!(info.start, 100);
        assert_eq!(info.length, 90);
        assert!(!info.flip);

        let segments = vec![make_segment("R1", 100, 30, 60, 30), make_segment("R1", 400, 50, 0, 50)];
        let reads = group_reads(&segments, &GroupOptions::default());
        assert!(reads["R1"].flip);

        let segments = vec![make_segment("R1", 100, 50, 0, 50), make_segment("R1", 300, 30, 60, 30)];
        let reads = group_reads(&segments, &GroupOptions::default());
        assert!(!reads["R1"].flip);

        let segments = vec![
            make_segment("R1", 100, 30, 60, 30),
            make_segment("R1", 100, 20, 30, 20),
            make_segment("R1", 300, 50, 0, 50),
        ];
        let reads = group_reads(&segments, &GroupOptions::default());
        assert!(reads["R1"].flip);
    }

    #[test]
    fn flipping_can_be_disabled() {
        let segments = vec![make_segment("R1", 100, 30, 60, 30), make_segment("R1", 300, 50, 0, 50)];
        let opts = GroupOptions {
            enable_flipping: false,
            ..Default::default()
        };
        assert!(!group_reads(&segments, &opts)["R1"].flip);
    }

    #[test]
    fn singletons_excluded_by_default() {
        let segments = vec![
            make_segment("solo", 10, 20, 0, 20),
            make_segment("pair", 10, 20, 0, 20),
            make_segment("pair", 500, 20, 20, 20),
        ];
        let reads = group_reads(&segments, &GroupOptions::default());
        assert!(!reads.contains_key("solo"));
        assert_eq!(reads.len(), 1);

        let opts = GroupOptions {
            include_singletons: true,
            ..Default::default()
        };
        let reads = group_reads(&segments, &opts);
        assert_eq!(reads.keys().collect::<Vec<_>>(), vec!["solo", "pair"]);
    }

    #[test]
    fn rank_colors_in_first_seen_order() {
        let segments: Vec<RawSegment> = ["c", "a", "c", "b", "a", "d", "b", "d"]
            .iter()
            .enumerate()
            .map(|(i, id)| make_segment(id, 100 * i as i64, 10, i as u32 * 10, 10))
            .collect();
        let reads = group_reads(&segments, &GroupOptions::default());
        let colors: Vec<(&str, f64)> = reads.iter().map(|(k, v)| (k.as_str(), v.color_index)).collect();
        assert_eq!(colors, vec![("c", 0.0), ("a", 0.25), ("b", 0.5), ("d", 0.75)]);
    }

    #[test]
    fn hash_colors_are_reproducible() {
        assert_eq!(hash_color("read1"), 0.807114198505937);
        assert_eq!(hash_color("m64011_190830_220126/1/ccs"), 0.941929087317964);
        assert_eq!(hash_color(""), 0.002723795011964108);

        let segments = vec![make_segment("read1", 10, 20, 0, 20), make_segment("read1", 90, 20, 20, 20)];
        let opts = GroupOptions {
            randomize_colors: true,
            ..Default::default()
        };
        assert_relative_eq!(group_reads(&segments, &opts)["read1"].color_index, 0.807114198505937);
    }

    #[test]
    fn query_endpoints_follow_strand_and_flip() {
        let mut seg = make_segment("R1", 100, 30, 10, 30);
        let mut info = ReadInfo {
            start: 100,
            length: 100,
            begin: 0,
            flip: false,
            color_index: 0.0,
        };
        assert_eq!(info.query_endpoints(&seg), (10, 40));
        seg.strand = Strand::Reverse;
        assert_eq!(info.query_endpoints(&seg), (40, 10));
        info.flip = true;
        assert_eq!(info.query_endpoints(&seg), (60, 90));
        assert!(!info.is_read_start(&seg));
        assert!(!info.is_read_end(&seg));
    }
}
