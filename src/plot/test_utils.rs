use super::{
    cigar::parse_cigar,
    scanner::{AlignmentRecord, AlignmentSource, RecordIter},
    segment::{RawSegment, Strand},
};
use crate::utils::Result;

/// Records held in memory, returned in insertion order when they overlap the
/// requested interval.
pub struct MemorySource {
    records: Vec<(String, AlignmentRecord)>,
}

impl MemorySource {
    pub fn new(records: Vec<(&str, AlignmentRecord)>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|(chrom, rec)| (chrom.to_string(), rec))
                .collect(),
        }
    }
}

fn ref_span(rec: &AlignmentRecord) -> i64 {
    let span: i64 = parse_cigar(&rec.cigar)
        .map(|ops| ops.iter().map(|op| op.ref_len() as i64).sum())
        .unwrap_or(0);
    span.max(1)
}

impl AlignmentSource for MemorySource {
    fn records_in(&mut self, chrom: &str, start: u64, end: u64) -> Result<RecordIter<'_>> {
        let (start, end) = (start as i64, end as i64);
        let iter = self
            .records
            .iter()
            .filter(move |(c, rec)| c == chrom && rec.pos < end && rec.pos + ref_span(rec) > start)
            .map(|(_, rec)| Ok(rec.clone()))
            .collect::<Vec<_>>();
        Ok(Box::new(iter.into_iter()))
    }
}

pub fn make_record(name: &str, pos: i64, cigar: &str) -> AlignmentRecord {
    AlignmentRecord {
        name: name.to_string(),
        pos,
        is_unmapped: false,
        is_secondary: false,
        is_reverse: false,
        cigar: cigar.to_string(),
        mapq: 60,
        sa_tag: None,
    }
}

impl AlignmentRecord {
    pub fn with_sa(mut self, sa_tag: &str) -> Self {
        self.sa_tag = Some(sa_tag.to_string());
        self
    }
}

pub fn make_segment(read_id: &str, pos: i64, rlen: u32, offset: u32, qlen: u32) -> RawSegment {
    RawSegment {
        read_id: read_id.to_string(),
        chrom: "chr1".to_string(),
        pos,
        strand: Strand::Forward,
        qual: 60,
        offset,
        rlen,
        qlen,
    }
}
