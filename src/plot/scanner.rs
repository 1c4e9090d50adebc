//! Collects the aligned segments of split reads found at a set of loci.
//!
//! Every primary record overlapping a locus contributes its own alignment and
//! every alignment listed in its SA tag, so segments mapped far away from the
//! locus are still reported. The same alignment is usually seen several times
//! (as a record and in the SA tag of its mates); segments are deduplicated on
//! their full identity.
use super::{
    cigar::decode_pieces,
    segment::{RawSegment, Strand},
};
use crate::utils::{Locus, Result};
use rust_htslib::bam::{self, record::Aux, Read};
use indexmap::IndexMap;
use std::collections::HashSet;

pub const DEFAULT_MAX_READS: usize = 200;

/// The record fields segment extraction depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRecord {
    pub name: String,
    /// 0-based reference start
    pub pos: i64,
    pub is_unmapped: bool,
    pub is_secondary: bool,
    pub is_reverse: bool,
    pub cigar: String,
    pub mapq: u8,
    /// Raw SA tag value: `chrom,pos,strand,cigar,mapq,nm;` entries
    pub sa_tag: Option<String>,
}

impl AlignmentRecord {
    pub fn from_hts_rec(rec: &bam::Record) -> AlignmentRecord {
        let sa_tag = match rec.aux(b"SA") {
            Ok(Aux::String(value)) => Some(value.to_string()),
            _ => None,
        };
        AlignmentRecord {
            name: String::from_utf8_lossy(rec.qname()).into_owned(),
            pos: rec.pos(),
            is_unmapped: rec.is_unmapped(),
            is_secondary: rec.is_secondary(),
            is_reverse: rec.is_reverse(),
            cigar: rec.cigar().to_string(),
            mapq: rec.mapq(),
            sa_tag,
        }
    }
}

pub type RecordIter<'a> = Box<dyn Iterator<Item = Result<AlignmentRecord>> + 'a>;

/// A stream of alignment records overlapping a reference interval.
pub trait AlignmentSource {
    /// Records overlapping the 0-based half-open interval `[start, end)`.
    fn records_in(&mut self, chrom: &str, start: u64, end: u64) -> Result<RecordIter<'_>>;
}

impl AlignmentSource for bam::IndexedReader {
    fn records_in(&mut self, chrom: &str, start: u64, end: u64) -> Result<RecordIter<'_>> {
        self.fetch((chrom, start as i64, end as i64))
            .map_err(|e| format!("BAM fetch error for {}:{}-{}: {}", chrom, start, end, e))?;
        let iter = self.records().map(|result| {
            result
                .map(|rec| AlignmentRecord::from_hts_rec(&rec))
                .map_err(|e| format!("Error reading BAM record: {}", e))
        });
        Ok(Box::new(iter))
    }
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Maximum records examined per locus; 0 means unlimited
    pub max_reads: usize,
    /// Split alignments at insertions/deletions at least this long
    pub split_indels: Option<u32>,
    /// Only scan this many bases around each end of a locus
    pub border: Option<u64>,
    /// Look up the record behind every SA entry and use its own CIGAR
    pub deep: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_reads: DEFAULT_MAX_READS,
            split_indels: None,
            border: None,
            deep: false,
        }
    }
}

/// One alignment of a read, either from a record or from an SA entry.
#[derive(Debug, PartialEq)]
struct Observation<'a> {
    chrom: &'a str,
    /// 1-based
    pos: i64,
    strand: Strand,
    cigar: &'a str,
    qual: u8,
}

fn parse_sa_entry(entry: &str) -> Result<Observation<'_>> {
    let fields: Vec<&str> = entry.split(',').collect();
    if fields.len() < 5 {
        return Err(format!(
            "Expected at least 5 fields in SA entry 'chrom,pos,strand,cigar,mapq', found {}: {}",
            fields.len(),
            entry
        ));
    }
    let pos = fields[1]
        .parse()
        .map_err(|_| format!("Invalid position '{}' in SA entry: {}", fields[1], entry))?;
    let strand = fields[2].parse()?;
    let qual = fields[4]
        .parse()
        .map_err(|_| format!("Invalid mapping quality '{}' in SA entry: {}", fields[4], entry))?;
    Ok(Observation {
        chrom: fields[0],
        pos,
        strand,
        cigar: fields[3],
        qual,
    })
}

fn own_observation<'a>(chrom: &'a str, rec: &'a AlignmentRecord) -> Observation<'a> {
    Observation {
        chrom,
        pos: rec.pos + 1,
        strand: Strand::from_is_reverse(rec.is_reverse),
        cigar: &rec.cigar,
        qual: rec.mapq,
    }
}

fn sa_observations(rec: &AlignmentRecord) -> Vec<Observation<'_>> {
    let Some(sa_tag) = &rec.sa_tag else {
        return Vec::new();
    };
    sa_tag
        .split(';')
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match parse_sa_entry(entry) {
            Ok(obs) => Some(obs),
            Err(e) => {
                log::debug!("Skipping SA entry of read {}: {}", rec.name, e);
                None
            }
        })
        .collect()
}

fn observations<'a>(chrom: &'a str, rec: &'a AlignmentRecord) -> Vec<Observation<'a>> {
    let mut items = vec![own_observation(chrom, rec)];
    for obs in sa_observations(rec) {
        if !items.contains(&obs) {
            items.push(obs);
        }
    }
    items
}

fn observation_segments(
    read_id: &str,
    obs: &Observation,
    split_indels: Option<u32>,
) -> Vec<RawSegment> {
    let pieces = match decode_pieces(obs.cigar, obs.strand, split_indels) {
        Ok(pieces) => pieces,
        Err(e) => {
            log::debug!("Skipping alignment of read {} at {}:{}: {}", read_id, obs.chrom, obs.pos, e);
            return Vec::new();
        }
    };
    pieces
        .into_iter()
        .map(|piece| RawSegment {
            read_id: read_id.to_string(),
            chrom: obs.chrom.to_string(),
            pos: obs.pos + piece.ref_offset as i64,
            strand: obs.strand,
            qual: obs.qual,
            offset: piece.query_offset,
            rlen: piece.ref_len,
            qlen: piece.query_len,
        })
        .collect()
}

/// Collects segments while dropping degenerate and already seen ones.
#[derive(Default)]
struct SegmentSet {
    seen: HashSet<RawSegment>,
    segments: Vec<RawSegment>,
}

impl SegmentSet {
    fn extend(&mut self, read_id: &str, obs: &Observation, split_indels: Option<u32>) {
        for seg in observation_segments(read_id, obs, split_indels) {
            if seg.is_degenerate() || self.seen.contains(&seg) {
                continue;
            }
            self.seen.insert(seg.clone());
            self.segments.push(seg);
        }
    }
}

/// SA targets of one locus, as `(chrom, 1-based pos) -> read names`.
type PendingTargets = IndexMap<(String, i64), HashSet<String>>;

/// Fetches the records SA entries point to and adds their alignments.
/// A target counts only if a primary or supplementary record of the same read
/// starts exactly at the listed position.
fn resolve_targets<S>(source: &mut S, pending: PendingTargets, set: &mut SegmentSet, opts: &ScanOptions) -> Result<()>
where
    S: AlignmentSource + ?Sized,
{
    for ((chrom, pos), names) in pending {
        if pos < 1 {
            continue;
        }
        let start = (pos - 1) as u64;
        for result in source.records_in(&chrom, start, start + 2)? {
            let rec = result?;
            if rec.pos + 1 != pos || rec.is_unmapped || rec.is_secondary || !names.contains(&rec.name) {
                continue;
            }
            set.extend(&rec.name, &own_observation(&chrom, &rec), opts.split_indels);
        }
    }
    Ok(())
}

/// Extracts the deduplicated, non-empty segments of all reads at `loci`.
///
/// Loci are scanned one after another. A locus stops being scanned once more
/// than `max_reads` records were pulled for it; this truncation is logged and
/// is not an error. In deep mode SA entries are not decoded directly: the
/// record each entry names is fetched and its own alignment is used.
pub fn scan_segments<S>(source: &mut S, loci: &[Locus], opts: &ScanOptions) -> Result<Vec<RawSegment>>
where
    S: AlignmentSource + ?Sized,
{
    let mut set = SegmentSet::default();

    for locus in loci {
        let windows = match opts.border {
            Some(border) => locus.breakpoint_windows(border),
            None => vec![locus.clone()],
        };

        let mut pending = PendingTargets::new();
        let mut n_records = 0;
        'locus: for window in &windows {
            let (start, end) = window.fetch_interval();
            for result in source.records_in(&window.chrom, start, end)? {
                let rec = result?;
                n_records += 1;
                if opts.max_reads > 0 && n_records > opts.max_reads {
                    log::info!(
                        "Too many records for locus {}, only the first {} were used",
                        locus,
                        opts.max_reads
                    );
                    break 'locus;
                }
                if rec.is_unmapped || rec.is_secondary {
                    continue;
                }
                if opts.deep {
                    set.extend(&rec.name, &own_observation(&locus.chrom, &rec), opts.split_indels);
                    for obs in sa_observations(&rec) {
                        pending
                            .entry((obs.chrom.to_string(), obs.pos))
                            .or_default()
                            .insert(rec.name.clone());
                    }
                } else {
                    for obs in observations(&locus.chrom, &rec) {
                        set.extend(&rec.name, &obs, opts.split_indels);
                    }
                }
            }
        }
        log::debug!("Pulled {} records at {}", n_records, locus);

        if !pending.is_empty() {
            log::debug!("Resolving {} SA targets for {}", pending.len(), locus);
            resolve_targets(source, pending, &mut set, opts)?;
        }
    }

    Ok(set.segments)
}
