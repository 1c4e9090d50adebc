//! Decoding of CIGAR text into clip offsets and aligned lengths.
//!
//! Split alignments report CIGAR strings both in the record itself and inside
//! the SA tag of their mates, so decoding works on the textual form rather than
//! on htslib's binary CIGAR.
use super::segment::Strand;
use crate::utils::Result;
use regex::Regex;
use std::{fmt, sync::OnceLock};

static CIGAR_TOKEN: OnceLock<Regex> = OnceLock::new();

fn cigar_token() -> &'static Regex {
    CIGAR_TOKEN.get_or_init(|| Regex::new(r"(\d+)(\D)").expect("valid CIGAR token pattern"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOp {
    Match(u32),
    Ins(u32),
    Del(u32),
    SoftClip(u32),
    HardClip(u32),
}

impl CigarOp {
    /// Maps a single CIGAR letter to an operation. `=`/`X` count as matches and
    /// `N` as a deletion; padding and unknown letters yield `None`.
    fn from_code(code: char, len: u32) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'M' | '=' | 'X' => Some(CigarOp::Match(len)),
            'I' => Some(CigarOp::Ins(len)),
            'D' | 'N' => Some(CigarOp::Del(len)),
            'S' => Some(CigarOp::SoftClip(len)),
            'H' => Some(CigarOp::HardClip(len)),
            _ => None,
        }
    }

    pub fn len(&self) -> u32 {
        match self {
            CigarOp::Match(n)
            | CigarOp::Ins(n)
            | CigarOp::Del(n)
            | CigarOp::SoftClip(n)
            | CigarOp::HardClip(n) => *n,
        }
    }

    pub fn is_clip(&self) -> bool {
        matches!(self, CigarOp::SoftClip(_) | CigarOp::HardClip(_))
    }

    fn is_indel(&self) -> bool {
        matches!(self, CigarOp::Ins(_) | CigarOp::Del(_))
    }

    pub fn ref_len(&self) -> u32 {
        match self {
            CigarOp::Match(n) | CigarOp::Del(n) => *n,
            _ => 0,
        }
    }

    /// Clips are counted on the query side whether soft or hard, so offsets are
    /// expressed in coordinates of the full original read.
    pub fn query_len(&self) -> u32 {
        match self {
            CigarOp::Match(n) | CigarOp::Ins(n) | CigarOp::SoftClip(n) | CigarOp::HardClip(n) => *n,
            CigarOp::Del(_) => 0,
        }
    }
}

impl fmt::Display for CigarOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CigarOp::Match(_) => 'M',
            CigarOp::Ins(_) => 'I',
            CigarOp::Del(_) => 'D',
            CigarOp::SoftClip(_) => 'S',
            CigarOp::HardClip(_) => 'H',
        };
        write!(f, "{}{}", self.len(), code)
    }
}

/// One decoded stretch of an alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CigarPiece {
    /// Reference bases between the alignment position and the start of the piece
    pub ref_offset: u32,
    /// Read bases preceding the piece, clipped bases included
    pub query_offset: u32,
    /// Compressed body: total match length plus the net indel
    pub summary: String,
    pub ref_len: u32,
    pub query_len: u32,
    /// Read bases following the piece
    pub query_remaining: u32,
}

/// Parses CIGAR text into operations. Fails if no token can be read.
pub fn parse_cigar(text: &str) -> Result<Vec<CigarOp>> {
    let mut ops = Vec::new();
    let mut n_tokens = 0;
    for caps in cigar_token().captures_iter(text) {
        n_tokens += 1;
        let len: u32 = caps[1]
            .parse()
            .map_err(|_| format!("Invalid CIGAR operation length '{}' in {}", &caps[1], text))?;
        let code = caps[2].chars().next().unwrap_or('?');
        if let Some(op) = CigarOp::from_code(code, len) {
            ops.push(op);
        }
    }
    if n_tokens == 0 {
        return Err(format!("Unable to parse CIGAR: '{}'", text));
    }
    Ok(ops)
}

fn lengths(ops: &[CigarOp]) -> (u64, u64) {
    ops.iter().fold((0, 0), |(r, q), op| {
        (r + op.ref_len() as u64, q + op.query_len() as u64)
    })
}

/// Reference and query lengths of a sub-sequence of an alignment whose totals fit in `u32`.
fn sub_lengths(ops: &[CigarOp]) -> (u32, u32) {
    let (r, q) = lengths(ops);
    (r as u32, q as u32)
}

fn compress(ops: &[CigarOp]) -> String {
    let mut matched: u64 = 0;
    let mut delta: i64 = 0;
    for op in ops {
        match op {
            CigarOp::Match(n) => matched += *n as u64,
            CigarOp::Ins(n) => delta += *n as i64,
            CigarOp::Del(n) => delta -= *n as i64,
            _ => {}
        }
    }
    let mut summary = String::new();
    if matched > 0 {
        summary.push_str(&format!("{}M", matched));
    }
    match delta {
        d if d > 0 => summary.push_str(&format!("{}I", d)),
        d if d < 0 => summary.push_str(&format!("{}D", -d)),
        _ => {}
    }
    summary
}

/// Splits the aligned body before and after every indel of at least `min_len`.
fn partition(ops: &[CigarOp], min_len: u32) -> Vec<&[CigarOp]> {
    let mut parts = Vec::new();
    let mut begin = 0;
    for (i, op) in ops.iter().enumerate() {
        if op.is_indel() && op.len() >= min_len {
            parts.push(&ops[begin..i]);
            parts.push(&ops[i..i + 1]);
            begin = i + 1;
        }
    }
    parts.push(&ops[begin..]);
    parts
}

/// Decodes a CIGAR into pieces, optionally split at large indels.
///
/// Operations are reversed for the reverse strand so the left clip is always
/// the one at the read's 5' end. Only a leading clip is accounted in the
/// offsets; a trailing clip is dropped.
pub fn decode_pieces(text: &str, strand: Strand, split_indels: Option<u32>) -> Result<Vec<CigarPiece>> {
    let mut ops = parse_cigar(text)?;
    if strand == Strand::Reverse {
        ops.reverse();
    }
    let (ref_total, read_total) = lengths(&ops);
    if ref_total > u32::MAX as u64 || read_total > u32::MAX as u64 {
        return Err(format!("CIGAR lengths out of range: '{}'", text));
    }
    let read_len = read_total as u32;

    let mut body: &[CigarOp] = &ops;
    let mut left_clip: &[CigarOp] = &[];
    if body.first().is_some_and(|op| op.is_clip()) {
        left_clip = &body[..1];
        body = &body[1..];
    }
    if body.last().is_some_and(|op| op.is_clip()) {
        body = &body[..body.len() - 1];
    }

    let parts = match split_indels {
        Some(min_len) => partition(body, min_len),
        None => vec![body],
    };

    let (mut ref_offset, mut query_offset) = sub_lengths(left_clip);
    let mut pieces = Vec::with_capacity(parts.len());
    for part in parts {
        let (ref_len, query_len) = sub_lengths(part);
        pieces.push(CigarPiece {
            ref_offset,
            query_offset,
            summary: compress(part),
            ref_len,
            query_len,
            query_remaining: read_len.saturating_sub(query_offset + query_len),
        });
        ref_offset += ref_len;
        query_offset += query_len;
    }
    Ok(pieces)
}

/// Decodes a CIGAR into a single piece covering the whole aligned body.
pub fn decode(text: &str, strand: Strand) -> Result<CigarPiece> {
    let mut pieces = decode_pieces(text, strand, None)?;
    pieces
        .pop()
        .ok_or_else(|| format!("Unable to decode CIGAR: '{}'", text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reversed(text: &str) -> String {
        parse_cigar(text)
            .unwrap()
            .iter()
            .rev()
            .map(|op| op.to_string())
            .collect()
    }

    #[test]
    fn match_only_has_no_clips() {
        for text in ["100M", "1M", "40M60M", "7m"] {
            let piece = decode(text, Strand::Forward).unwrap();
            let (matched, _) = sub_lengths(&parse_cigar(text).unwrap());
            assert_eq!(piece.ref_offset, 0);
            assert_eq!(piece.query_offset, 0);
            assert_eq!(piece.ref_len, matched);
            assert_eq!(piece.query_len, matched);
            assert_eq!(piece.summary, format!("{}M", matched));
        }
    }

    #[test]
    fn leading_clip_sets_query_offset() {
        let piece = decode("30S100M2I5D50M", Strand::Forward).unwrap();
        assert_eq!(piece.ref_offset, 0);
        assert_eq!(piece.query_offset, 30);
        assert_eq!(piece.ref_len, 155);
        assert_eq!(piece.query_len, 152);
        assert_eq!(piece.summary, "150M3D");
        assert_eq!(piece.query_remaining, 0);
    }

    #[test]
    fn trailing_clip_is_dropped_without_accounting() {
        let piece = decode("10H100M20S", Strand::Forward).unwrap();
        assert_eq!(piece.query_offset, 10);
        assert_eq!(piece.query_len, 100);
        assert_eq!(piece.query_remaining, 20);
    }

    #[test]
    fn reverse_strand_uses_other_clip() {
        let piece = decode("10S100M20S", Strand::Reverse).unwrap();
        assert_eq!(piece.query_offset, 20);
        assert_eq!(piece.query_len, 100);
        assert_eq!(piece.query_remaining, 10);
    }

    #[test]
    fn reversing_text_and_strand_is_symmetric() {
        for text in ["5S100M", "100M5H", "12S40M3I10M2D8M7S", "3H20M", "20M"] {
            let fwd = decode(text, Strand::Forward).unwrap();
            let rev = decode(&reversed(text), Strand::Reverse).unwrap();
            assert_eq!(fwd, rev, "{}", text);
        }
    }

    #[test]
    fn net_insertion_summary() {
        let piece = decode("50M10I20M4D", Strand::Forward).unwrap();
        assert_eq!(piece.summary, "70M6I");
    }

    #[test]
    fn lowercase_and_extended_codes() {
        let piece = decode("5s10=2x3n", Strand::Forward).unwrap();
        assert_eq!(piece.query_offset, 5);
        assert_eq!(piece.ref_len, 15);
        assert_eq!(piece.query_len, 12);
    }

    #[test]
    fn unparseable_cigar_err() {
        assert!(decode("*", Strand::Forward).is_err());
        assert!(decode("", Strand::Reverse).is_err());
        assert!(decode("MMM", Strand::Forward).is_err());
    }

    #[test]
    fn clip_only_cigar_has_empty_body() {
        let piece = decode("10S", Strand::Forward).unwrap();
        assert_eq!(piece.query_offset, 10);
        assert_eq!(piece.ref_len, 0);
        assert_eq!(piece.query_len, 0);
        assert_eq!(piece.summary, "");
    }

    #[test]
    fn split_at_large_indels() {
        let pieces = decode_pieces("10S100M60D50M5I20M80I30M", Strand::Forward, Some(50)).unwrap();
        let summary: Vec<(u32, u32, &str, u32, u32)> = pieces
            .iter()
            .map(|p| (p.ref_offset, p.query_offset, p.summary.as_str(), p.ref_len, p.query_len))
            .collect();
        assert_eq!(
            summary,
            vec![
                (0, 10, "100M", 100, 100),
                (100, 110, "60D", 60, 0),
                (160, 110, "70M5I", 70, 75),
                (230, 185, "80I", 0, 80),
                (230, 265, "30M", 30, 30),
            ]
        );
        assert_eq!(pieces.last().unwrap().query_remaining, 0);
    }

    #[test]
    fn split_without_threshold_is_single_piece() {
        let pieces = decode_pieces("100M60D50M", Strand::Forward, None).unwrap();
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0], decode("100M60D50M", Strand::Forward).unwrap());
    }

    #[test]
    fn oversized_lengths_are_rejected() {
        assert!(decode("4294967295M4294967295M", Strand::Forward).is_err());
        assert!(decode("10S4294967295I", Strand::Reverse).is_err());
        let piece = decode("4294967295M", Strand::Forward).unwrap();
        assert_eq!(piece.ref_len, u32::MAX);
    }
}
