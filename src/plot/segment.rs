use crate::utils::Result;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Forward,
    #[serde(rename = "-")]
    Reverse,
}

impl Strand {
    pub fn from_is_reverse(is_reverse: bool) -> Self {
        if is_reverse {
            Strand::Reverse
        } else {
            Strand::Forward
        }
    }
}

impl FromStr for Strand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            _ => Err(format!("Invalid strand '{}': expected '+' or '-'", s)),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
        }
    }
}

/// A single aligned piece of a read.
///
/// Every field takes part in the segment's identity: two segments compare (and
/// hash) equal only if the whole tuple matches, which is what deduplication of
/// primary and SA-reported alignments relies on. Segments order by the same
/// fields, read name first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RawSegment {
    #[serde(rename = "readid")]
    pub read_id: String,
    pub chrom: String,
    /// 1-based reference start of the aligned body
    pub pos: i64,
    pub strand: Strand,
    pub qual: u8,
    /// Start of the aligned body in read coordinates
    pub offset: u32,
    pub rlen: u32,
    pub qlen: u32,
}

impl RawSegment {
    pub fn is_degenerate(&self) -> bool {
        self.rlen == 0 || self.qlen == 0
    }

    /// Exclusive reference end
    pub fn end(&self) -> i64 {
        self.pos.saturating_add(self.rlen as i64)
    }

    pub fn query_end(&self) -> u64 {
        self.offset as u64 + self.qlen as u64
    }

    /// Overlap bounds in half-base units: `[pos - rlen/2, pos + 3*rlen/2]` doubled.
    /// The window reaches further downstream than upstream so that segments
    /// starting close together merge even when their extents diverge.
    pub(crate) fn expanded_bounds_x2(&self) -> (i64, i64) {
        let rlen = self.rlen as i64;
        let pos_x2 = self.pos.saturating_mul(2);
        (pos_x2.saturating_sub(rlen), pos_x2.saturating_add(3 * rlen))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strand_from_str() {
        assert_eq!("+".parse::<Strand>(), Ok(Strand::Forward));
        assert_eq!("-".parse::<Strand>(), Ok(Strand::Reverse));
        assert!("x".parse::<Strand>().is_err());
    }

    #[test]
    fn segment_json_field_names() {
        let seg = RawSegment {
            read_id: "r1".to_string(),
            chrom: "chr1".to_string(),
            pos: 100,
            strand: Strand::Reverse,
            qual: 60,
            offset: 5,
            rlen: 40,
            qlen: 38,
        };
        let json = serde_json::to_string(&seg).unwrap();
        assert_eq!(
            json,
            r#"{"readid":"r1","chrom":"chr1","pos":100,"strand":"-","qual":60,"offset":5,"rlen":40,"qlen":38}"#
        );
        assert_eq!(seg.expanded_bounds_x2(), (160, 320));
    }

    #[test]
    fn segments_order_by_identity_fields() {
        let seg = |read_id: &str, pos: i64, strand: Strand| RawSegment {
            read_id: read_id.to_string(),
            chrom: "chr1".to_string(),
            pos,
            strand,
            qual: 60,
            offset: 0,
            rlen: 10,
            qlen: 10,
        };
        let mut segments = vec![
            seg("b", 5, Strand::Forward),
            seg("a", 9, Strand::Reverse),
            seg("a", 9, Strand::Forward),
            seg("a", 1, Strand::Reverse),
        ];
        segments.sort();
        let order: Vec<(&str, i64, Strand)> = segments.iter().map(|s| (s.read_id.as_str(), s.pos, s.strand)).collect();
        assert_eq!(
            order,
            vec![
                ("a", 1, Strand::Reverse),
                ("a", 9, Strand::Forward),
                ("a", 9, Strand::Reverse),
                ("b", 5, Strand::Forward),
            ]
        );
    }

    #[test]
    fn extreme_values_do_not_overflow() {
        let seg = RawSegment {
            read_id: "r1".to_string(),
            chrom: "chr1".to_string(),
            pos: i64::MAX - 1,
            strand: Strand::Forward,
            qual: 0,
            offset: u32::MAX,
            rlen: u32::MAX,
            qlen: u32::MAX,
        };
        assert_eq!(seg.query_end(), 2 * u32::MAX as u64);
        assert_eq!(seg.end(), i64::MAX);
        assert_eq!(seg.expanded_bounds_x2().1, i64::MAX);
    }
}
