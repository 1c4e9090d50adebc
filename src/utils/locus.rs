use crate::utils::Result;
use regex::Regex;
use std::{fmt, str::FromStr, sync::OnceLock};

static LOCUS_PATTERN: OnceLock<Regex> = OnceLock::new();

fn locus_pattern() -> &'static Regex {
    LOCUS_PATTERN.get_or_init(|| {
        Regex::new(r"^(chr(?:[0-9]+|X|Y|MY)):([0-9][0-9,]*)-([0-9][0-9,]*)$")
            .expect("valid locus pattern")
    })
}

/// A chromosome range of interest, 1-based and inclusive on both ends.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct Locus {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl Locus {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Result<Self> {
        if start > end {
            return Err(format!("Invalid locus: start {} > end {}", start, end));
        }
        Ok(Self {
            chrom: chrom.into(),
            start,
            end,
        })
    }

    pub fn from_string(encoding: &str) -> Result<Self> {
        let caps = locus_pattern().captures(encoding.trim()).ok_or_else(|| {
            format!(
                "Invalid locus encoding '{}': expected 'chrN:start-end' with N a number, X, Y or MY",
                encoding
            )
        })?;
        let start = parse_coord(&caps[2], encoding)?;
        let end = parse_coord(&caps[3], encoding)?;
        Self::new(&caps[1], start, end)
    }

    /// Zero-based half-open interval to query against an indexed file
    pub fn fetch_interval(&self) -> (u64, u64) {
        (self.start.saturating_sub(1), self.end)
    }

    /// Windows of `border` bases around each end of the locus. Windows that
    /// would touch are merged into a single one.
    pub fn breakpoint_windows(&self, border: u64) -> Vec<Locus> {
        let around = |pos: u64| Locus {
            chrom: self.chrom.clone(),
            start: pos.saturating_sub(border).max(1),
            end: pos + border,
        };
        if self.start + border >= self.end.saturating_sub(border) {
            vec![Locus {
                chrom: self.chrom.clone(),
                start: self.start.saturating_sub(border).max(1),
                end: self.end + border,
            }]
        } else {
            vec![around(self.start), around(self.end)]
        }
    }
}

fn parse_coord(field: &str, encoding: &str) -> Result<u64> {
    field.replace(',', "").parse().map_err(|_| {
        format!(
            "Invalid locus encoding '{}'. Invalid position '{}': must be a non-negative integer",
            encoding, field
        )
    })
}

impl FromStr for Locus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_string(s)
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}
