//! Segments of split reads around the breakpoints of every call in an SV VCF.
use crate::cli::SvArgs;
use crate::commands::scan::open_checked_reader;
use crate::plot::{scan_segments, AlignmentSource, RawSegment, ScanOptions};
use crate::utils::{has_contig, open_vcf_reader, write_json, Locus, Result};
use indexmap::IndexMap;
use itertools::Itertools;
use rust_htslib::{
    bam::Read as _,
    bcf::{self, header::TagLength, Read as _},
};
use sha2::{Digest, Sha256};

pub const DEFAULT_SV_BORDER: u64 = 50;
pub const DEFAULT_MAX_SEGMENTS: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct SvLocus {
    /// `chrom:start-end-SVTYPE-signature`
    pub key: String,
    pub locus: Locus,
}

/// First eight hex digits of the SHA-256 over the alleles followed by the SVLEN text.
pub fn sv_signature(alleles: &[&[u8]], svlen: &str) -> String {
    let mut hasher = Sha256::new();
    for allele in alleles {
        hasher.update(allele);
    }
    hasher.update(svlen.as_bytes());
    hasher.finalize()[..4].iter().map(|b| format!("{:02x}", b)).collect()
}

/// SVLEN as it enters the signature: the bare value for a `Number=1` field,
/// a tuple such as `(-300,)` for any other declared length, `0` when missing.
fn svlen_text(values: &[i32], scalar: bool) -> String {
    match values {
        [] => "0".to_string(),
        [first, ..] if scalar => first.to_string(),
        [single] => format!("({},)", single),
        _ => format!("({})", values.iter().join(", ")),
    }
}

fn sv_locus(rec: &bcf::Record) -> Result<Option<SvLocus>> {
    let header = rec.header();
    let rid = rec.rid().ok_or("VCF record without a contig")?;
    let chrom = header
        .rid2name(rid)
        .map_err(|e| format!("Unknown contig id {} in VCF: {}", rid, e))?;
    let chrom = String::from_utf8_lossy(chrom).into_owned();
    let start = (rec.pos() + 1) as u64;

    let kind = match rec.info(b"SVTYPE").string() {
        Ok(Some(values)) if !values.is_empty() => String::from_utf8_lossy(values[0]).into_owned(),
        _ => {
            log::warn!("Skipping variant at {}:{} without SVTYPE", chrom, start);
            return Ok(None);
        }
    };

    let scalar = matches!(header.info_type(b"SVLEN"), Ok((_, TagLength::Fixed(1))));
    let svlen: Vec<i32> = match rec.info(b"SVLEN").integer() {
        Ok(Some(values)) => values.iter().copied().collect(),
        _ => Vec::new(),
    };
    let signature = sv_signature(&rec.alleles(), &svlen_text(&svlen, scalar));

    let locus = Locus::new(chrom, start, rec.end() as u64)?;
    Ok(Some(SvLocus {
        key: format!("{}-{}-{}", locus, kind, signature),
        locus,
    }))
}

/// Reads one locus per call; calls without SVTYPE are skipped.
pub fn read_sv_loci(reader: &mut bcf::Reader) -> Result<Vec<SvLocus>> {
    let mut loci = Vec::new();
    for result in reader.records() {
        let rec = result.map_err(|e| format!("Error reading VCF record: {}", e))?;
        if let Some(sv) = sv_locus(&rec)? {
            loci.push(sv);
        }
    }
    Ok(loci)
}

/// Scans every call and keys its sorted segments by the call key.
///
/// Calls without segments are left out, as are calls with more than
/// `max_segments` segments (0 disables that limit).
pub fn collect_sv_segments<S>(
    source: &mut S,
    loci: &[SvLocus],
    opts: &ScanOptions,
    max_segments: usize,
) -> Result<IndexMap<String, Vec<RawSegment>>>
where
    S: AlignmentSource + ?Sized,
{
    let mut by_key = IndexMap::new();
    for (i, sv) in loci.iter().enumerate() {
        if (i + 1) % 256 == 0 {
            log::info!("Processed {} of {} calls", i + 1, loci.len());
        }
        let mut segments = scan_segments(source, std::slice::from_ref(&sv.locus), opts)?;
        if segments.is_empty() {
            log::debug!("No segments for {}", sv.key);
            continue;
        }
        if max_segments > 0 && segments.len() > max_segments {
            log::warn!("Dropping {}: {} segments", sv.key, segments.len());
            continue;
        }
        segments.sort();
        if by_key.insert(sv.key.clone(), segments).is_some() {
            log::warn!("Duplicate call {}, keeping the last one", sv.key);
        }
    }
    Ok(by_key)
}

pub fn sv(args: SvArgs) -> Result<()> {
    let mut vcf = open_vcf_reader(&args.vcf_src)?;
    let mut loci = read_sv_loci(&mut vcf)?;
    log::info!("Read {} calls from {}", loci.len(), args.vcf_src);

    let mut reader = open_checked_reader(&args.reads_src, &[], args.extract.num_threads)?;
    loci.retain(|sv| {
        let known = has_contig(reader.header(), &sv.locus.chrom);
        if !known {
            log::warn!("Skipping {}: contig not found in {}", sv.key, args.reads_src);
        }
        known
    });

    let by_key = collect_sv_segments(&mut reader, &loci, &args.scan_options(), args.max_segments)?;
    log::info!("Kept {} of {} calls", by_key.len(), loci.len());
    write_json(&by_key, args.output_path.as_deref())
}
