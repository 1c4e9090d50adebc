use crate::cli::ScanArgs;
use crate::plot::{scan_segments, RawSegment};
use crate::utils::{has_contig, is_bam_mapped, open_bam_reader, write_json, InputSource, Locus, Result};
use indexmap::IndexMap;
use rust_htslib::bam::{self, Read};

/// Opens the reads and makes sure every locus can be fetched from them.
pub fn open_checked_reader(reads_src: &InputSource, loci: &[Locus], threads: usize) -> Result<bam::IndexedReader> {
    let reader = open_bam_reader(reads_src, threads)?;
    let header = reader.header();
    if !is_bam_mapped(header) {
        return Err(format!("Input is unmapped, no reference sequences in header: {}", reads_src));
    }
    if let Some(locus) = loci.iter().find(|l| !has_contig(header, &l.chrom)) {
        return Err(format!("Contig {} of locus {} not found in {}", locus.chrom, locus, reads_src));
    }
    Ok(reader)
}

pub fn scan(args: ScanArgs) -> Result<()> {
    let mut reader = open_checked_reader(&args.reads_src, &args.loci, args.extract.num_threads)?;
    let opts = args.extract.scan_options();

    let mut by_locus: IndexMap<String, Vec<RawSegment>> = IndexMap::with_capacity(args.loci.len());
    for locus in &args.loci {
        let segments = scan_segments(&mut reader, std::slice::from_ref(locus), &opts)?;
        log::info!("{}: {} segments", locus, segments.len());
        by_locus.insert(locus.to_string(), segments);
    }

    write_json(&by_locus, args.output_path.as_deref())
}
