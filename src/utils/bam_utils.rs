use crate::utils::{InputSource, Result};
use rust_htslib::bam::{self, Read};

/// Opens an indexed BAM/CRAM from a local path or URL.
pub fn open_bam_reader(reads_src: &InputSource, threads: usize) -> Result<bam::IndexedReader> {
    reads_src.preflight_checks()?;
    let mut reader = match reads_src {
        InputSource::Local(p) => bam::IndexedReader::from_path(p),
        InputSource::Remote(r) => bam::IndexedReader::from_url(r.url()),
    }
    .map_err(|e| reads_src.format_error("Failed to create BAM reader from", e))?;

    if threads > 1 {
        if let Err(e) = reader.set_threads(threads) {
            log::warn!("Failed to set decompression threads: {e}");
        }
    }
    Ok(reader)
}

pub fn is_bam_mapped(bam_header: &bam::HeaderView) -> bool {
    bam_header.target_count() > 0
}

/// Returns true if the header declares a reference sequence named `contig`.
pub fn has_contig(bam_header: &bam::HeaderView, contig: &str) -> bool {
    bam_header.tid(contig.as_bytes()).is_some()
}
