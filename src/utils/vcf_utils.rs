use crate::utils::{InputSource, Result};
use rust_htslib::bcf;

/// Opens a VCF/BCF from a local path or URL.
pub fn open_vcf_reader(vcf_src: &InputSource) -> Result<bcf::Reader> {
    vcf_src.preflight_checks()?;
    let reader = match vcf_src {
        InputSource::Local(p) => bcf::Reader::from_path(p),
        InputSource::Remote(r) => bcf::Reader::from_url(r.url()),
    }
    .map_err(|e| vcf_src.format_error("Failed to open VCF file from", e))?;
    Ok(reader)
}
