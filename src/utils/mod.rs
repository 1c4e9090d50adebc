mod bam_utils;
pub mod input_source;
mod locus;
mod vcf_utils;

pub use bam_utils::{has_contig, is_bam_mapped, open_bam_reader};
pub use input_source::InputSource;
pub use locus::Locus;
pub use vcf_utils::open_vcf_reader;

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

pub type Result<T> = std::result::Result<T, String>;

pub fn handle_error_and_exit(err: String) -> ! {
    log::error!("{}", err);
    std::process::exit(1);
}

/// Opens the output destination; standard output when no path is given.
pub fn create_writer(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| format!("Failed to create output file {}: {}", path.display(), e))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

/// Serializes `value` as pretty JSON followed by a newline.
pub fn write_json<T: serde::Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let mut writer = create_writer(path)?;
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| format!("Error writing JSON output: {}", e))?;
    writeln!(writer).map_err(|e| format!("Error writing JSON output: {}", e))?;
    writer
        .flush()
        .map_err(|e| format!("Error flushing JSON output: {}", e))
}
