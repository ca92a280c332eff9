use std::fs::File;
use std::io;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::JobError;
use crate::orchestrator::OutputUnit;

/// Download name of the packaged job archive.
pub const ARCHIVE_FILE_NAME: &str = "voice_cloning_output.zip";

/// Package every output file into a single zip at `dest`, keyed by file
/// name, in chunk production order.
pub fn write_archive(units: &[OutputUnit], dest: &Path) -> Result<(), JobError> {
    let file = File::create(dest)
        .map_err(|e| JobError::Packaging(format!("failed to create {}: {e}", dest.display())))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for unit in units {
        zip.start_file(unit.file_name.as_str(), options)
            .map_err(|e| JobError::Packaging(format!("failed to add {}: {e}", unit.file_name)))?;
        let mut input = File::open(&unit.file_path).map_err(|e| {
            JobError::Packaging(format!("failed to read {}: {e}", unit.file_path.display()))
        })?;
        io::copy(&mut input, &mut zip)
            .map_err(|e| JobError::Packaging(format!("failed to write {}: {e}", unit.file_name)))?;
    }

    zip.finish()
        .map_err(|e| JobError::Packaging(format!("failed to finish archive: {e}")))?;
    Ok(())
}
