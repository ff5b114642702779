//! Final delivery shape: a bare PDF for one part, a ZIP for several

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::chunker::FileNamer;
use super::types::{ExportArtifact, PDF_CONTENT_TYPE, ZIP_CONTENT_TYPE};
use crate::error::{AppError, Result};

/// Package merged part documents, numbering parts contiguously from 1
pub fn package(mut parts: Vec<Vec<u8>>, namer: &FileNamer) -> Result<ExportArtifact> {
    match parts.len() {
        0 => Err(AppError::PackagingFailure("no parts to package".to_string())),
        1 => Ok(ExportArtifact {
            bytes: parts.remove(0),
            file_name: namer.single_pdf(),
            content_type: PDF_CONTENT_TYPE,
        }),
        _ => {
            let entries: Vec<(String, Vec<u8>)> = parts
                .into_iter()
                .enumerate()
                .map(|(index, bytes)| (namer.part_pdf(index + 1), bytes))
                .collect();

            Ok(ExportArtifact {
                bytes: build_zip(&entries)?,
                file_name: namer.archive(),
                content_type: ZIP_CONTENT_TYPE,
            })
        }
    }
}

/// Write entries into an in-memory archive.
///
/// Entry timestamps are pinned so identical input yields identical bytes.
pub fn build_zip(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    for (name, bytes) in entries {
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| zip_failure(name, &e.to_string()))?;
        writer
            .write_all(bytes)
            .map_err(|e| zip_failure(name, &e.to_string()))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| AppError::PackagingFailure(format!("failed to finish archive: {}", e)))?;
    Ok(cursor.into_inner())
}

fn zip_failure(entry: &str, reason: &str) -> AppError {
    AppError::PackagingFailure(format!("failed to add {} to archive: {}", entry, reason))
}
