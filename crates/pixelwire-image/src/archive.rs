// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! ZIP archival of tagged tiles, grounded on
//! `original_source/zip_files.py`'s `create_zip_file`/`extract_zip_file`.
//!
//! Entry names are randomised rather than `{row}_{col}.png`: coordinate
//! information lives only inside each tile's `Description` chunk, so the
//! archive itself leaks no layout.

use std::io::{Cursor, Read, Write};

use rand::distributions::Alphanumeric;
use rand::Rng;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::PipelineError;

fn random_entry_name() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    format!("{suffix}.png")
}

/// Pack a set of tagged-PNG byte buffers into one ZIP archive.
pub fn create(tiles: &[Vec<u8>]) -> Result<Vec<u8>, PipelineError> {
    let mut buf = Vec::new();
    {
        let mut writer = ZipWriter::new(Cursor::new(&mut buf));
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for tile in tiles {
            writer
                .start_file(random_entry_name(), options)
                .map_err(|e| PipelineError::Zip(e.to_string()))?;
            writer
                .write_all(tile)
                .map_err(|e| PipelineError::Zip(e.to_string()))?;
        }
        writer.finish().map_err(|e| PipelineError::Zip(e.to_string()))?;
    }
    Ok(buf)
}

/// Unpack a ZIP archive into its constituent tagged-PNG byte buffers, in
/// archive order (the caller recovers true layout from each tile's
/// embedded coordinate tag, not from entry order or name).
pub fn extract(bytes: &[u8]) -> Result<Vec<Vec<u8>>, PipelineError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| PipelineError::Zip(e.to_string()))?;

    let mut out = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| PipelineError::Zip(e.to_string()))?;
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut data)
            .map_err(|e| PipelineError::Io(format!("zip entry {i}"), e))?;
        out.push(data);
    }
    Ok(out)
}
