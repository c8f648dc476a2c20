// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! PNG `tEXt` chunk tagging: each tile carries its `(row, col)` coordinate
//! in a `Description` text chunk, the same convention as
//! `original_source/image_metadata.py`'s `add_metadata_to_image`.
//!
//! The `image` crate has no API for ancillary text chunks, so this module
//! talks to the `png` crate directly.

use std::io::Cursor;

use image::RgbImage;

use crate::error::PipelineError;

const DESCRIPTION_KEYWORD: &str = "Description";

/// Encode `img` as PNG bytes carrying a `Description` tEXt chunk of
/// `"{row}_{col}"`.
pub fn encode_tagged(img: &RgbImage, row: u32, col: u32) -> Result<Vec<u8>, PipelineError> {
    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(Cursor::new(&mut bytes), img.width(), img.height());
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        encoder
            .add_text_chunk(DESCRIPTION_KEYWORD.to_string(), format!("{row}_{col}"))
            .map_err(|e| PipelineError::PngEncode(e.to_string()))?;

        let mut writer = encoder
            .write_header()
            .map_err(|e| PipelineError::PngEncode(e.to_string()))?;
        writer
            .write_image_data(img.as_raw())
            .map_err(|e| PipelineError::PngEncode(e.to_string()))?;
    }
    Ok(bytes)
}

/// Decode a tagged PNG, returning its pixels and the `(row, col)` tag read
/// back out of its `Description` chunk.
pub fn decode_tagged(bytes: &[u8], source: &str) -> Result<(RgbImage, u32, u32), PipelineError> {
    let decoder = png::Decoder::new(Cursor::new(bytes));
    let mut reader = decoder
        .read_info()
        .map_err(|e| PipelineError::PngDecode(e.to_string()))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| PipelineError::PngDecode(e.to_string()))?;
    buf.truncate(info.buffer_size());

    let rgb = match info.color_type {
        png::ColorType::Rgb => buf,
        png::ColorType::Rgba => buf.chunks_exact(4).flat_map(|p| [p[0], p[1], p[2]]).collect(),
        other => return Err(PipelineError::PngDecode(format!("unsupported color type {other:?}"))),
    };

    let img = RgbImage::from_raw(info.width, info.height, rgb)
        .ok_or_else(|| PipelineError::PngDecode("pixel buffer size mismatch".to_string()))?;

    let description = reader
        .info()
        .uncompressed_latin1_text
        .iter()
        .find(|chunk| chunk.keyword == DESCRIPTION_KEYWORD)
        .map(|chunk| chunk.text.clone())
        .ok_or_else(|| PipelineError::MissingMetadata(source.to_string()))?;

    let (row, col) = parse_coordinate(&description)
        .ok_or_else(|| PipelineError::UnparseableMetadata(source.to_string(), description.clone()))?;

    Ok((img, row, col))
}

fn parse_coordinate(s: &str) -> Option<(u32, u32)> {
    let (row, col) = s.split_once('_')?;
    Some((row.parse().ok()?, col.parse().ok()?))
}
