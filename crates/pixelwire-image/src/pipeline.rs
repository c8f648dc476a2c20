// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Carrier pipeline (C4/C5): the encrypt-embed-tile-tag-archive encode
//! stage and its inverse decode stage.
//!
//! The archive write is staged through a temp file and renamed into place
//! (`original_source/move_file.py`'s atomic-rename convention) so a reader
//! never observes a half-written archive.

use std::path::Path;

use pixelwire_crypto::AesCbcCipher;

use crate::cover::{CoverSource, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::error::PipelineError;
use crate::tiling::Tile;
use crate::{archive, lsb, metadata, tiling};

/// Plaintext is clamped to this many bytes before encryption (spec.md §4.4).
pub const MAX_CONTENT_LENGTH: usize = 115_167;

pub const DEFAULT_ROWS: u32 = 6;
pub const DEFAULT_COLS: u32 = 8;

/// Run the full encode pipeline and return the finished ZIP archive bytes.
///
/// `plaintext` is treated as already UTF-16LE-encoded text bytes (matching
/// spec.md §8 scenario 3's framing), truncated to `max_content_length`
/// bytes before encryption (callers default this to [`MAX_CONTENT_LENGTH`]).
#[allow(clippy::too_many_arguments)]
pub async fn encode_message(
    plaintext: &[u8],
    key_material: &[u8],
    cover: &CoverSource,
    rows: u32,
    cols: u32,
    max_content_length: usize,
    staging_dir: &Path,
) -> Result<Vec<u8>, PipelineError> {
    // Plaintext is UTF-16LE bytes; round the clamp down to an even boundary
    // so it never splits a code unit (MAX_CONTENT_LENGTH itself is odd).
    let clamp_len = plaintext.len().min(max_content_length);
    let clamped = &plaintext[..clamp_len - (clamp_len % 2)];
    let text = decode_utf16_lossy(clamped);

    let cipher = AesCbcCipher::new(key_material);
    let ciphertext = cipher.encrypt(&text);

    let mut cover_img = cover.obtain(DEFAULT_WIDTH, DEFAULT_HEIGHT).await;
    lsb::embed(&mut cover_img, &ciphertext)?;

    let tiles = tiling::split(&cover_img, rows, cols);
    let mut tagged = Vec::with_capacity(tiles.len());
    for tile in &tiles {
        tagged.push(metadata::encode_tagged(&tile.image, tile.row, tile.col)?);
    }

    let archive_bytes = archive::create(&tagged)?;
    stage_and_read_back(staging_dir, &archive_bytes).await
}

/// Inverse of [`encode_message`]: unpack an archive, reassemble the stego
/// image, reveal the ciphertext, and decrypt it back to plaintext bytes.
///
/// Mirrors the encode side's scoped-directory discipline: the received
/// archive is staged to disk under `staging_dir` before being unpacked, so
/// an inbound message leaves the same "temp directory created, used,
/// removed" trail as an outbound one.
pub async fn decode_message(
    archive_bytes: &[u8],
    key_material: &[u8],
    staging_dir: &Path,
) -> Result<Vec<u8>, PipelineError> {
    let archive_bytes = stage_and_read_back(staging_dir, archive_bytes).await?;
    let tagged_pngs = archive::extract(&archive_bytes)?;

    let mut tiles = Vec::with_capacity(tagged_pngs.len());
    for (i, png_bytes) in tagged_pngs.iter().enumerate() {
        let (image, row, col) = metadata::decode_tagged(png_bytes, &format!("entry {i}"))?;
        tiles.push(Tile { row, col, image });
    }

    let canvas = tiling::restore(tiles)?;
    let ciphertext = lsb::reveal(&canvas)?;

    let cipher = AesCbcCipher::new(key_material);
    let text = cipher.decrypt(&ciphertext)?;

    Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect())
}

fn decode_utf16_lossy(bytes: &[u8]) -> String {
    let units = bytes
        .chunks(2)
        .map(|c| if c.len() == 2 { u16::from_le_bytes([c[0], c[1]]) } else { c[0] as u16 });
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

async fn stage_and_read_back(staging_dir: &Path, bytes: &[u8]) -> Result<Vec<u8>, PipelineError> {
    let tmp = tempfile::NamedTempFile::new_in(staging_dir)
        .map_err(|e| PipelineError::Io(staging_dir.display().to_string(), e))?;
    tokio::fs::write(tmp.path(), bytes)
        .await
        .map_err(|e| PipelineError::Io(tmp.path().display().to_string(), e))?;

    let final_path = staging_dir.join("message.zip");
    let final_path = tmp
        .persist(&final_path)
        .map_err(|e| PipelineError::Io(final_path.display().to_string(), e.error))?;

    tokio::fs::read(&final_path)
        .await
        .map_err(|e| PipelineError::Io(final_path.display().to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip_ascii_message() {
        let send_dir = tempfile::tempdir().unwrap();
        let recv_dir = tempfile::tempdir().unwrap();
        let key = b"shared secret";
        let text: Vec<u8> = "hello".encode_utf16().flat_map(u16::to_le_bytes).collect();

        let archive =
            encode_message(&text, key, &CoverSource::disabled(), 6, 8, MAX_CONTENT_LENGTH, send_dir.path())
                .await
                .unwrap();
        let recovered = decode_message(&archive, key, recv_dir.path()).await.unwrap();
        assert_eq!(recovered, text);
    }

    #[tokio::test]
    async fn round_trip_empty_message() {
        let send_dir = tempfile::tempdir().unwrap();
        let recv_dir = tempfile::tempdir().unwrap();
        let key = b"key";
        let archive = encode_message(&[], key, &CoverSource::disabled(), 6, 8, MAX_CONTENT_LENGTH, send_dir.path())
            .await
            .unwrap();
        let recovered = decode_message(&archive, key, recv_dir.path()).await.unwrap();
        assert!(recovered.is_empty());
    }

    #[tokio::test]
    async fn round_trip_unicode_message() {
        let send_dir = tempfile::tempdir().unwrap();
        let recv_dir = tempfile::tempdir().unwrap();
        let key = b"key";
        let text: Vec<u8> = "h\u{00e9}llo \u{1f600}".encode_utf16().flat_map(u16::to_le_bytes).collect();

        let archive =
            encode_message(&text, key, &CoverSource::disabled(), 6, 8, MAX_CONTENT_LENGTH, send_dir.path())
                .await
                .unwrap();
        let recovered = decode_message(&archive, key, recv_dir.path()).await.unwrap();
        assert_eq!(recovered, text);
    }

    #[tokio::test]
    async fn oversize_plaintext_is_clamped_to_max_content_length() {
        let send_dir = tempfile::tempdir().unwrap();
        let recv_dir = tempfile::tempdir().unwrap();
        let key = b"key";
        // An even-length payload well past the cap so the clamp boundary
        // never splits a UTF-16 code unit in two.
        let oversized: Vec<u8> = "x".repeat(100_000).encode_utf16().flat_map(u16::to_le_bytes).collect();
        assert!(oversized.len() > MAX_CONTENT_LENGTH);

        let archive = encode_message(
            &oversized,
            key,
            &CoverSource::disabled(),
            6,
            8,
            MAX_CONTENT_LENGTH,
            send_dir.path(),
        )
        .await
        .unwrap();
        let recovered = decode_message(&archive, key, recv_dir.path()).await.unwrap();
        // MAX_CONTENT_LENGTH is odd; the clamp rounds down to the nearest
        // even byte count so it never splits a UTF-16 code unit.
        assert_eq!(recovered, &oversized[..MAX_CONTENT_LENGTH - 1]);
    }

    #[tokio::test]
    async fn custom_max_content_length_clamps_tighter_than_the_default() {
        let send_dir = tempfile::tempdir().unwrap();
        let recv_dir = tempfile::tempdir().unwrap();
        let key = b"key";
        let text: Vec<u8> = "x".repeat(100).encode_utf16().flat_map(u16::to_le_bytes).collect();

        let archive = encode_message(&text, key, &CoverSource::disabled(), 6, 8, 10, send_dir.path())
            .await
            .unwrap();
        let recovered = decode_message(&archive, key, recv_dir.path()).await.unwrap();
        assert_eq!(recovered, &text[..10]);
    }

    #[tokio::test]
    async fn decode_rejects_archive_with_missing_tile() {
        let send_dir = tempfile::tempdir().unwrap();
        let recv_dir = tempfile::tempdir().unwrap();
        let key = b"key";
        let text: Vec<u8> = "hi".encode_utf16().flat_map(u16::to_le_bytes).collect();
        let archive_bytes =
            encode_message(&text, key, &CoverSource::disabled(), 6, 8, MAX_CONTENT_LENGTH, send_dir.path())
                .await
                .unwrap();

        let mut tiles = archive::extract(&archive_bytes).unwrap();
        tiles.pop();
        let truncated_archive = archive::create(&tiles).unwrap();

        let err = decode_message(&truncated_archive, key, recv_dir.path()).await.unwrap_err();
        assert!(matches!(err, PipelineError::TileCountMismatch { .. }));
    }
}
