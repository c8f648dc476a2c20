// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("io error at '{0}': {1}")]
    Io(String, #[source] std::io::Error),

    #[error("png encode error: {0}")]
    PngEncode(String),

    #[error("png decode error: {0}")]
    PngDecode(String),

    #[error("zip error: {0}")]
    Zip(String),

    #[error("cover image fetch failed: {0}")]
    CoverFetch(String),

    #[error("ciphertext of {payload_bytes} bytes does not fit the cover image's LSB capacity of {capacity_bytes} bytes")]
    CapacityExceeded {
        payload_bytes: usize,
        capacity_bytes: usize,
    },

    #[error("embedded payload is truncated or corrupt")]
    RevealTruncated,

    #[error("tile at '{0}' has no 'Description' metadata")]
    MissingMetadata(String),

    #[error("tile at '{0}' has an unparseable 'Description' value: '{1}'")]
    UnparseableMetadata(String, String),

    #[error("expected {expected} tiles for a complete grid, found {found}")]
    TileCountMismatch { expected: usize, found: usize },

    #[error("duplicate tile at row {row}, column {col}")]
    DuplicateTile { row: u32, col: u32 },

    #[error("crypto error: {0}")]
    Crypto(#[from] pixelwire_crypto::CryptoError),
}
