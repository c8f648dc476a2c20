// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
pub mod archive;
pub mod cover;
pub mod error;
pub mod lsb;
pub mod metadata;
pub mod pipeline;
pub mod tiling;

pub use cover::CoverSource;
pub use error::PipelineError;
pub use pipeline::{decode_message, encode_message, DEFAULT_COLS, DEFAULT_ROWS, MAX_CONTENT_LENGTH};
pub use tiling::Tile;
