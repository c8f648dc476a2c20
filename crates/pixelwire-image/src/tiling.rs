// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Grid tiling: split a stego image into `rows` x `cols` tiles and
//! reassemble them later, in any order, via their `(row, col)` tags.
//!
//! Mirrors `original_source/image_split.py`'s `split_image`: tile size is
//! `width / cols` x `height / rows` (integer division), and the last row
//! and last column absorb whatever pixels don't divide evenly.

use image::{RgbImage, SubImage};

use crate::error::PipelineError;

#[derive(Debug, Clone)]
pub struct Tile {
    pub row: u32,
    pub col: u32,
    pub image: RgbImage,
}

/// Split `img` into a `rows` x `cols` grid of [`Tile`]s, row-major order.
pub fn split(img: &RgbImage, rows: u32, cols: u32) -> Vec<Tile> {
    let tile_w = img.width() / cols;
    let tile_h = img.height() / rows;

    let mut tiles = Vec::with_capacity((rows * cols) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let x = col * tile_w;
            let y = row * tile_h;
            let w = if col == cols - 1 { img.width() - x } else { tile_w };
            let h = if row == rows - 1 { img.height() - y } else { tile_h };

            let sub: SubImage<&RgbImage> = image::imageops::crop_imm(img, x, y, w, h);
            tiles.push(Tile {
                row,
                col,
                image: sub.to_image(),
            });
        }
    }
    tiles
}

/// Reassemble tiles previously produced by [`split`] back into one image.
///
/// Tiles may arrive in any order; `(row, col)` alone determines placement.
/// Canvas size is derived from the tiles themselves rather than passed in,
/// since the nominal tile size absorbed the rounding residual in the last
/// row/column: the first row/column's tile gives the nominal size, and the
/// last row/column's tile gives the (possibly larger) trailing size.
pub fn restore(mut tiles: Vec<Tile>) -> Result<RgbImage, PipelineError> {
    tiles.sort_by_key(|t| (t.row, t.col));

    let rows = tiles.iter().map(|t| t.row).max().map(|m| m + 1).unwrap_or(0);
    let cols = tiles.iter().map(|t| t.col).max().map(|m| m + 1).unwrap_or(0);
    let expected = (rows * cols) as usize;
    if tiles.len() != expected {
        return Err(PipelineError::TileCountMismatch {
            expected,
            found: tiles.len(),
        });
    }

    let mut seen = vec![false; expected];
    for t in &tiles {
        let idx = (t.row * cols + t.col) as usize;
        if seen[idx] {
            return Err(PipelineError::DuplicateTile { row: t.row, col: t.col });
        }
        seen[idx] = true;
    }

    let tile_w = tiles[0].image.width();
    let tile_h = tiles[0].image.height();
    let last_col_w = tiles.iter().find(|t| t.col == cols - 1).unwrap().image.width();
    let last_row_h = tiles.iter().find(|t| t.row == rows - 1).unwrap().image.height();

    let total_w = tile_w * (cols - 1) + last_col_w;
    let total_h = tile_h * (rows - 1) + last_row_h;

    let mut canvas = RgbImage::new(total_w, total_h);
    for t in &tiles {
        let x = t.col * tile_w;
        let y = t.row * tile_h;
        image::imageops::replace(&mut canvas, &t.image, x as i64, y as i64);
    }
    Ok(canvas)
}
