// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Least-significant-bit steganography: embed/reveal an arbitrary byte
//! string in the low bit of each RGB channel, row-major pixel order.
//!
//! Wire shape: a 4-byte big-endian length header followed by that many
//! payload bytes, both bit-serialised MSB-first into one continuous stream
//! of channel LSBs, exactly as spec.md §4.4/§6 specify. This is THE CORE
//! C4/C5 transform — not a call into an external stego library — so it is
//! implemented directly rather than assumed. (`original_source/steganography.py`
//! is a thin wrapper around the third-party `stegano.lsb` package and
//! carries none of this bit-order/header logic itself.)

use image::RgbImage;

use crate::error::PipelineError;

const HEADER_BYTES: usize = 4;

/// Total LSB capacity of a `width` x `height` RGB image, in bytes.
pub fn capacity_bytes(width: u32, height: u32) -> usize {
    (width as usize * height as usize * 3) / 8
}

/// Embed `payload` into `img`'s pixel LSBs in place.
pub fn embed(img: &mut RgbImage, payload: &[u8]) -> Result<(), PipelineError> {
    let capacity = capacity_bytes(img.width(), img.height());
    if HEADER_BYTES + payload.len() > capacity {
        return Err(PipelineError::CapacityExceeded {
            payload_bytes: payload.len(),
            capacity_bytes: capacity,
        });
    }

    let header = (payload.len() as u32).to_be_bytes();
    let mut bits = bits_msb_first(&header).chain(bits_msb_first(payload));

    'pixels: for pixel in img.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            match bits.next() {
                Some(bit) => *channel = (*channel & !1) | bit,
                None => break 'pixels,
            }
        }
    }
    Ok(())
}

/// Recover the payload previously embedded by [`embed`].
pub fn reveal(img: &RgbImage) -> Result<Vec<u8>, PipelineError> {
    let mut bits = img.pixels().flat_map(|p| [p[0] & 1, p[1] & 1, p[2] & 1]);

    let header_bytes = bytes_from_bits(&mut bits, HEADER_BYTES).ok_or(PipelineError::RevealTruncated)?;
    let len = u32::from_be_bytes(header_bytes.try_into().unwrap()) as usize;

    let capacity = capacity_bytes(img.width(), img.height());
    if HEADER_BYTES + len > capacity {
        return Err(PipelineError::RevealTruncated);
    }

    bytes_from_bits(&mut bits, len).ok_or(PipelineError::RevealTruncated)
}

fn bits_msb_first(bytes: &[u8]) -> impl Iterator<Item = u8> + '_ {
    bytes.iter().flat_map(|&b| (0..8).rev().map(move |i| (b >> i) & 1))
}

fn bytes_from_bits(bits: &mut impl Iterator<Item = u8>, n: usize) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let mut byte = 0u8;
        for _ in 0..8 {
            byte = (byte << 1) | bits.next()?;
        }
        out.push(byte);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, image::Rgb([128, 128, 128]))
    }

    #[test]
    fn round_trip_small_payload() {
        let mut img = blank(16, 16);
        let payload = b"hello, hidden world";
        embed(&mut img, payload).unwrap();
        assert_eq!(reveal(&img).unwrap(), payload);
    }

    #[test]
    fn round_trip_empty_payload() {
        let mut img = blank(8, 8);
        embed(&mut img, &[]).unwrap();
        assert_eq!(reveal(&img).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn embed_rejects_payload_over_capacity() {
        let mut img = blank(4, 4); // capacity = 4*4*3/8 = 6 bytes
        let payload = vec![0u8; 64];
        let err = embed(&mut img, &payload).unwrap_err();
        assert!(matches!(err, PipelineError::CapacityExceeded { .. }));
    }

    #[test]
    fn embedding_only_perturbs_the_low_bit() {
        let mut img = blank(16, 16);
        let before = img.clone();
        embed(&mut img, b"x").unwrap();
        for (a, b) in before.pixels().zip(img.pixels()) {
            for c in 0..3 {
                assert!(a[c].abs_diff(b[c]) <= 1, "channel moved by more than one LSB");
            }
        }
    }

    #[test]
    fn round_trip_at_default_cover_capacity() {
        use crate::cover::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
        let mut img = blank(DEFAULT_WIDTH, DEFAULT_HEIGHT);
        let payload = vec![0x5au8; capacity_bytes(DEFAULT_WIDTH, DEFAULT_HEIGHT) - HEADER_BYTES];
        embed(&mut img, &payload).unwrap();
        assert_eq!(reveal(&img).unwrap(), payload);
    }
}
