// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
pub mod cipher;
pub mod dh;
pub mod error;

pub use cipher::AesCbcCipher;
pub use dh::{bytes_to_int, find_primitive_root, int_to_bytes, modpow, DhEndpoint};
pub use error::CryptoError;
