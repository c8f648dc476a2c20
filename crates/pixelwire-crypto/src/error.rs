// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("key agreement error: {0}")]
    KeyAgreement(String),

    #[error("ciphertext too short to contain an IV")]
    CiphertextTooShort,

    #[error("ciphertext length is not a multiple of the AES block size")]
    Unaligned,

    #[error("corrupt padding byte: {0}")]
    BadPadding(u8),

    #[error("plaintext is not valid UTF-16")]
    InvalidUtf16,
}
