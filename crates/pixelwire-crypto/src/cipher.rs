// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! AES-256-CBC payload cipher, keyed by the SHA-256 digest of arbitrary key
//! material (the DH shared secret, little-endian encoded).
//!
//! Wire format: `IV(16) || AES-CBC(SHA256(key), IV, pad(UTF-16(plaintext)))`.
//! Padding is the PKCS#7 byte pattern `n × chr(n)`, but — matching the
//! source — `decrypt` does not verify that all `n` padding bytes equal `n`,
//! only that `n` itself is in `1..=16`. This is a deliberate fidelity to a
//! quirk called out in spec.md §4.3/§9, not an oversight.

use aes::Aes256;
use cbc::{Decryptor, Encryptor};
use cipher::block_padding::NoPadding;
use cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

const BLOCK_SIZE: usize = 16;

pub struct AesCbcCipher {
    key: [u8; 32],
}

impl AesCbcCipher {
    /// Hash arbitrary key material with SHA-256 to obtain the 32-byte AES key.
    pub fn new(key_material: &[u8]) -> Self {
        let key = Sha256::digest(key_material).into();
        Self { key }
    }

    /// Encode `plaintext` as UTF-16, pad, encrypt under a fresh random IV,
    /// and prefix the IV. Distinct on every call (IV randomness).
    pub fn encrypt(&self, plaintext: &str) -> Vec<u8> {
        let encoded: Vec<u8> = plaintext.encode_utf16().flat_map(u16::to_le_bytes).collect();
        let padded = pkcs7_pad(&encoded);

        let mut iv = [0u8; BLOCK_SIZE];
        rand::thread_rng().fill_bytes(&mut iv);

        let encryptor = Encryptor::<Aes256>::new(&self.key.into(), &iv.into());
        let ciphertext = encryptor.encrypt_padded_vec_mut::<NoPadding>(&padded);

        let mut out = Vec::with_capacity(BLOCK_SIZE + ciphertext.len());
        out.extend_from_slice(&iv);
        out.extend_from_slice(&ciphertext);
        out
    }

    /// Split the leading IV, decrypt, strip the trailing padding, and
    /// decode the result as UTF-16.
    pub fn decrypt(&self, data: &[u8]) -> Result<String, CryptoError> {
        if data.len() < BLOCK_SIZE {
            return Err(CryptoError::CiphertextTooShort);
        }
        let (iv, ciphertext) = data.split_at(BLOCK_SIZE);
        if ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(CryptoError::Unaligned);
        }

        let decryptor = Decryptor::<Aes256>::new(&self.key.into(), iv.into());
        let padded = decryptor
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
            .map_err(|_| CryptoError::Unaligned)?;

        let unpadded = pkcs7_unpad(&padded)?;

        if unpadded.len() % 2 != 0 {
            return Err(CryptoError::InvalidUtf16);
        }
        let units: Vec<u16> = unpadded
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16(&units).map_err(|_| CryptoError::InvalidUtf16)
    }
}

fn pkcs7_pad(data: &[u8]) -> Vec<u8> {
    let n = BLOCK_SIZE - (data.len() % BLOCK_SIZE);
    let mut out = Vec::with_capacity(data.len() + n);
    out.extend_from_slice(data);
    out.extend(std::iter::repeat(n as u8).take(n));
    out
}

/// Read the last byte as the pad count and strip that many bytes. Does not
/// verify the other padding bytes equal `n` — see module docs.
fn pkcs7_unpad(data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let n = *data.last().ok_or(CryptoError::CiphertextTooShort)? as usize;
    if n == 0 || n > BLOCK_SIZE || n > data.len() {
        return Err(CryptoError::BadPadding(n as u8));
    }
    Ok(data[..data.len() - n].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_ascii() {
        let cipher = AesCbcCipher::new(b"some shared secret");
        let ct = cipher.encrypt("hello");
        assert_eq!(cipher.decrypt(&ct).unwrap(), "hello");
    }

    #[test]
    fn round_trip_empty_string() {
        let cipher = AesCbcCipher::new(b"key");
        let ct = cipher.encrypt("");
        assert_eq!(cipher.decrypt(&ct).unwrap(), "");
    }

    #[test]
    fn round_trip_unicode() {
        let cipher = AesCbcCipher::new(b"key");
        let msg = "h\u{00e9}llo \u{1f600}";
        let ct = cipher.encrypt(msg);
        assert_eq!(cipher.decrypt(&ct).unwrap(), msg);
    }

    #[test]
    fn two_encryptions_of_the_same_plaintext_differ() {
        let cipher = AesCbcCipher::new(b"key");
        let a = cipher.encrypt("same message");
        let b = cipher.encrypt("same message");
        assert_ne!(a, b, "random IV must make ciphertexts distinct");
        assert_eq!(cipher.decrypt(&a).unwrap(), "same message");
        assert_eq!(cipher.decrypt(&b).unwrap(), "same message");
    }

    #[test]
    fn rejects_zero_padding_byte() {
        let cipher = AesCbcCipher::new(b"key");
        let mut ct = cipher.encrypt("x");
        let last = ct.len() - 1;
        // Corrupt the final plaintext block's pad-count byte after
        // re-encrypting a crafted padded buffer would be needed to hit this
        // through the real pipeline; here we exercise pkcs7_unpad directly.
        let _ = &mut ct[last];
        assert!(matches!(pkcs7_unpad(&[0u8]), Err(CryptoError::BadPadding(0))));
        assert!(matches!(pkcs7_unpad(&[17u8]), Err(CryptoError::BadPadding(17))));
    }

    #[test]
    fn different_keys_do_not_decrypt_each_others_ciphertext() {
        let a = AesCbcCipher::new(b"key-a");
        let b = AesCbcCipher::new(b"key-b");
        let ct = a.encrypt("secret");
        // Either a hard error or, rarely, garbage text — never the original.
        match b.decrypt(&ct) {
            Ok(s) => assert_ne!(s, "secret"),
            Err(_) => {}
        }
    }
}
