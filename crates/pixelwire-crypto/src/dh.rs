// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Unauthenticated Diffie-Hellman key agreement over a small prime group.
//!
//! Preserves the wire format and group size of the source implementation:
//! `p` is a 3-5 decimal digit prime, `g` a primitive root of `p`, and the
//! private scalar `x` a 5-digit integer. This offers no real security (see
//! spec.md §9) — it is kept as-is rather than hardened.

use rand::Rng;

use crate::error::CryptoError;

const PRIME_LOWER: u64 = 100;
const PRIME_UPPER: u64 = 99_999;
const SCALAR_LOWER: u64 = 10_000;
const SCALAR_UPPER: u64 = 99_999;

/// One side of a single DH exchange. Each direction of an encrypted socket
/// owns its own `DhEndpoint` with an independently drawn `(p, g, x)`.
#[derive(Debug, Clone)]
pub struct DhEndpoint {
    p: u64,
    g: u64,
    private_key: u64,
    shared_secret: Option<u64>,
}

impl DhEndpoint {
    pub fn new(p: u64, g: u64, private_key: u64) -> Self {
        Self {
            p,
            g,
            private_key,
            shared_secret: None,
        }
    }

    /// Draw a fresh `(p, g, x)` triple: `p` a random small prime, `g` a
    /// primitive root of `p` (not a second random prime — the source has a
    /// variant that does this and it is a bug, see spec.md §9), `x` a random
    /// 5-digit scalar.
    pub fn random(rng: &mut impl Rng) -> Self {
        let p = random_prime(rng);
        let g = find_primitive_root(p);
        let private_key = rng.gen_range(SCALAR_LOWER..=SCALAR_UPPER);
        Self::new(p, g, private_key)
    }

    pub fn p(&self) -> u64 {
        self.p
    }

    pub fn g(&self) -> u64 {
        self.g
    }

    /// `g^x mod p`.
    pub fn generate_public_key(&self) -> u64 {
        modpow(self.g, self.private_key, self.p)
    }

    /// `peer_public^x mod p`. Stores and returns the shared secret.
    pub fn generate_full_key(&mut self, peer_public: u64) -> u64 {
        let k = modpow(peer_public, self.private_key, self.p);
        self.shared_secret = Some(k);
        k
    }

    pub fn shared_secret(&self) -> Option<u64> {
        self.shared_secret
    }
}

/// Modular exponentiation via square-and-multiply, widened to `u128` to
/// avoid overflow on intermediate squarings.
pub fn modpow(mut base: u64, mut exp: u64, modulus: u64) -> u64 {
    if modulus == 1 {
        return 0;
    }
    let mut result: u128 = 1;
    let modulus = modulus as u128;
    base = base % modulus as u64;
    let mut base = base as u128;
    while exp > 0 {
        if exp & 1 == 1 {
            result = (result * base) % modulus;
        }
        exp >>= 1;
        base = (base * base) % modulus;
    }
    result as u64
}

fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

fn random_prime(rng: &mut impl Rng) -> u64 {
    loop {
        let candidate = rng.gen_range(PRIME_LOWER..=PRIME_UPPER);
        if is_prime(candidate) {
            return candidate;
        }
    }
}

/// Trial-division factorization of `n`, returning its distinct prime factors.
fn prime_factors(mut n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    let mut d = 2;
    while d * d <= n {
        if n % d == 0 {
            factors.push(d);
            while n % d == 0 {
                n /= d;
            }
        }
        d += 1;
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

/// Smallest primitive root of prime `p`. For `p == 2` the only residue is 1.
///
/// A value `g` is a primitive root of prime `p` iff for every prime factor
/// `q` of `p - 1`, `g^((p-1)/q) mod p != 1`.
pub fn find_primitive_root(p: u64) -> u64 {
    if p == 2 {
        return 1;
    }
    let order = p - 1;
    let factors = prime_factors(order);
    'candidate: for g in 2..p {
        for &q in &factors {
            if modpow(g, order / q, p) == 1 {
                continue 'candidate;
            }
        }
        return g;
    }
    // p prime implies a primitive root always exists; unreachable in practice.
    1
}

/// Minimal-length little-endian encoding, matching the source's
/// `int_to_bytes`/`bytes_to_int` wire format for handshake integers.
pub fn int_to_bytes(mut n: u64) -> Vec<u8> {
    if n == 0 {
        return vec![0];
    }
    let mut bytes = Vec::new();
    while n > 0 {
        bytes.push((n & 0xff) as u8);
        n >>= 8;
    }
    bytes
}

pub fn bytes_to_int(bytes: &[u8]) -> Result<u64, CryptoError> {
    if bytes.len() > 8 {
        return Err(CryptoError::KeyAgreement(
            "handshake integer wider than 64 bits".into(),
        ));
    }
    let mut n: u64 = 0;
    for (i, &b) in bytes.iter().enumerate() {
        n |= (b as u64) << (8 * i);
    }
    Ok(n)
}
