// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Provisional ids for entities created while offline.
//!
//! The server may assign its own id when it confirms the write; the
//! reconciler re-keys the record in that case.

use sha2::{Digest, Sha256};

use crate::clock::Stamp;

/// Generate a provisional entity id from prefix, seed text and stamp.
/// Format: {prefix}-{hash} where hash is first 8 hex chars of SHA256(seed + stamp)
pub fn provisional_id(prefix: &str, seed: &str, stamp: Stamp) -> String {
    let input = format!("{}{}", seed, stamp);
    let hash = Sha256::digest(input.as_bytes());
    let short_hash = hex::encode(&hash[..4]);
    format!("{}-{}", prefix, short_hash)
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
