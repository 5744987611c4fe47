//! MinHash over seeded FNV-1a permutations.

use std::collections::BTreeSet;

const FNV32_OFFSET: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;
const FNV64_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV64_PRIME: u64 = 0x0100_0000_01b3;
const SEED_STEP: u32 = 0x9e37_79b9;

/// FNV-1a 32 with the offset basis perturbed by `seed`.
pub(crate) fn fnv1a32_seeded(seed: u32, bytes: &[u8]) -> u32 {
    let mut hash = FNV32_OFFSET ^ seed;
    for byte in bytes {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(FNV32_PRIME);
    }
    hash
}

pub(crate) fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV64_OFFSET;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV64_PRIME);
    }
    hash
}

/// One minimum per permutation. Empty input leaves every slot at `u32::MAX`.
pub(crate) fn minhash(shingles: &BTreeSet<String>, num_hashes: usize) -> Vec<u32> {
    (0..num_hashes)
        .map(|i| {
            let seed = (i as u32).wrapping_mul(SEED_STEP);
            shingles
                .iter()
                .map(|s| fnv1a32_seeded(seed, s.as_bytes()))
                .min()
                .unwrap_or(u32::MAX)
        })
        .collect()
}

pub(crate) fn fingerprint(values: &[u32]) -> String {
    values.iter().map(|v| format!("{:08x}", v)).collect()
}

/// Bucket hash of one band.
pub(crate) fn band_hash(band: usize, rows: &[u32]) -> u64 {
    let mut bytes = Vec::with_capacity(8 + rows.len() * 4);
    bytes.extend_from_slice(&(band as u64).to_le_bytes());
    for v in rows {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    fnv1a64(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv32_unseeded_matches_reference() {
        assert_eq!(fnv1a32_seeded(0, b""), 0x811c_9dc5);
        assert_eq!(fnv1a32_seeded(0, b"a"), 0xe40c_292c);
    }

    #[test]
    fn test_fnv64_reference() {
        assert_eq!(fnv1a64(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a64(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_minhash_empty_set() {
        let values = minhash(&BTreeSet::new(), 4);
        assert_eq!(values, vec![u32::MAX; 4]);
        assert_eq!(fingerprint(&values), "ffffffff".repeat(4));
    }

    #[test]
    fn test_fingerprint_width() {
        assert_eq!(fingerprint(&[1, 0xabc]), "0000000100000abc");
    }
}
