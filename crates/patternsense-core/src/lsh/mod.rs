//! Structural locality-sensitive hashing.
//!
//! A subtree is reduced to a sequence of structural feature tokens, shingled,
//! and MinHashed into a fixed-length signature. Signatures are banded into
//! buckets so that structurally close subtrees collide in at least one band
//! and can be retrieved without comparing against the whole index.

mod error;
mod features;
mod minhash;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use patternsense_config::LshConfig;
use patternsense_protocols::{DocumentEnv, NodeId};

pub use error::LshError;

#[cfg(test)]
#[path = "lsh_tests.rs"]
mod tests;

/// MinHash signature of a subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub values: Vec<u32>,
    /// Hex concatenation of `values`.
    pub fingerprint: String,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Fraction of equal slots. Zero for empty or mismatched lengths.
pub fn similarity(a: &Signature, b: &Signature) -> f64 {
    if a.values.is_empty() || a.values.len() != b.values.len() {
        return 0.0;
    }
    let equal = a
        .values
        .iter()
        .zip(&b.values)
        .filter(|(x, y)| x == y)
        .count();
    equal as f64 / a.values.len() as f64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LshIndexEntry {
    pub key: String,
    pub signature: Signature,
    #[serde(default)]
    pub metadata: Value,
}

/// One retrieval hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarEntry {
    pub key: String,
    pub fingerprint: String,
    pub similarity: f64,
    #[serde(default)]
    pub metadata: Value,
}

/// Signature builder plus a banded similarity index.
#[derive(Debug)]
pub struct StructuralHasher {
    config: LshConfig,
    rows_per_band: usize,
    entries: BTreeMap<String, Vec<LshIndexEntry>>,
    keys: HashMap<String, String>,
    bands: Vec<HashMap<u64, BTreeSet<String>>>,
}

impl Default for StructuralHasher {
    fn default() -> Self {
        let config = LshConfig::default();
        let rows_per_band = config.num_hashes / config.num_bands;
        Self {
            bands: vec![HashMap::new(); config.num_bands],
            config,
            rows_per_band,
            entries: BTreeMap::new(),
            keys: HashMap::new(),
        }
    }
}

impl StructuralHasher {
    pub fn new(config: LshConfig) -> Result<Self, LshError> {
        if config.num_hashes == 0 {
            return Err(LshError::ZeroHashes);
        }
        if config.num_bands == 0 {
            return Err(LshError::ZeroBands);
        }
        if config.num_hashes % config.num_bands != 0 {
            return Err(LshError::BandsDoNotDivide {
                num_hashes: config.num_hashes,
                num_bands: config.num_bands,
            });
        }
        if config.shingle_size == 0 {
            return Err(LshError::ZeroShingle);
        }
        Ok(Self {
            rows_per_band: config.num_hashes / config.num_bands,
            bands: vec![HashMap::new(); config.num_bands],
            entries: BTreeMap::new(),
            keys: HashMap::new(),
            config,
        })
    }

    pub fn config(&self) -> &LshConfig {
        &self.config
    }

    pub fn extract_features(&self, env: &dyn DocumentEnv, node: NodeId) -> Vec<String> {
        features::extract(env, node, self.config.max_depth)
    }

    pub fn signature(&self, env: &dyn DocumentEnv, node: NodeId) -> Signature {
        self.signature_from_features(self.extract_features(env, node))
    }

    /// Identical feature sequences always produce identical signatures.
    pub fn signature_from_features(&self, features: Vec<String>) -> Signature {
        let shingles = features::shingles(&features, self.config.shingle_size);
        let values = minhash::minhash(&shingles, self.config.num_hashes);
        Signature {
            fingerprint: minhash::fingerprint(&values),
            values,
            features,
        }
    }

    fn band_keys(&self, signature: &Signature) -> Vec<u64> {
        signature
            .values
            .chunks(self.rows_per_band)
            .take(self.config.num_bands)
            .enumerate()
            .map(|(band, rows)| minhash::band_hash(band, rows))
            .collect()
    }

    fn unlink_bands(&mut self, fingerprint: &str, signature: &Signature) {
        for (band, bucket) in self.band_keys(signature).into_iter().enumerate() {
            if let Some(set) = self.bands[band].get_mut(&bucket) {
                set.remove(fingerprint);
                if set.is_empty() {
                    self.bands[band].remove(&bucket);
                }
            }
        }
    }

    /// Drop `key` from the slot it was last indexed under.
    fn detach_key(&mut self, key: &str) {
        let Some(fingerprint) = self.keys.remove(key) else {
            return;
        };
        let Some(slot) = self.entries.get_mut(&fingerprint) else {
            return;
        };
        slot.retain(|e| e.key != key);
        if slot.is_empty() {
            self.entries.remove(&fingerprint);
        }
    }

    /// Index a signature. Several keys may share a fingerprint; re-adding a
    /// key replaces its previous entry wherever it was indexed.
    pub fn add_to_index(&mut self, key: impl Into<String>, signature: Signature, metadata: Value) {
        let key = key.into();
        let fingerprint = signature.fingerprint.clone();

        if let Some(previous) = self.keys.get(&key).cloned() {
            let old_signature = self
                .entries
                .get(&previous)
                .and_then(|slot| slot.iter().find(|e| e.key == key))
                .map(|e| e.signature.clone());
            self.detach_key(&key);
            if previous != fingerprint && !self.entries.contains_key(&previous) {
                if let Some(old) = old_signature {
                    self.unlink_bands(&previous, &old);
                }
            }
        }

        for (band, bucket) in self.band_keys(&signature).into_iter().enumerate() {
            self.bands[band]
                .entry(bucket)
                .or_default()
                .insert(fingerprint.clone());
        }
        debug!(key = %key, fingerprint = %fingerprint, "Indexed signature");

        self.keys.insert(key.clone(), fingerprint.clone());
        self.entries.entry(fingerprint).or_default().push(LshIndexEntry {
            key,
            signature,
            metadata,
        });
    }

    /// Remove every entry with `fingerprint`. Returns whether any existed.
    pub fn remove_from_index(&mut self, fingerprint: &str) -> bool {
        let Some(removed) = self.entries.remove(fingerprint) else {
            return false;
        };
        for entry in &removed {
            self.keys.remove(&entry.key);
        }
        if let Some(entry) = removed.first() {
            self.unlink_bands(fingerprint, &entry.signature);
        }
        true
    }

    pub fn clear_index(&mut self) {
        self.entries.clear();
        self.keys.clear();
        for band in &mut self.bands {
            band.clear();
        }
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries colliding with `signature` in any band, with similarity at
    /// least `min_similarity`, best first. Ties order by key.
    pub fn query_similar(
        &self,
        signature: &Signature,
        min_similarity: f64,
        limit: usize,
    ) -> Vec<SimilarEntry> {
        let mut candidates: BTreeSet<&str> = BTreeSet::new();
        for (band, bucket) in self.band_keys(signature).into_iter().enumerate() {
            if let Some(set) = self.bands[band].get(&bucket) {
                candidates.extend(set.iter().map(String::as_str));
            }
        }

        let mut hits: Vec<SimilarEntry> = candidates
            .into_iter()
            .filter_map(|fp| self.entries.get(fp))
            .flatten()
            .filter_map(|entry| {
                let score = similarity(signature, &entry.signature);
                (score >= min_similarity).then(|| SimilarEntry {
                    key: entry.key.clone(),
                    fingerprint: entry.signature.fingerprint.clone(),
                    similarity: score,
                    metadata: entry.metadata.clone(),
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.key.cmp(&b.key))
        });
        hits.truncate(limit);
        hits
    }
}
