//! Content-addressed id derivation.
//!
//! Every entity id in this crate is `sha1(field ‖ field ‖ ...)` over the
//! fields enumerated in its identity formula. Hashing helpers here mirror
//! the original implementation's `hashString`/`hashInt`/`hashUint64` (they
//! fed each field into a running `sha1.Hash` rather than concatenating a
//! string first), so re-creating an entity from the same fields always
//! yields the same digest.

use sha1::{Digest, Sha1};

/// Incrementally hashed id builder. Each `feed_*` call mixes one field into
/// the running digest in call order, matching the field order in a given
/// entity's identity formula.
pub struct IdHasher(Sha1);

impl IdHasher {
    pub fn new() -> Self {
        Self(Sha1::new())
    }

    pub fn feed_str(mut self, s: &str) -> Self {
        self.0.update(s.as_bytes());
        self
    }

    pub fn feed_u64(mut self, n: u64) -> Self {
        self.0.update(n.to_string().as_bytes());
        self
    }

    pub fn feed_int(mut self, n: i64) -> Self {
        self.0.update(n.to_string().as_bytes());
        self
    }

    /// Mixes in the canonical JSON of a serializable value (used for the
    /// `Action` id, which hashes its `params` map).
    pub fn feed_json(self, v: &serde_json::Value) -> Self {
        self.feed_str(&crate::canonical_json::to_canonical_json(v))
    }

    pub fn finish(self) -> String {
        format!("{:x}", self.0.finalize())
    }
}

impl Default for IdHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// MD5 hex digest of a byte stream, used for the `File.checksum` invariant.
pub fn md5_hex(bytes: &[u8]) -> String {
    use md5::{Digest as Md5Digest, Md5};
    let mut h = Md5::new();
    h.update(bytes);
    format!("{:x}", h.finalize())
}
