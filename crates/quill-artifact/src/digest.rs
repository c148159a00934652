//! Snapshot digests
//!
//! Provides [`ContentDigest`], a 32-byte Blake3 digest stamped on every
//! committed version so callers can tell identical saves apart from edits
//! without comparing full text.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A 32-byte content digest (Blake3)
///
/// Immutable and cheap to copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Digest of a text snapshot
    #[inline]
    #[must_use]
    pub fn of_text(text: &str) -> Self {
        Self(*blake3::hash(text.as_bytes()).as_bytes())
    }

    /// Raw bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 16 hex chars, for logs and CLI listings
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for ContentDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for ContentDigest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| DigestError::InvalidLength(bytes.len()))?;
        Ok(Self(arr))
    }
}

impl serde::Serialize for ContentDigest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for ContentDigest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors when parsing a digest
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("invalid digest length: expected 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(ContentDigest::of_text("abc"), ContentDigest::of_text("abc"));
        assert_ne!(ContentDigest::of_text("abc"), ContentDigest::of_text("abd"));
    }

    #[test]
    fn digest_display_parses_back() {
        let digest = ContentDigest::of_text("print(1)");
        let parsed: ContentDigest = digest.to_string().parse().unwrap();
        assert_eq!(digest, parsed);
    }

    #[test]
    fn digest_rejects_short_hex() {
        let result = "abcd".parse::<ContentDigest>();
        assert!(matches!(result, Err(DigestError::InvalidLength(2))));
    }

    #[test]
    fn digest_short_prefixes_full() {
        let digest = ContentDigest::of_text("x");
        assert_eq!(digest.short().len(), 16);
        assert!(digest.to_string().starts_with(&digest.short()));
    }

    #[test]
    fn digest_serializes_as_hex_string() {
        let digest = ContentDigest::of_text("x");
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{digest}\""));
        let back: ContentDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);
    }
}
