//! Content-addressed hashing primitives
//!
//! Provides [`ContentHash`], a strongly-typed 32-byte SHA-256 digest, and
//! [`ContentHasher`], which normalizes BPMN source text before hashing so that
//! formatting-only edits resolve to the same version.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Digest length in bytes
const HASH_LEN: usize = 32;

/// SHA-256 digest of normalized file content
///
/// The canonical text form is 64 lowercase hex characters; that form is what
/// appears in storage paths, JSON and the metadata database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash([u8; HASH_LEN]);

impl ContentHash {
    /// SHA-256 of raw bytes, no normalization
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Parse the canonical lowercase hex form
    ///
    /// # Errors
    /// Wrong length, uppercase or non-hex characters
    pub fn from_hex(s: &str) -> Result<Self, HashError> {
        let canonical = s.len() == HASH_LEN * 2
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !canonical {
            return Err(HashError::Malformed(s.to_string()));
        }
        let mut bytes = [0u8; HASH_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| HashError::Malformed(s.to_string()))?;
        Ok(Self(bytes))
    }

    /// Full hex rendering
    #[inline]
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 16 hex chars, for log lines
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = HashError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.to_hex()
    }
}

/// Normalizing hasher for BPMN source text
///
/// Whitespace-insensitive: re-indentation, CRLF vs LF and trailing blank
/// lines do not change the hash. Any other text change does.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher;

impl ContentHasher {
    /// Trim, then collapse every whitespace run into a single ASCII space
    #[must_use]
    pub fn normalize(content: &str) -> String {
        let mut out = String::with_capacity(content.len());
        for word in content.split_whitespace() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(word);
        }
        out
    }

    /// Hash of the normalized content
    #[must_use]
    pub fn hash(content: &str) -> ContentHash {
        ContentHash::compute(Self::normalize(content).as_bytes())
    }
}

/// Content hash parse failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashError {
    /// Not 64 lowercase hex characters
    #[error("not a content hash: '{0}'")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hex_requires_canonical_form() {
        let hex = ContentHasher::hash("x").to_hex();
        assert!(ContentHash::from_hex(&hex).is_ok());
        assert!(ContentHash::from_hex(&hex[..62]).is_err());
        assert_eq!(
            ContentHash::from_hex(&hex.to_uppercase()),
            Err(HashError::Malformed(hex.to_uppercase()))
        );
    }

    #[test]
    fn compute_matches_known_sha256() {
        let hash = ContentHash::compute(b"abc");
        assert_eq!(
            hash.to_string(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn display_is_64_lowercase_hex() {
        let s = ContentHasher::hash("<definitions/>").to_string();
        assert_eq!(s.len(), 64);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn display_and_parse() {
        let hash = ContentHasher::hash("<process id=\"p\"/>");
        let parsed: ContentHash = hash.to_string().parse().unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn parse_rejects_bad_hex() {
        assert!(matches!(
            "zz".parse::<ContentHash>(),
            Err(HashError::Malformed(_))
        ));
    }

    #[test]
    fn short_is_prefix() {
        let hash = ContentHasher::hash("x");
        assert_eq!(hash.short().len(), 16);
        assert!(hash.to_hex().starts_with(&hash.short()));
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(
            ContentHasher::normalize("  <a>\r\n\t  <b/>\n</a>\n\n"),
            "<a> <b/> </a>"
        );
        assert_eq!(ContentHasher::normalize(" \n\t "), "");
    }

    #[test]
    fn formatting_only_edits_hash_identically() {
        let lf = "<process>\n  <task id=\"a\"/>\n</process>\n";
        let crlf = "<process>\r\n    <task id=\"a\"/>\r\n</process>\r\n\r\n";
        let tabs = "\t<process>\t<task   id=\"a\"/></process>";
        assert_eq!(ContentHasher::hash(lf), ContentHasher::hash(crlf));
        assert_eq!(ContentHasher::hash(lf), ContentHasher::hash(tabs));
    }

    #[test]
    fn semantic_edit_changes_hash() {
        let a = ContentHasher::hash("<task id=\"a\"/>");
        let b = ContentHasher::hash("<task id=\"b\"/>");
        assert_ne!(a, b);
    }

    #[test]
    fn serde_json_uses_hex_string() {
        let hash = ContentHasher::hash("test");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{hash}\""));
        let decoded: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, decoded);
        assert!(serde_json::from_str::<ContentHash>("\"abc\"").is_err());
    }
}
