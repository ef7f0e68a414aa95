//! Content fingerprints stored in version comments.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

/// Tag prefix of change comments written by docsync.
const COMMENT_TAG: &str = "docsync";

static FINGERPRINT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[v([a-f0-9]{64})\]$").expect("valid regex"));

/// SHA-256 hex digest of uploaded content.
///
/// Written into the version comment on upload and read back on the next run
/// to skip unchanged content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint raw bytes.
    #[must_use]
    pub fn of_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hex::encode(hasher.finalize()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Version comment carrying this fingerprint.
    #[must_use]
    pub fn change_comment(&self) -> String {
        format!("{COMMENT_TAG} [v{}]", self.0)
    }

    /// Extract the fingerprint from a version comment.
    ///
    /// Returns `None` for comments not written by docsync.
    #[must_use]
    pub fn from_change_comment(comment: &str) -> Option<Self> {
        FINGERPRINT_PATTERN
            .captures(comment.trim_end())
            .map(|caps| Self(caps[1].to_owned()))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_of_bytes_is_sha256() {
        assert_eq!(
            Fingerprint::of_bytes(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_change_comment_round_trip() {
        let fingerprint = Fingerprint::of_bytes(b"diagram");
        let comment = fingerprint.change_comment();
        assert!(comment.starts_with("docsync [v"));
        assert_eq!(Fingerprint::from_change_comment(&comment), Some(fingerprint));
    }

    #[test]
    fn test_foreign_comment_has_no_fingerprint() {
        assert_eq!(Fingerprint::from_change_comment("Uploaded by alice"), None);
        assert_eq!(Fingerprint::from_change_comment("[vdeadbeef]"), None);
    }
}
