//! Content fingerprints for cached transcripts.

use sha2::{Digest, Sha256};

/// SHA-256 of the UTF-8 content, as 64 lowercase hex characters.
pub fn compute(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// True when `fingerprint` is the hash of `content`.
pub fn verify(content: &str, fingerprint: &str) -> bool {
    compute(content).eq_ignore_ascii_case(fingerprint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let text = "Never gonna give you up\nNever gonna let you down";
        assert_eq!(compute(text), compute(text));
        assert_eq!(compute(text).len(), 64);
    }

    #[test]
    fn test_distinct_texts_have_distinct_fingerprints() {
        let fixtures = [
            "",
            "hello",
            "hello ",
            "Hello",
            "zażółć gęślą jaźń",
            "line one\nline two",
            "line one\nline two\n",
        ];
        for (i, a) in fixtures.iter().enumerate() {
            for b in fixtures.iter().skip(i + 1) {
                assert_ne!(compute(a), compute(b), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_known_vector() {
        assert_eq!(
            compute("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify() {
        let fp = compute("content");
        assert!(verify("content", &fp));
        assert!(verify("content", &fp.to_uppercase()));
        assert!(!verify("content!", &fp));
    }
}
