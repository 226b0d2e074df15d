//! Candidate descriptor extraction from fetched bodies.
//!
//! Subscription endpoints serve either plain descriptor lines or base64 blocks that
//! decode to such lines, sometimes mixed within one body.

use regex::Regex;

use strum::IntoEnumIterator;

use crate::descriptor::{decode_base64, Protocol};

const DESCRIPTOR_PATTERN: &str = r"^(vmess|vless|trojan|ss)://";

/// Pulls candidate descriptor lines out of raw text.
#[derive(Debug, Clone)]
pub struct CandidateExtractor {
    descriptor_line: Regex,
}

impl CandidateExtractor {
    /// # Errors
    ///
    /// Returns an error if the descriptor pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            descriptor_line: Regex::new(DESCRIPTOR_PATTERN)?,
        })
    }

    /// Candidate lines of `body`, in the order they appear.
    ///
    /// A body without any plain descriptor line is first tried as one base64 block
    /// with whitespace removed, which covers blocks wrapped over several lines.
    /// Otherwise each line is taken as-is when it starts with a known scheme, or
    /// base64-decoded on its own and its decoded descriptor lines taken.
    pub fn extract(&self, body: &str) -> Vec<String> {
        let mut candidates = Vec::new();

        let has_plain_line = body
            .lines()
            .any(|line| self.descriptor_line.is_match(line.trim()));
        if !has_plain_line {
            let compact: String = body.split_whitespace().collect();
            if let Some(decoded) = decode_base64(&compact) {
                self.push_decoded(&decoded, &mut candidates);
                if !candidates.is_empty() {
                    return candidates;
                }
            }
        }

        for line in body.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if self.descriptor_line.is_match(line) {
                candidates.push(line.to_string());
            } else if let Some(decoded) = decode_base64(line) {
                self.push_decoded(&decoded, &mut candidates);
            }
        }

        candidates
    }

    fn push_decoded(&self, decoded: &str, candidates: &mut Vec<String>) {
        if !contains_scheme(decoded) {
            return;
        }
        candidates.extend(
            decoded
                .lines()
                .map(str::trim)
                .filter(|line| self.descriptor_line.is_match(line))
                .map(str::to_string),
        );
    }
}

fn contains_scheme(text: &str) -> bool {
    Protocol::iter().any(|p| text.contains(p.scheme_prefix()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    fn extractor() -> CandidateExtractor {
        CandidateExtractor::new().unwrap()
    }

    #[test]
    fn test_plain_lines() {
        let body = "trojan://p@1.2.3.4:443#a\r\n\nhttp://not-a-descriptor\n  vless://u@5.6.7.8:443  \n";
        assert_eq!(
            extractor().extract(body),
            ["trojan://p@1.2.3.4:443#a", "vless://u@5.6.7.8:443"]
        );
    }

    #[test]
    fn test_base64_line_mixed_with_plain_lines() {
        let block = STANDARD.encode("ss://YWVzLTI1Ni1nY206cGFzcw==@1.2.3.4:8388\nnoise\nvmess://abc");
        let body = format!("trojan://p@1.2.3.4:443\n{block}\n");
        assert_eq!(
            extractor().extract(&body),
            [
                "trojan://p@1.2.3.4:443",
                "ss://YWVzLTI1Ni1nY206cGFzcw==@1.2.3.4:8388",
                "vmess://abc"
            ]
        );
    }

    #[test]
    fn test_wrapped_base64_body() {
        let encoded = STANDARD.encode("trojan://p@1.2.3.4:443\nvless://u@5.6.7.8:443\n");
        // Wrapped at 20 columns like some subscription servers do
        let wrapped: Vec<&str> = encoded
            .as_bytes()
            .chunks(20)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect();
        let body = wrapped.join("\n");
        assert_eq!(
            extractor().extract(&body),
            ["trojan://p@1.2.3.4:443", "vless://u@5.6.7.8:443"]
        );
    }

    #[test]
    fn test_independent_base64_lines() {
        let first = STANDARD.encode("trojan://p@1.2.3.4:443\n");
        let second = STANDARD.encode("vless://u@5.6.7.8:443");
        let body = format!("{first}\n{second}\n");
        assert_eq!(
            extractor().extract(&body),
            ["trojan://p@1.2.3.4:443", "vless://u@5.6.7.8:443"]
        );
    }

    #[test]
    fn test_decoded_text_without_scheme_is_ignored() {
        let body = STANDARD.encode("just some words");
        assert!(extractor().extract(&body).is_empty());
        assert!(extractor().extract("").is_empty());
    }

    #[test]
    fn test_scheme_must_lead_the_line() {
        assert!(extractor().extract("see trojan://p@1.2.3.4:443").is_empty());
    }
}
