//! Text framings detected on a single line (§4.1, exact byte layouts §6):
//! the query tag, the whitespace tag, an error message, and the base64
//! envelope around an encoded message.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::WireError;

const QUERY_PREFIX: &str = "?OTRv";
const LEGACY_QUERY: &str = "?OTR?";
const ERROR_PREFIX: &str = "?OTR Error:";
const ENCODED_PREFIX: &str = "?OTR:";
const ENCODED_SUFFIX: char = '.';

const WHITESPACE_BASE_TAG: &str = "\x20\x09\x20\x20\x09\x09\x09\x09\x20\x09\x20\x09\x20\x09\x20\x20";
const WHITESPACE_TAG_V2: &str = "  \t\t  \t ";
const WHITESPACE_TAG_V3: &str = "  \t\t  \t\t";
const WHITESPACE_TAG_V4: &str = "  \t\t \t  ";

/// Parse a `?OTRv<digits>?` query tag, returning the sorted set of versions
/// it names. A lone `?OTR?` (v1-only) is recognized but yields no versions,
/// since v1 is unsupported.
pub fn parse_query(line: &str) -> Option<Vec<u16>> {
    if line.starts_with(LEGACY_QUERY) && !line.starts_with(QUERY_PREFIX) {
        return Some(Vec::new());
    }
    let rest = line.strip_prefix(QUERY_PREFIX)?;
    let end = rest.find('?')?;
    let digits = &rest[..end];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut versions: Vec<u16> = digits
        .chars()
        .filter_map(|c| c.to_digit(10).map(|d| d as u16))
        .filter(|&v| v >= 2)
        .collect();
    versions.sort_unstable();
    versions.dedup();
    Some(versions)
}

pub fn format_query(versions: &[u16]) -> String {
    let mut digits: Vec<u16> = versions.to_vec();
    digits.sort_unstable();
    let digits: String = digits.iter().map(|v| v.to_string()).collect();
    format!("{QUERY_PREFIX}{digits}?")
}

/// Strip a whitespace tag appended to `text`, returning the remaining
/// plaintext and the versions advertised by the per-version sub-tags found.
pub fn parse_whitespace_tag(text: &str) -> Option<(String, Vec<u16>)> {
    let idx = text.find(WHITESPACE_BASE_TAG)?;
    let (plaintext, tag_region) = text.split_at(idx);
    let mut rest = &tag_region[WHITESPACE_BASE_TAG.len()..];
    let mut versions = Vec::new();
    loop {
        if let Some(r) = rest.strip_prefix(WHITESPACE_TAG_V2) {
            versions.push(2);
            rest = r;
        } else if let Some(r) = rest.strip_prefix(WHITESPACE_TAG_V3) {
            versions.push(3);
            rest = r;
        } else if let Some(r) = rest.strip_prefix(WHITESPACE_TAG_V4) {
            versions.push(4);
            rest = r;
        } else {
            break;
        }
    }
    versions.sort_unstable();
    versions.dedup();
    Some((plaintext.to_string(), versions))
}

pub fn append_whitespace_tag(text: &str, versions: &[u16]) -> String {
    let mut out = String::from(text);
    out.push_str(WHITESPACE_BASE_TAG);
    for version in versions {
        out.push_str(match version {
            2 => WHITESPACE_TAG_V2,
            3 => WHITESPACE_TAG_V3,
            4 => WHITESPACE_TAG_V4,
            _ => continue,
        });
    }
    out
}

pub fn parse_error(line: &str) -> Option<&str> {
    line.strip_prefix(ERROR_PREFIX)
}

pub fn format_error(text: &str) -> String {
    format!("{ERROR_PREFIX}{text}")
}

/// Detect and base64-decode a `?OTR:....` envelope, returning the raw bytes
/// of `SHORT version | <message body>`.
pub fn parse_encoded(line: &str) -> Result<Option<Vec<u8>>, WireError> {
    let Some(rest) = line.strip_prefix(ENCODED_PREFIX) else {
        return Ok(None);
    };
    let Some(b64) = rest.strip_suffix(ENCODED_SUFFIX) else {
        return Err(WireError::Malformed(
            "encoded message missing trailing '.'".into(),
        ));
    };
    STANDARD
        .decode(b64)
        .map(Some)
        .map_err(|e| WireError::Malformed(format!("invalid base64 in encoded message: {e}")))
}

pub fn format_encoded(bytes: &[u8]) -> String {
    format!("{ENCODED_PREFIX}{}{ENCODED_SUFFIX}", STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_tag_lists_versions() {
        assert_eq!(parse_query("?OTRv23?"), Some(vec![2, 3]));
        assert_eq!(parse_query("?OTRv234?"), Some(vec![2, 3, 4]));
    }

    #[test]
    fn lone_otr_query_is_v1_only_and_unsupported() {
        assert_eq!(parse_query("?OTR?"), Some(Vec::new()));
    }

    #[test]
    fn query_format_roundtrips() {
        let text = format_query(&[3, 2]);
        assert_eq!(text, "?OTRv23?");
        assert_eq!(parse_query(&text), Some(vec![2, 3]));
    }

    #[test]
    fn whitespace_tag_roundtrips() {
        let tagged = append_whitespace_tag("hello", &[2, 3]);
        let (text, versions) = parse_whitespace_tag(&tagged).unwrap();
        assert_eq!(text, "hello");
        assert_eq!(versions, vec![2, 3]);
    }

    #[test]
    fn error_message_roundtrips() {
        let text = format_error("oops");
        assert_eq!(parse_error(&text), Some("oops"));
    }

    #[test]
    fn encoded_envelope_roundtrips() {
        let payload = vec![0, 3, 0x02, 1, 2, 3];
        let line = format_encoded(&payload);
        assert_eq!(parse_encoded(&line).unwrap(), Some(payload));
    }

    #[test]
    fn encoded_envelope_requires_trailing_dot() {
        assert!(parse_encoded("?OTR:AAA").is_err());
    }

    #[test]
    fn non_otr_line_is_not_encoded() {
        assert_eq!(parse_encoded("hello world").unwrap(), None);
    }
}
