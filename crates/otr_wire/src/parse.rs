//! The single parse entry point named in §4.1. Fragment detection is
//! `otr_fragment`'s job and happens before a line ever reaches here — by
//! the time `parse` sees a line, it is either a complete text framing or a
//! complete encoded message.

use crate::error::WireError;
use crate::message::{decode_encoded, Message};
use crate::primitives::Reader;
use crate::text::{parse_encoded, parse_error, parse_query, parse_whitespace_tag};

pub fn parse(line: &str) -> Result<Message, WireError> {
    if let Some(versions) = parse_query(line) {
        return Ok(Message::Query { versions });
    }
    if let Some(text) = parse_error(line) {
        return Ok(Message::Error { text: text.to_string() });
    }
    if let Some(bytes) = parse_encoded(line)? {
        let mut r = Reader::new(&bytes);
        let version = r.read_short()?;
        return decode_encoded(version, r.remaining());
    }
    if let Some((text, versions)) = parse_whitespace_tag(line) {
        return Ok(Message::Plaintext { text, versions });
    }
    Ok(Message::Plaintext {
        text: line.to_string(),
        versions: Vec::new(),
    })
}
