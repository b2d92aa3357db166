//! TLV records embedded in a DATA message's plaintext (§4.5/§6): a 2-byte
//! type, a 2-byte length, and that many bytes of value, repeated until the
//! plaintext is exhausted. `otr_wire::primitives::Reader` has no
//! runtime-length byte read (only a const-generic `read_fixed`), so this is
//! its own small free-function parser over a raw slice, in the same style as
//! `otr_fragment::header`'s manual byte-offset parsing.

use crate::error::SessionError;

pub const TLV_PADDING: u16 = 0x0000;
pub const TLV_DISCONNECT: u16 = 0x0001;
pub use otr_smp::engine::{TLV_SMP1, TLV_SMP2, TLV_SMP3, TLV_SMP4, TLV_SMP_ABORT};
pub const TLV_EXTRA_KEY: u16 = 0x0008;

pub struct Tlv {
    pub tlv_type: u16,
    pub value: Vec<u8>,
}

impl Tlv {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.tlv_type.to_be_bytes());
        out.extend_from_slice(&(self.value.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.value);
    }
}

pub fn encode_all(tlvs: &[Tlv]) -> Vec<u8> {
    let mut out = Vec::new();
    for tlv in tlvs {
        tlv.encode(&mut out);
    }
    out
}

pub fn decode_all(mut bytes: &[u8]) -> Result<Vec<Tlv>, SessionError> {
    let mut out = Vec::new();
    while !bytes.is_empty() {
        if bytes.len() < 4 {
            return Err(SessionError::Malformed("truncated TLV header".into()));
        }
        let tlv_type = u16::from_be_bytes([bytes[0], bytes[1]]);
        let len = u16::from_be_bytes([bytes[2], bytes[3]]) as usize;
        bytes = &bytes[4..];
        if bytes.len() < len {
            return Err(SessionError::Malformed("truncated TLV value".into()));
        }
        let value = bytes[..len].to_vec();
        bytes = &bytes[len..];
        out.push(Tlv { tlv_type, value });
    }
    Ok(out)
}

/// Plaintext ends with a NUL separating the human-readable body from any
/// TLVs (§6): split there, defaulting to "no TLVs" when absent.
pub fn split_body_and_tlvs(plaintext: &[u8]) -> (&[u8], &[u8]) {
    match plaintext.iter().position(|&b| b == 0) {
        Some(idx) => (&plaintext[..idx], &plaintext[idx + 1..]),
        None => (plaintext, &[]),
    }
}
