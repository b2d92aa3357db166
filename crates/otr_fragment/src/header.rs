//! Fragment header formats (§4.2, exact templates §6):
//! v2 `?OTR,k,n,piece,`; v3 `?OTR|sender|receiver,k,n,piece,`;
//! v4 `?OTR|identifier|sender|receiver,k,n,piece,`.

use crate::error::FragmentError;

pub const ENCODED_PREFIX: &str = "?OTR:";
pub const V2_PREFIX: &str = "?OTR,";
pub const V3_PREFIX: &str = "?OTR|";

/// Worst-case header overhead used to size fragments (§4.2's "header sizes").
pub const HEADER_BUDGET_V2: usize = 18;
pub const HEADER_BUDGET_V3: usize = 36;
pub const HEADER_BUDGET_V4: usize = 45;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentHeader {
    pub identifier: Option<u32>,
    pub sender: u32,
    pub receiver: u32,
    pub k: u16,
    pub n: u16,
}

pub fn format_v2(k: u16, n: u16, piece: &str) -> String {
    format!("{V2_PREFIX}{k},{n},{piece},")
}

pub fn format_v3(sender: u32, receiver: u32, k: u16, n: u16, piece: &str) -> String {
    format!("{V3_PREFIX}{sender:08x}|{receiver:08x},{k},{n},{piece},")
}

pub fn format_v4(identifier: u32, sender: u32, receiver: u32, k: u16, n: u16, piece: &str) -> String {
    format!("{V3_PREFIX}{identifier:08x}|{sender:08x}|{receiver:08x},{k},{n},{piece},")
}

/// Parse any of the three fragment header formats, returning the header
/// fields and the trailing piece text.
pub fn parse(line: &str) -> Option<Result<(FragmentHeader, String), FragmentError>> {
    if let Some(rest) = line.strip_prefix(V2_PREFIX) {
        return Some(parse_v2(rest));
    }
    if let Some(rest) = line.strip_prefix(V3_PREFIX) {
        return Some(parse_v3_or_v4(rest));
    }
    None
}

fn parse_v2(rest: &str) -> Result<(FragmentHeader, String), FragmentError> {
    let mut fields = rest.splitn(3, ',');
    let k = fields
        .next()
        .ok_or_else(|| malformed("missing k"))?
        .parse::<u16>()
        .map_err(|_| malformed("non-numeric k"))?;
    let n = fields
        .next()
        .ok_or_else(|| malformed("missing n"))?
        .parse::<u16>()
        .map_err(|_| malformed("non-numeric n"))?;
    let piece_and_tail = fields.next().ok_or_else(|| malformed("missing piece"))?;
    let piece = piece_and_tail
        .strip_suffix(',')
        .ok_or_else(|| malformed("missing trailing comma"))?;
    Ok((
        FragmentHeader { identifier: None, sender: 0, receiver: 0, k, n },
        piece.to_string(),
    ))
}

fn parse_v3_or_v4(rest: &str) -> Result<(FragmentHeader, String), FragmentError> {
    let parts: Vec<&str> = rest.splitn(4, '|').collect();
    let (identifier, sender_hex, tail) = match parts.as_slice() {
        [sender_hex, tail] => (None, *sender_hex, *tail),
        [identifier_hex, sender_hex, tail] => {
            let identifier = u32::from_str_radix(identifier_hex, 16)
                .map_err(|_| malformed("non-hex identifier"))?;
            (Some(identifier), *sender_hex, *tail)
        }
        _ => return Err(malformed("unrecognized fragment header shape")),
    };
    let sender = u32::from_str_radix(sender_hex, 16).map_err(|_| malformed("non-hex sender tag"))?;

    let mut tail_fields = tail.splitn(4, ',');
    let receiver_hex = tail_fields.next().ok_or_else(|| malformed("missing receiver tag"))?;
    let receiver = u32::from_str_radix(receiver_hex, 16).map_err(|_| malformed("non-hex receiver tag"))?;
    let k = tail_fields
        .next()
        .ok_or_else(|| malformed("missing k"))?
        .parse::<u16>()
        .map_err(|_| malformed("non-numeric k"))?;
    let n = tail_fields
        .next()
        .ok_or_else(|| malformed("missing n"))?
        .parse::<u16>()
        .map_err(|_| malformed("non-numeric n"))?;
    let piece_and_tail = tail_fields.next().ok_or_else(|| malformed("missing piece"))?;
    let piece = piece_and_tail
        .strip_suffix(',')
        .ok_or_else(|| malformed("missing trailing comma"))?;

    Ok((
        FragmentHeader { identifier, sender, receiver, k, n },
        piece.to_string(),
    ))
}

fn malformed(reason: &str) -> FragmentError {
    FragmentError::Malformed(reason.to_string())
}
