//! `fragment(version, encoded)` (§4.2): split an outbound encoded message
//! into a sequence of fragment-framed strings no longer than
//! `max_fragment_size`.

use rand::RngCore;

use crate::error::FragmentError;
use crate::header::{format_v2, format_v3, format_v4, ENCODED_PREFIX, HEADER_BUDGET_V2, HEADER_BUDGET_V3, HEADER_BUDGET_V4, V2_PREFIX, V3_PREFIX};

const MAX_FRAGMENT_COUNT: usize = 65535;

/// Split `encoded` — the full `?OTR:....` envelope of an encoded message —
/// into fragments honoring `max_fragment_size`. `sender`/`receiver` are the
/// instance tags to stamp on v3+ fragments; ignored for v2.
pub fn fragment<R: RngCore>(
    version: u16,
    encoded: &str,
    sender: u32,
    receiver: u32,
    max_fragment_size: usize,
    rng: &mut R,
) -> Result<Vec<String>, FragmentError> {
    reject_not_fragmentable(encoded)?;

    let header_budget = match version {
        2 => HEADER_BUDGET_V2,
        3 => HEADER_BUDGET_V3,
        _ => HEADER_BUDGET_V4,
    };
    if max_fragment_size <= header_budget {
        return Err(FragmentError::TooSmall { header: header_budget, max: max_fragment_size });
    }
    let payload_size = max_fragment_size - header_budget;

    let total_len = encoded.len();
    let fragment_count = total_len.div_ceil(payload_size).max(1);
    if fragment_count == 0 || fragment_count > MAX_FRAGMENT_COUNT {
        return Err(FragmentError::TooManyFragments(fragment_count));
    }
    let n = fragment_count as u16;

    let identifier = if version >= 4 { Some(rng.next_u32()) } else { None };

    let mut fragments = Vec::with_capacity(fragment_count);
    for (index, chunk) in encoded.as_bytes().chunks(payload_size).enumerate() {
        let k = (index + 1) as u16;
        let piece = std::str::from_utf8(chunk).expect("slicing ASCII base64 text");
        let line = match version {
            2 => format_v2(k, n, piece),
            3 => format_v3(sender, receiver, k, n, piece),
            _ => format_v4(identifier.expect("v4 identifier set above"), sender, receiver, k, n, piece),
        };
        fragments.push(line);
    }
    Ok(fragments)
}

fn reject_not_fragmentable(encoded: &str) -> Result<(), FragmentError> {
    if encoded.starts_with(V2_PREFIX) || encoded.starts_with(V3_PREFIX) {
        return Err(FragmentError::NotFragmentable);
    }
    if !encoded.starts_with(ENCODED_PREFIX) {
        return Err(FragmentError::NotFragmentable);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::Assembler;
    use rand::rngs::OsRng;

    fn encoded_message_of_len(payload_len: usize) -> String {
        format!("?OTR:{}.", "A".repeat(payload_len))
    }

    #[test]
    fn rejects_plaintext_input() {
        let err = fragment(3, "just some text", 1, 2, 100, &mut OsRng).unwrap_err();
        assert_eq!(err, FragmentError::NotFragmentable);
    }

    #[test]
    fn rejects_already_fragmented_input() {
        let err = fragment(3, "?OTR|1|2,1,3,abc,", 1, 2, 100, &mut OsRng).unwrap_err();
        assert_eq!(err, FragmentError::NotFragmentable);
    }

    #[test]
    fn too_small_budget_is_rejected() {
        let encoded = encoded_message_of_len(500);
        let err = fragment(3, &encoded, 1, 2, HEADER_BUDGET_V3, &mut OsRng).unwrap_err();
        assert_eq!(err, FragmentError::TooSmall { header: HEADER_BUDGET_V3, max: HEADER_BUDGET_V3 });
    }

    #[test]
    fn v3_464_byte_message_splits_into_three_at_208_limit() {
        let encoded = encoded_message_of_len(464 - "?OTR:.".len());
        assert_eq!(encoded.len(), 464);
        let fragments = fragment(3, &encoded, 0x5a73a599, 0x27e31597, 208, &mut OsRng).unwrap();
        assert_eq!(fragments.len(), 3);
        for f in &fragments {
            assert!(f.len() <= 208);
        }

        let mut assembler = Assembler::new(0x27e31597);
        let mut result = None;
        for f in &fragments {
            if let crate::assembler::Accumulated::Complete(msg) = assembler.accumulate(f).unwrap() {
                result = Some(msg);
            }
        }
        assert_eq!(result.unwrap(), encoded);
    }

    #[test]
    fn single_fragment_when_payload_fits() {
        let encoded = encoded_message_of_len(10);
        let fragments = fragment(3, &encoded, 1, 2, 1000, &mut OsRng).unwrap();
        assert_eq!(fragments.len(), 1);
    }
}
