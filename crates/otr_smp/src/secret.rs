//! Turning a host-supplied secret byte string into the group element SMP
//! actually compares (§4.4: "Secret input is hashed with a protocol tag
//! derived from the two fingerprints and the session SSID; SMP never sees
//! the raw passphrase").

use otr_crypto::hashes::sha256;
use otr_crypto::BigUint;
use zeroize::Zeroizing;

use crate::group::order;

const SECRET_HASH_VERSION: u8 = 1;

/// `x = SHA256(version || initiator_fp || responder_fp || ssid || secret) mod q`.
pub fn derive_secret(initiator_fp: &[u8], responder_fp: &[u8], ssid: &[u8; 8], secret: &[u8]) -> BigUint {
    let mut buf = Zeroizing::new(vec![SECRET_HASH_VERSION]);
    buf.extend_from_slice(initiator_fp);
    buf.extend_from_slice(responder_fp);
    buf.extend_from_slice(ssid);
    buf.extend_from_slice(secret);
    let digest = Zeroizing::new(sha256(&buf));
    BigUint::from_bytes_be(digest.as_slice()) % order()
}
