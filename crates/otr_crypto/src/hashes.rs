//! SHA-1 / SHA-256 and their HMAC variants, as required by the OTRv2/v3 wire
//! format (§4.3, §4.5). SHA-1 is mandated by the legacy wire format itself,
//! not chosen by this implementation.

use hmac::{Hmac, Mac};
use num_bigint_dig::BigUint;
use sha1::Sha1;
use sha2::{Digest, Sha256};

pub fn sha1(data: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hasher.finalize().into()
}

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

pub fn hmac_sha1(key: &[u8], data: &[u8]) -> [u8; 20] {
    let mut mac = Hmac::<Sha1>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// MPI encoding of a non-negative integer: a 4-byte big-endian length prefix
/// followed by the minimal big-endian magnitude (empty for zero). Used only
/// to compute `secbytes = MPI(s)` for the AKE's key derivation (§4.3); the
/// wire codec (`otr_wire`) defines the authoritative MPI type used on the
/// wire itself.
pub fn mpi_bytes(n: &BigUint) -> Vec<u8> {
    let magnitude = n.to_bytes_be();
    let magnitude = if magnitude == [0u8] { Vec::new() } else { magnitude };
    let mut out = Vec::with_capacity(4 + magnitude.len());
    out.extend_from_slice(&(magnitude.len() as u32).to_be_bytes());
    out.extend_from_slice(&magnitude);
    out
}

/// `h2(b) = SHA-256(b || secbytes)`, the AKE key-derivation primitive (§4.3).
pub fn h2(shared_secret: &BigUint, selector: u8) -> [u8; 32] {
    let secbytes = mpi_bytes(shared_secret);
    let mut input = Vec::with_capacity(1 + secbytes.len());
    input.push(selector);
    input.extend_from_slice(&secbytes);
    sha256(&input)
}
