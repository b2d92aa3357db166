//! The `X` structure carried (AES-CTR-encrypted) inside Reveal-Signature and
//! Signature messages (§4.3): the signer's long-term DSA public key, its
//! current key id, and the DSA signature over `m_a`/`m_b`.

use dsa::Signature;
use otr_crypto::dsa_sig::DsaPublicKey;
use otr_crypto::hashes::{hmac_sha256, mpi_bytes};
use otr_crypto::BigUint;
use otr_wire::dsa::{read_dsa_pubkey, write_dsa_pubkey};
use otr_wire::primitives::{Reader, Writer};

use crate::error::AkeError;

pub struct SignaturePayload {
    pub pubkey: DsaPublicKey,
    pub keyid: u32,
    pub signature: Signature,
}

/// `m_a/m_b = SHA256HMAC(m1 or m1', MPI(gx) || MPI(gy) || DSA-PUBKEY(Y) || INT(keyid))`.
pub fn compute_m(mac_key: &[u8; 32], gx: &BigUint, gy: &BigUint, pubkey: &DsaPublicKey, keyid: u32) -> [u8; 32] {
    let mut buf = Vec::new();
    buf.extend_from_slice(&mpi_bytes(gx));
    buf.extend_from_slice(&mpi_bytes(gy));
    let mut w = Writer::new();
    write_dsa_pubkey(&mut w, pubkey);
    w.write_int(keyid);
    buf.extend_from_slice(&w.into_bytes());
    hmac_sha256(mac_key, &buf)
}

pub fn encode(payload: &SignaturePayload) -> Vec<u8> {
    let mut w = Writer::new();
    write_dsa_pubkey(&mut w, &payload.pubkey);
    w.write_int(payload.keyid);
    w.write_mpi(payload.signature.r());
    w.write_mpi(payload.signature.s());
    w.into_bytes()
}

pub fn decode(bytes: &[u8]) -> Result<SignaturePayload, AkeError> {
    let mut r = Reader::new(bytes);
    let pubkey = read_dsa_pubkey(&mut r)?;
    let keyid = r.read_int()?;
    let sig_r = r.read_mpi()?;
    let sig_s = r.read_mpi()?;
    let signature = Signature::from_components(sig_r, sig_s)
        .map_err(|_| AkeError::Malformed("invalid DSA signature components".into()))?;
    Ok(SignaturePayload { pubkey, keyid, signature })
}
