//! Encryption/hashing helpers for the DH-Commit `encrypted_gx`/`hash_gx`
//! pair (§4.3, wire layout §6).

use otr_crypto::cipher::{apply_keystream, zero_counter};
use otr_crypto::hashes::{mpi_bytes, sha256};
use otr_crypto::BigUint;

use crate::error::AkeError;

pub fn hash_gx(gx: &BigUint) -> Vec<u8> {
    sha256(&mpi_bytes(gx)).to_vec()
}

pub fn encrypt_gx(r: &[u8; 16], gx: &BigUint) -> Vec<u8> {
    let mut plaintext = mpi_bytes(gx);
    apply_keystream(r, &zero_counter(), &mut plaintext).expect("fixed-size AES-128 key");
    plaintext
}

pub fn decrypt_gx(r: &[u8; 16], encrypted: &[u8]) -> Result<BigUint, AkeError> {
    let mut buf = encrypted.to_vec();
    apply_keystream(r, &zero_counter(), &mut buf).expect("fixed-size AES-128 key");
    if buf.len() < 4 {
        return Err(AkeError::Malformed("revealed gx too short to contain an MPI length".into()));
    }
    let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if buf.len() != 4 + len {
        return Err(AkeError::Malformed("revealed gx MPI length mismatch".into()));
    }
    Ok(BigUint::from_bytes_be(&buf[4..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrips() {
        let r = [9u8; 16];
        let gx = BigUint::from(123456789u64);
        let enc = encrypt_gx(&r, &gx);
        assert_eq!(decrypt_gx(&r, &enc).unwrap(), gx);
    }

    #[test]
    fn hash_matches_encrypted_payload_plaintext() {
        let gx = BigUint::from(42u32);
        let h = hash_gx(&gx);
        assert_eq!(h.len(), 32);
    }
}
