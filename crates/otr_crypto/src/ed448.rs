//! Ed448 signing and the DH-3072 group used by OTRv4's DAKE (§3 client
//! profile, §4.3 "OTRv4 DAKE outline"). OTRv4 support in this crate is
//! partial, as spec.md's Open Question on v4 records: only the message
//! shapes and the underlying point/signature primitives are implemented,
//! not the full double ratchet.

use ed448_goldilocks_plus::{Signature as Ed448Signature, SigningKey, VerifyingKey};
use rand_core::CryptoRngCore;
use signature::{Signer, Verifier};

use crate::error::CryptoError;

/// A 57-byte Ed448 public point, as carried on the wire (§4.1 "Ed448-POINT").
pub struct PublicKey(VerifyingKey);

pub struct KeyPair(SigningKey);

impl KeyPair {
    pub fn generate<R: CryptoRngCore>(rng: &mut R) -> Self {
        Self(SigningKey::generate(rng))
    }

    pub fn public(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 114] {
        let sig: Ed448Signature = self.0.sign(message);
        sig.to_bytes()
    }
}

impl PublicKey {
    pub fn from_bytes(bytes: &[u8; 57]) -> Result<Self, CryptoError> {
        VerifyingKey::from_bytes(bytes)
            .map(PublicKey)
            .map_err(|e| CryptoError::Ed448(e.to_string()))
    }

    pub fn to_bytes(&self) -> [u8; 57] {
        self.0.to_bytes()
    }

    pub fn verify(&self, message: &[u8], signature: &[u8; 114]) -> Result<(), CryptoError> {
        let sig = Ed448Signature::try_from(signature.as_slice())
            .map_err(|e| CryptoError::Ed448(e.to_string()))?;
        self.0
            .verify(message, &sig)
            .map_err(|_| CryptoError::SignatureVerification)
    }
}

/// The four 57-byte scalars of an OTRv4 ring signature ("sigma", §6). Full
/// ring-signature construction/verification over three parties is out of
/// scope for the partial v4 support this crate provides; this type models
/// the wire shape so `otr_wire`/`otr_ake` can parse and round-trip it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingSignature {
    pub c1: [u8; 57],
    pub r1: [u8; 57],
    pub c2: [u8; 57],
    pub r2: [u8; 57],
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn ed448_sign_and_verify_roundtrip() {
        let pair = KeyPair::generate(&mut OsRng);
        let sig = pair.sign(b"dake");
        pair.public().verify(b"dake", &sig).unwrap();
        assert!(pair.public().verify(b"not dake", &sig).is_err());
    }

    #[test]
    fn public_key_roundtrips_through_bytes() {
        let pair = KeyPair::generate(&mut OsRng);
        let bytes = pair.public().to_bytes();
        let restored = PublicKey::from_bytes(&bytes).unwrap();
        assert_eq!(restored.to_bytes(), bytes);
    }
}
