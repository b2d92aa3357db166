//! Partial OTRv4 DAKE support (§3 "v4 Open Question", §4.3 "OTRv4 DAKE
//! outline"): this crate builds and parses the Identity / Auth-R / Auth-I
//! message shapes and generates the ephemeral ECDH + DH-3072 material they
//! carry, but does not implement three-party ring-signature construction or
//! verification, and does not run the double ratchet that would follow a
//! completed DAKE. Callers that need a complete OTRv4 session must supply
//! their own ring-signature scheme.

use otr_crypto::dh3072::KeyPair as Dh3072KeyPair;
use otr_crypto::ed448::{KeyPair as Ed448KeyPair, RingSignature};
use otr_wire::message::{AuthI, AuthR, IdentityMessage, InstanceTags};
use rand_core::CryptoRngCore;

use crate::error::AkeError;

/// The ephemeral key material generated for one DAKE attempt.
pub struct DakeKeys {
    pub ecdh: Ed448KeyPair,
    pub dh: Dh3072KeyPair,
}

impl DakeKeys {
    pub fn generate<R: CryptoRngCore>(rng: &mut R) -> Self {
        Self { ecdh: Ed448KeyPair::generate(rng), dh: Dh3072KeyPair::generate(rng) }
    }
}

pub fn build_identity_message(tags: InstanceTags, keys: &DakeKeys) -> IdentityMessage {
    IdentityMessage { tags, y: keys.ecdh.public().to_bytes(), b: keys.dh.public.clone() }
}

pub fn build_auth_r(tags: InstanceTags, keys: &DakeKeys, sigma: RingSignature) -> AuthR {
    AuthR { tags, x: keys.ecdh.public().to_bytes(), a: keys.dh.public.clone(), sigma }
}

pub fn build_auth_i(tags: InstanceTags, sigma: RingSignature) -> AuthI {
    AuthI { tags, sigma }
}

/// Always fails: this crate has no ring-signature verifier (see module doc).
/// Kept as an explicit interface point rather than silently accepting every
/// Auth-R/Auth-I, which would defeat the DAKE's authentication entirely.
pub fn verify_ring_signature(_sigma: &RingSignature, _transcript: &[u8]) -> Result<(), AkeError> {
    Err(AkeError::DakeRingSignatureUnsupported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn identity_message_carries_fresh_ephemeral_material() {
        let keys = DakeKeys::generate(&mut OsRng);
        let msg = build_identity_message(InstanceTags { sender: 1, receiver: 2 }, &keys);
        assert_eq!(msg.y, keys.ecdh.public().to_bytes());
        assert_eq!(msg.b, keys.dh.public);
    }

    #[test]
    fn ring_signature_verification_is_explicitly_unsupported() {
        let sigma = RingSignature { c1: [0; 57], r1: [0; 57], c2: [0; 57], r2: [0; 57] };
        assert!(verify_ring_signature(&sigma, b"transcript").is_err());
    }
}
