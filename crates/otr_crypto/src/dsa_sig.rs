//! DSA-SHA1 signatures, as mandated by OTRv2/v3's long-term identity key
//! (§3 "DSA-PUBKEY", §4.3 AKE signature messages). The long-term keypair
//! itself is owned by the host (§4.7 `get_local_key_pair`) — this module
//! only wraps sign/verify over the four DSA components the host supplies.

use dsa::{Components, SigningKey, VerifyingKey};
use num_bigint_dig::BigUint;
use signature::{DigestSigner, DigestVerifier};

use crate::error::CryptoError;

/// The four public DSA components carried on the wire (§4.1 DSA-PUBKEY).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DsaPublicKey {
    pub p: BigUint,
    pub q: BigUint,
    pub g: BigUint,
    pub y: BigUint,
}

impl DsaPublicKey {
    fn to_verifying_key(&self) -> Result<VerifyingKey, CryptoError> {
        let components = Components::from_components(self.p.clone(), self.q.clone(), self.g.clone())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        VerifyingKey::from_components(components, self.y.clone())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// Verify a raw DSA-SHA1 signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &dsa::Signature) -> Result<(), CryptoError> {
        let key = self.to_verifying_key()?;
        key.verify_digest(sha1_digest(message), signature)
            .map_err(|_| CryptoError::SignatureVerification)
    }
}

/// A full DSA keypair, as supplied by the host's long-term identity.
pub struct DsaKeyPair {
    signing_key: SigningKey,
}

impl DsaKeyPair {
    pub fn from_components(public: &DsaPublicKey, x: BigUint) -> Result<Self, CryptoError> {
        let verifying_key = public.to_verifying_key()?;
        let signing_key = SigningKey::from_components(verifying_key, x)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self { signing_key })
    }

    pub fn public(&self) -> DsaPublicKey {
        let vk = self.signing_key.verifying_key();
        let c = vk.components();
        DsaPublicKey {
            p: c.p().clone(),
            q: c.q().clone(),
            g: c.g().clone(),
            y: vk.y().clone(),
        }
    }

    /// Sign `message` (the serialized `m_a`/`m_b` payload, §4.3) with DSA-SHA1.
    pub fn sign(&self, message: &[u8]) -> Result<dsa::Signature, CryptoError> {
        self.signing_key
            .try_sign_digest(sha1_digest(message))
            .map_err(|e| CryptoError::SignatureGeneration(e.to_string()))
    }
}

fn sha1_digest(message: &[u8]) -> sha1::Sha1 {
    use sha1::Digest;
    let mut hasher = sha1::Sha1::new();
    hasher.update(message);
    hasher
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsa::KeySize;
    use rand::rngs::OsRng;

    #[test]
    fn sign_and_verify_roundtrip() {
        let components = Components::generate(&mut OsRng, KeySize::DSA_1024_160);
        let signing_key = SigningKey::generate(&mut OsRng, components);
        let verifying_key = signing_key.verifying_key();
        let public = DsaPublicKey {
            p: verifying_key.components().p().clone(),
            q: verifying_key.components().q().clone(),
            g: verifying_key.components().g().clone(),
            y: verifying_key.y().clone(),
        };
        let pair = DsaKeyPair::from_components(&public, signing_key.x().clone()).unwrap();
        let sig = pair.sign(b"hello otr").unwrap();
        public.verify(b"hello otr", &sig).unwrap();
        assert!(public.verify(b"tampered", &sig).is_err());
    }
}
