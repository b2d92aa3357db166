//! The 1536-bit MODP Diffie-Hellman group used by OTRv2/v3 (RFC 3526 group 5,
//! generator 2) and by the SMP engine's prime-order subgroup.
//!
//! Group elements are public and modelled as plain `BigUint`. Secret
//! exponents are generated into a zeroizing byte buffer and only lifted into
//! a transient `BigUint` for the duration of a modpow (§9 BigInteger hygiene).

use num_bigint_dig::BigUint;
use num_traits::{One, Zero};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::CryptoError;

const P_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD",
    "129024E088A67CC74020BBEA63B139B22514A08798E3404",
    "DDEF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C",
    "245E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406",
    "B7EDEE386BFB5A899FA5AE9F24117C4B1FE649286651ECE",
    "45B3DC2007CB8A163BF0598DA48361C55D39A69163FA8FD",
    "24CF5F83655D23DCA3AD961C62F356208552BB9ED529077",
    "096966D670C354E4ABC9804F1746C08CA237327FFFFFFFF",
    "FFFFFFFF",
);

/// The group modulus `p`.
pub fn p() -> BigUint {
    BigUint::parse_bytes(P_HEX.as_bytes(), 16).expect("static prime literal")
}

/// The subgroup order `q = (p - 1) / 2`.
pub fn q() -> BigUint {
    (p() - BigUint::one()) / BigUint::from(2u8)
}

/// The generator `g1 = 2`.
pub fn generator() -> BigUint {
    BigUint::from(2u8)
}

/// Validate a received DH public value: `2 <= y <= p - 2` (§4.3 DH-key
/// validation, reused by the SMP engine for every received group element).
pub fn validate_group_element(y: &BigUint) -> Result<(), CryptoError> {
    let p = p();
    let lower = BigUint::from(2u8);
    let upper = &p - BigUint::from(2u8);
    if y < &lower || y > &upper {
        return Err(CryptoError::GroupElementOutOfRange(format!(
            "value must satisfy 2 <= y <= p-2, got {} bits",
            y.bits()
        )));
    }
    Ok(())
}

/// Validate a received scalar against the subgroup order: `1 <= x < q`.
pub fn validate_scalar(x: &BigUint) -> Result<(), CryptoError> {
    let q = q();
    if x.is_zero() || x >= &q {
        return Err(CryptoError::ScalarOutOfRange(
            "scalar must satisfy 1 <= x < q".into(),
        ));
    }
    Ok(())
}

/// A DH keypair: a secret exponent (zeroized on drop) and its public value.
#[derive(Clone)]
pub struct KeyPair {
    secret: Zeroizing<Vec<u8>>,
    pub public: BigUint,
}

impl KeyPair {
    /// Generate a fresh keypair with a secret exponent in `[1, q)`, using the
    /// host-independent secure RNG.
    pub fn generate<R: RngCore>(rng: &mut R) -> Self {
        let q = q();
        let secret_int = random_below(rng, &q);
        let public = generator().modpow(&secret_int, &p());
        Self {
            secret: Zeroizing::new(secret_int.to_bytes_be()),
            public,
        }
    }

    fn secret_int(&self) -> BigUint {
        BigUint::from_bytes_be(&self.secret)
    }

    /// Compute the shared secret `s = peer_public ^ secret mod p`, after the
    /// caller has validated `peer_public` with [`validate_group_element`].
    pub fn shared_secret(&self, peer_public: &BigUint) -> BigUint {
        peer_public.modpow(&self.secret_int(), &p())
    }
}

/// Sample a uniform value in `[1, bound)` by rejection sampling.
pub fn random_below<R: RngCore>(rng: &mut R, bound: &BigUint) -> BigUint {
    let byte_len = (bound.bits() as usize + 7) / 8 + 8; // extra bytes to reduce bias
    loop {
        let mut buf = vec![0u8; byte_len];
        rng.fill_bytes(&mut buf);
        let candidate = BigUint::from_bytes_be(&buf) % bound;
        if !candidate.is_zero() {
            return candidate;
        }
    }
}
