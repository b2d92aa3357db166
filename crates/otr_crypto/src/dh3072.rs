//! The 3072-bit MODP group (RFC 3526 group 15) mixed alongside the Ed448
//! ECDH into OTRv4's DAKE shared-secret derivation (§4.3, §3 "two parallel
//! shared secrets mixed into subsequent key derivation").

use num_bigint_dig::BigUint;
use num_traits::One;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::dh::random_below;
use crate::error::CryptoError;

const P_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD",
    "129024E088A67CC74020BBEA63B139B22514A08798E3404",
    "DDEF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C",
    "245E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406",
    "B7EDEE386BFB5A899FA5AE9F24117C4B1FE649286651ECE",
    "45B3DC2007CB8A163BF0598DA48361C55D39A69163FA8FD",
    "24CF5F83655D23DCA3AD961C62F356208552BB9ED529077",
    "0962D3195114008E74D5D1AA40E1763FD5D0A93DB2654FA",
    "ADB63E26F108E652306F405B9CDCF4A0FFFFFFFFFFFFFFFF",
);

pub fn p() -> BigUint {
    BigUint::parse_bytes(P_HEX.as_bytes(), 16).expect("static prime literal")
}

pub fn q() -> BigUint {
    (p() - BigUint::one()) / BigUint::from(2u8)
}

pub fn generator() -> BigUint {
    BigUint::from(2u8)
}

pub fn validate_group_element(y: &BigUint) -> Result<(), CryptoError> {
    let p = p();
    let lower = BigUint::from(2u8);
    let upper = &p - BigUint::from(2u8);
    if y < &lower || y > &upper {
        return Err(CryptoError::GroupElementOutOfRange(
            "DH-3072 value out of [2, p-2]".into(),
        ));
    }
    Ok(())
}

pub struct KeyPair {
    secret: Zeroizing<Vec<u8>>,
    pub public: BigUint,
}

impl KeyPair {
    pub fn generate<R: RngCore>(rng: &mut R) -> Self {
        let secret_int = random_below(rng, &q());
        let public = generator().modpow(&secret_int, &p());
        Self {
            secret: Zeroizing::new(secret_int.to_bytes_be()),
            public,
        }
    }

    pub fn shared_secret(&self, peer_public: &BigUint) -> BigUint {
        peer_public.modpow(&BigUint::from_bytes_be(&self.secret), &p())
    }
}
