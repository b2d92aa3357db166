//! AES-128 in CTR mode, as used both by the AKE (to wrap the DSA signature,
//! §4.3) and by the message encryption layer (§4.5). OTR does not use an
//! AEAD construction here: authentication is a separate HMAC over the
//! encoded message, applied by the caller.

use aes::cipher::{KeyIvInit, StreamCipher};
use aes::Aes128;
use ctr::Ctr128BE;

use crate::error::CryptoError;

type Aes128Ctr = Ctr128BE<Aes128>;

/// Encrypt or decrypt (XOR-stream ciphers are self-inverse) `data` in place
/// under `key` with the given 16-byte counter/IV value.
pub fn apply_keystream(key: &[u8; 16], counter: &[u8; 16], data: &mut [u8]) -> Result<(), CryptoError> {
    let mut cipher = Aes128Ctr::new(key.into(), counter.into());
    cipher.apply_keystream(data);
    Ok(())
}

/// Build the 16-byte IV used by the AKE's signature encryption: an 8-byte
/// zero counter (§4.3 says "zero counter").
pub fn zero_counter() -> [u8; 16] {
    [0u8; 16]
}

/// Build the 16-byte IV used for DATA message encryption: the 8-byte
/// big-endian send counter, zero-padded (§4.5 "counter||0").
pub fn counter_iv(counter: u64) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[..8].copy_from_slice(&counter.to_be_bytes());
    iv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_then_decrypt_roundtrips() {
        let key = [7u8; 16];
        let iv = counter_iv(42);
        let mut data = b"off the record".to_vec();
        let original = data.clone();
        apply_keystream(&key, &iv, &mut data).unwrap();
        assert_ne!(data, original);
        apply_keystream(&key, &iv, &mut data).unwrap();
        assert_eq!(data, original);
    }

    #[test]
    fn counter_iv_is_big_endian_in_top_half() {
        let iv = counter_iv(1);
        assert_eq!(&iv[..8], &[0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(&iv[8..], &[0u8; 8]);
    }
}
