use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("group element out of range: {0}")]
    GroupElementOutOfRange(String),

    #[error("scalar out of range: {0}")]
    ScalarOutOfRange(String),

    #[error("signature generation failed: {0}")]
    SignatureGeneration(String),

    #[error("signature verification failed")]
    SignatureVerification,

    #[error("AES-CTR encryption/decryption failed: {0}")]
    Cipher(String),

    #[error("MAC verification failed")]
    MacVerification,

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("Ed448 operation failed: {0}")]
    Ed448(String),
}
