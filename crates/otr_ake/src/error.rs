use thiserror::Error;

#[derive(Debug, Error)]
pub enum AkeError {
    #[error("DSA signature verification failed")]
    SignatureVerification,

    #[error("MAC verification failed")]
    MacVerification,

    #[error("DH-Commit hash mismatch on revealed gx")]
    HashMismatch,

    #[error("DH value out of range: {0}")]
    RangeCheck(String),

    #[error("malformed AKE message: {0}")]
    Malformed(String),

    #[error("message does not apply to the current auth state")]
    UnexpectedMessage,

    #[error("policy rejects protocol version {0}")]
    PolicyRejected(u16),

    #[error("v4 client profile invalid: {0}")]
    ClientProfileInvalid(String),

    #[error("OTRv4 ring-signature verification is not implemented by this crate")]
    DakeRingSignatureUnsupported,
}

impl From<otr_crypto::CryptoError> for AkeError {
    fn from(e: otr_crypto::CryptoError) -> Self {
        AkeError::RangeCheck(e.to_string())
    }
}

impl From<otr_wire::WireError> for AkeError {
    fn from(e: otr_wire::WireError) -> Self {
        AkeError::Malformed(e.to_string())
    }
}
