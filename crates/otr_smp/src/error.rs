use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmpError {
    #[error("SMP group element out of range")]
    RangeCheck,

    #[error("SMP zero-knowledge proof failed to verify")]
    ProofFailed,

    #[error("malformed SMP message: {0}")]
    Malformed(String),

    #[error("SMP message does not apply to the current state")]
    UnexpectedMessage,
}

impl From<otr_crypto::CryptoError> for SmpError {
    fn from(_: otr_crypto::CryptoError) -> Self {
        SmpError::RangeCheck
    }
}

impl From<otr_wire::WireError> for SmpError {
    fn from(e: otr_wire::WireError) -> Self {
        SmpError::Malformed(e.to_string())
    }
}
