use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("DATA message MAC verification failed")]
    MacVerification,

    #[error("DATA message counter did not increase (possible replay)")]
    Replay,

    #[error("no session key for keyid pair ({0}, {1})")]
    UnknownKeyId(u32, u32),

    #[error("malformed session payload: {0}")]
    Malformed(String),

    #[error("operation is not valid in the current message state")]
    WrongState,
}

impl From<otr_crypto::CryptoError> for SessionError {
    fn from(e: otr_crypto::CryptoError) -> Self {
        SessionError::Malformed(e.to_string())
    }
}

impl From<otr_wire::WireError> for SessionError {
    fn from(e: otr_wire::WireError) -> Self {
        SessionError::Malformed(e.to_string())
    }
}

impl From<otr_smp::SmpError> for SessionError {
    fn from(e: otr_smp::SmpError) -> Self {
        SessionError::Malformed(e.to_string())
    }
}
