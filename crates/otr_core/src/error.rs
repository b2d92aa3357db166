//! The taxonomy from §7: protocol/crypto failures during message handling
//! are logged and dropped inside the dispatcher (never reach here); only
//! policy, state, and host-callback failures from user-initiated operations
//! surface as `OtrError` to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OtrError {
    #[error("policy does not permit this operation: {0}")]
    Policy(String),

    #[error("operation is not valid in the current session state")]
    State(#[from] otr_session::SessionError),

    #[error("host callback failed: {0}")]
    Host(#[from] HostError),

    #[error(transparent)]
    Wire(#[from] otr_wire::WireError),

    #[error(transparent)]
    Fragment(#[from] otr_fragment::FragmentError),

    #[error(transparent)]
    Ake(#[from] otr_ake::AkeError),

    #[error(transparent)]
    Smp(#[from] otr_smp::SmpError),

    #[error(transparent)]
    Crypto(#[from] otr_crypto::CryptoError),
}

/// Any exception from a host callback, isolated so one host bug cannot
/// corrupt another sub-session's handling (§7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HostError(pub String);
