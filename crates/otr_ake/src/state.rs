//! The AKE state machine's variants (§3 "Auth state (AKE)").

use otr_crypto::dh::KeyPair as DhKeyPair;
use otr_crypto::BigUint;
use zeroize::Zeroizing;

use crate::keys::AkeKeys;

/// Fields beyond those named in §3's abbreviated listing (`local_dh` in every
/// "awaiting" state, and `r` carried into `AwaitingSig` so a duplicate
/// DH-Key can still be answered with a Reveal-Signature that decrypts to the
/// same `gx`) are implementation-internal necessities for computing the
/// shared secret and replaying prior messages; nothing here drops a field
/// the spec names.
#[derive(Clone)]
pub enum AuthState {
    None,
    AwaitingDhKey {
        r: Zeroizing<[u8; 16]>,
        local_dh: DhKeyPair,
        local_dh_hash: Vec<u8>,
        local_dh_encrypted: Vec<u8>,
        version: u16,
    },
    AwaitingRevealSig {
        local_dh: DhKeyPair,
        remote_dh_hash: Vec<u8>,
        remote_dh_encrypted: Vec<u8>,
        version: u16,
    },
    AwaitingSig {
        r: Zeroizing<[u8; 16]>,
        local_dh: DhKeyPair,
        remote_dh: BigUint,
        shared: BigUint,
        keys: AkeKeys,
        version: u16,
    },
}

impl AuthState {
    pub fn version(&self) -> Option<u16> {
        match self {
            AuthState::None => None,
            AuthState::AwaitingDhKey { version, .. }
            | AuthState::AwaitingRevealSig { version, .. }
            | AuthState::AwaitingSig { version, .. } => Some(*version),
        }
    }
}
