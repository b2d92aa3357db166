//! The per-conversation message state (§3): `Plaintext` until an AKE
//! completes, `Encrypted` while DATA messages flow, `Finished` once either
//! side disconnects — mirroring `otr_ake::state::AuthState`'s
//! enum-with-payload shape one layer up the stack.

use otr_smp::SmpEngine;

use crate::keys::SessionKeys;

pub struct EncryptedState {
    pub keys: SessionKeys,
    pub smp: SmpEngine,
    pub ssid: [u8; 8],
    pub peer_fingerprint: Vec<u8>,
    pub local_fingerprint: Vec<u8>,
}

pub enum MessageState {
    Plaintext,
    Encrypted(EncryptedState),
    Finished,
}

impl Default for MessageState {
    fn default() -> Self {
        MessageState::Plaintext
    }
}

impl MessageState {
    pub fn is_encrypted(&self) -> bool {
        matches!(self, MessageState::Encrypted(_))
    }
}
