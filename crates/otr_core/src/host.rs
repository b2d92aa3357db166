//! The host contract (§4.7): everything the core requires of its embedder.
//! `Host` is a plain trait rather than a generic-method interface so a
//! dispatcher can hold it as `&mut dyn Host` (SPEC_FULL §6).

use otr_crypto::dsa_sig::DsaKeyPair;

use crate::error::HostError;
use crate::policy::Policy;

/// §3 "Session identity": (local account, remote account, transport name).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId {
    pub local_account: String,
    pub remote_account: String,
    pub protocol: String,
}

pub trait Host {
    /// The only I/O the core performs: hand an encoded or plaintext line to
    /// the transport.
    fn inject_message(&mut self, session: &SessionId, text: &str) -> Result<(), HostError>;

    /// The long-term DSA key pair; the core never persists keys.
    fn get_local_key_pair(&mut self, session: &SessionId) -> Result<DsaKeyPair, HostError>;

    fn get_session_policy(&mut self, session: &SessionId) -> Result<Policy, HostError>;

    fn max_fragment_size(&mut self, session: &SessionId) -> usize;

    fn unreadable_message_received(&mut self, _session: &SessionId) {}
    fn unencrypted_message_received(&mut self, _session: &SessionId, _text: &str) {}
    fn show_error(&mut self, _session: &SessionId, _text: &str) {}
    fn message_from_another_instance(&mut self, _session: &SessionId) {}
    fn multiple_instances_detected(&mut self, _session: &SessionId) {}
    fn session_status_changed(&mut self, _session: &SessionId, _instance: u32) {}
    fn smp_error(&mut self, _session: &SessionId, _smp_type: u16, _cheated: bool) {}
    fn smp_aborted(&mut self, _session: &SessionId) {}
    fn ask_for_secret(&mut self, _session: &SessionId, _instance: u32, _question: Option<String>) {}
    fn verify(&mut self, _session: &SessionId, _fingerprint: &[u8]) {}
    fn unverify(&mut self, _session: &SessionId, _fingerprint: &[u8]) {}
    fn finished_session_message(&mut self, _session: &SessionId, _text: &str) {}
    fn require_encrypted_message(&mut self, _session: &SessionId, _text: &str) {}

    fn get_fallback_message(&mut self, _session: &SessionId) -> String {
        "This message cannot be read because it was encrypted with Off-the-Record Messaging.".to_string()
    }

    fn get_reply_for_unreadable_message(&mut self, _session: &SessionId) -> String {
        "You sent an encrypted message that could not be read.".to_string()
    }
}
