//! One peer's per-conversation sub-session (§3, §4.5): the state machine
//! driving DATA message encode/decode once an AKE has completed, TLV
//! dispatch (including routing SMP records into the embedded `SmpEngine`),
//! and the disconnect handshake. Structurally grounded on `otr_ake::engine`'s
//! "one state enum, one engine struct wrapping it, fallible `on_*` methods"
//! shape, one layer up the stack.

use otr_ake::Established;
use otr_crypto::cipher::{apply_keystream, counter_iv};
use otr_crypto::hashes::hmac_sha1;
use otr_smp::{SmpEngine, SmpOutput, SmpResult};
use otr_wire::message::{DataMessage, InstanceTags, Message};
use otr_wire::primitives::Writer;
use rand::{CryptoRng, RngCore};
use tracing::{info, warn};

use crate::error::SessionError;
use crate::keys::{extra_symmetric_key, SessionKeys};
use crate::message_state::{EncryptedState, MessageState};
use crate::tlv::{self, Tlv, TLV_DISCONNECT, TLV_EXTRA_KEY, TLV_SMP1, TLV_SMP2, TLV_SMP3, TLV_SMP4, TLV_SMP_ABORT};

/// Events the host needs to react to, surfaced alongside any decoded
/// plaintext from [`Session::receive`].
pub enum SessionEvent {
    SmpProgress,
    SmpFinished(SmpResult),
    ExtraKeyReceived([u8; 32], Vec<u8>),
    PeerDisconnected,
}

pub struct Session {
    state: MessageState,
    version: u16,
    tags: InstanceTags,
}

impl Session {
    pub fn new(version: u16, tags: InstanceTags) -> Self {
        Self { state: MessageState::Plaintext, version, tags }
    }

    pub fn is_encrypted(&self) -> bool {
        self.state.is_encrypted()
    }

    /// Move from `Plaintext`/`Finished` into `Encrypted` once the AKE hands
    /// off an agreed session (§4.3/§4.5 boundary).
    pub fn establish<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        established: Established,
        local_fingerprint: Vec<u8>,
        peer_fingerprint: Vec<u8>,
    ) {
        let ssid = established.ssid;
        let keys = SessionKeys::new(rng, &established);
        self.state = MessageState::Encrypted(EncryptedState {
            keys,
            smp: SmpEngine::default(),
            ssid,
            local_fingerprint,
            peer_fingerprint,
        });
        info!(version = self.version, "message state is now ENCRYPTED");
    }

    fn encrypted_mut(&mut self) -> Result<&mut EncryptedState, SessionError> {
        match &mut self.state {
            MessageState::Encrypted(s) => Ok(s),
            _ => Err(SessionError::WrongState),
        }
    }

    /// Encrypt and authenticate a plaintext message plus any queued TLVs
    /// into a DATA message ready for fragmentation (§4.5, §6).
    pub fn send(&mut self, plaintext: &[u8], extra_tlvs: Vec<Tlv>) -> Result<Message, SessionError> {
        let enc = self.encrypted_mut()?;
        let (sender_keyid, recipient_keyid, keyset, next_dh, counter) = enc.keys.prepare_outbound();

        let mut body = plaintext.to_vec();
        if !extra_tlvs.is_empty() {
            body.push(0);
            body.extend_from_slice(&tlv::encode_all(&extra_tlvs));
        }
        apply_keystream(&keyset.send_aes, &counter_iv(counter), &mut body)?;

        let old_mac_keys = enc.keys.take_mac_keys_to_reveal();
        let ctr = counter.to_be_bytes();
        let mut partial = DataMessage {
            version: self.version,
            tags: self.tags,
            flags: 0,
            sender_keyid,
            recipient_keyid,
            next_dh,
            ctr,
            enc_msg: body,
            mac: [0u8; 20],
            old_mac_keys,
        };
        partial.mac = hmac_sha1(&keyset.send_mac, &mac_input(&partial));
        Ok(Message::Data(partial))
    }

    /// A convenience wrapper for disconnecting: a DATA message whose only
    /// content is a disconnect TLV (§4.5 "TLV type 1").
    pub fn send_disconnect(&mut self) -> Result<Message, SessionError> {
        let msg = self.send(b"", vec![Tlv { tlv_type: TLV_DISCONNECT, value: Vec::new() }])?;
        self.state = MessageState::Finished;
        Ok(msg)
    }

    pub fn request_extra_key(&mut self, context: Vec<u8>) -> Result<Message, SessionError> {
        self.send(b"", vec![Tlv { tlv_type: TLV_EXTRA_KEY, value: context }])
    }

    pub fn start_smp<R: RngCore + CryptoRng>(&mut self, secret: &[u8], rng: &mut R) -> Result<Message, SessionError> {
        let enc = self.encrypted_mut()?;
        let x = otr_smp::secret::derive_secret(&enc.local_fingerprint, &enc.peer_fingerprint, &enc.ssid, secret);
        let output = enc.smp.start(&x, rng)?;
        self.emit_smp_output(output)
    }

    pub fn answer_smp<R: RngCore + CryptoRng>(&mut self, secret: &[u8], rng: &mut R) -> Result<Message, SessionError> {
        let enc = self.encrypted_mut()?;
        let x = otr_smp::secret::derive_secret(&enc.peer_fingerprint, &enc.local_fingerprint, &enc.ssid, secret);
        let output = enc.smp.answer(&x, rng)?;
        self.emit_smp_output(output)
    }

    pub fn abort_smp(&mut self) -> Result<Message, SessionError> {
        let enc = self.encrypted_mut()?;
        enc.smp.abort();
        self.send(b"", vec![Tlv { tlv_type: TLV_SMP_ABORT, value: Vec::new() }])
    }

    fn emit_smp_output(&mut self, output: SmpOutput) -> Result<Message, SessionError> {
        match output {
            SmpOutput::SendTlv { tlv_type, payload } => self.send(b"", vec![Tlv { tlv_type, value: payload }]),
            SmpOutput::AwaitSecret | SmpOutput::Finished(_) | SmpOutput::Nothing => {
                Err(SessionError::WrongState)
            }
        }
    }

    /// Verify, decrypt and dispatch an inbound DATA message, returning any
    /// human-readable text and the host-facing events its TLVs produced.
    pub fn receive<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        msg: &DataMessage,
    ) -> Result<(Option<Vec<u8>>, Vec<SessionEvent>), SessionError> {
        let counter = u64::from_be_bytes(msg.ctr);
        let enc = self.encrypted_mut()?;
        let keyset = enc.keys.inbound_keyset(msg.sender_keyid, msg.recipient_keyid, counter)?;

        let expected_mac = hmac_sha1(&keyset.recv_mac, &mac_input(msg));
        if expected_mac != msg.mac {
            warn!(version = self.version, "DATA message MAC verification failed, dropping");
            return Err(SessionError::MacVerification);
        }

        enc.keys.commit_inbound(rng, msg.sender_keyid, msg.recipient_keyid, counter);
        enc.keys.record_remote_next(msg.sender_keyid, &msg.next_dh);

        let mut plaintext = msg.enc_msg.clone();
        apply_keystream(&keyset.recv_aes, &counter_iv(counter), &mut plaintext)?;
        let (body, tlv_bytes) = tlv::split_body_and_tlvs(&plaintext);
        let body = if body.is_empty() { None } else { Some(body.to_vec()) };
        let tlvs = tlv::decode_all(tlv_bytes)?;

        let mut events = Vec::new();
        for record in tlvs {
            self.dispatch_tlv(rng, record, &mut events)?;
        }
        Ok((body, events))
    }

    fn dispatch_tlv<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        record: Tlv,
        events: &mut Vec<SessionEvent>,
    ) -> Result<(), SessionError> {
        match record.tlv_type {
            TLV_DISCONNECT => {
                self.state = MessageState::Finished;
                events.push(SessionEvent::PeerDisconnected);
            }
            TLV_EXTRA_KEY => {
                let enc = self.encrypted_mut()?;
                let key = extra_symmetric_key(&enc.keys.raw_shared_secret());
                events.push(SessionEvent::ExtraKeyReceived(key, record.value));
            }
            TLV_SMP1 | TLV_SMP2 | TLV_SMP3 | TLV_SMP4 | TLV_SMP_ABORT => {
                let enc = self.encrypted_mut()?;
                let output = match record.tlv_type {
                    TLV_SMP1 => enc.smp.on_smp1(&record.value)?,
                    TLV_SMP2 => enc.smp.on_smp2(&record.value, rng)?,
                    TLV_SMP3 => enc.smp.on_smp3(&record.value, rng)?,
                    TLV_SMP4 => enc.smp.on_smp4(&record.value)?,
                    _ => {
                        enc.smp.abort();
                        SmpOutput::Nothing
                    }
                };
                match output {
                    SmpOutput::Finished(result) => events.push(SessionEvent::SmpFinished(result)),
                    SmpOutput::AwaitSecret | SmpOutput::SendTlv { .. } => events.push(SessionEvent::SmpProgress),
                    SmpOutput::Nothing => {}
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Everything a DATA message's MAC covers: every field up to but excluding
/// the MAC itself (§4.5/§6), in the same field order `otr_wire::message`
/// writes them in.
fn mac_input(msg: &DataMessage) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_short(msg.version);
    w.write_byte(0x03);
    if msg.version >= 3 {
        w.write_int(msg.tags.sender);
        w.write_int(msg.tags.receiver);
    }
    w.write_byte(msg.flags);
    w.write_int(msg.sender_keyid);
    w.write_int(msg.recipient_keyid);
    w.write_mpi(&msg.next_dh);
    w.write_fixed(&msg.ctr);
    w.write_data(&msg.enc_msg);
    w.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsa::{Components, KeySize, SigningKey};
    use otr_crypto::dh::KeyPair as DhKeyPair;
    use otr_crypto::dsa_sig::{DsaKeyPair, DsaPublicKey};
    use rand::rngs::OsRng;

    fn fresh_identity() -> DsaKeyPair {
        let components = Components::generate(&mut OsRng, KeySize::DSA_1024_160);
        let signing_key = SigningKey::generate(&mut OsRng, components);
        let public = DsaPublicKey {
            p: signing_key.verifying_key().components().p().clone(),
            q: signing_key.verifying_key().components().q().clone(),
            g: signing_key.verifying_key().components().g().clone(),
            y: signing_key.verifying_key().y().clone(),
        };
        DsaKeyPair::from_components(&public, signing_key.x().clone()).unwrap()
    }

    fn paired_sessions() -> (Session, Session) {
        let local_dh = DhKeyPair::generate(&mut OsRng);
        let remote_dh = DhKeyPair::generate(&mut OsRng);
        let identity = fresh_identity();
        let tags = InstanceTags { sender: 1, receiver: 2 };

        let shared = local_dh.shared_secret(&remote_dh.public);
        let established_a = Established {
            shared: shared.clone(),
            ssid: [0u8; 8],
            local_dh: local_dh.clone(),
            remote_dh: remote_dh.public.clone(),
            local_keyid: 1,
            peer_pubkey: identity.public(),
            peer_keyid: 1,
            version: 3,
        };
        let established_b = Established {
            shared,
            ssid: [0u8; 8],
            local_dh: remote_dh,
            remote_dh: local_dh.public,
            local_keyid: 1,
            peer_pubkey: identity.public(),
            peer_keyid: 1,
            version: 3,
        };

        let mut alice = Session::new(3, InstanceTags { sender: tags.sender, receiver: tags.receiver });
        let mut bob = Session::new(3, InstanceTags { sender: tags.receiver, receiver: tags.sender });
        alice.establish(&mut OsRng, established_a, b"alice".to_vec(), b"bob".to_vec());
        bob.establish(&mut OsRng, established_b, b"bob".to_vec(), b"alice".to_vec());
        (alice, bob)
    }

    #[test]
    fn plaintext_roundtrips_through_data_message() {
        let (mut alice, mut bob) = paired_sessions();
        let msg = alice.send(b"hello bob", Vec::new()).unwrap();
        let data = match msg {
            Message::Data(d) => d,
            _ => panic!("expected a DATA message"),
        };
        let (plaintext, events) = bob.receive(&mut OsRng, &data).unwrap();
        assert_eq!(plaintext.unwrap(), b"hello bob");
        assert!(events.is_empty());
    }

    #[test]
    fn tampered_mac_is_rejected() {
        let (mut alice, mut bob) = paired_sessions();
        let msg = alice.send(b"hello bob", Vec::new()).unwrap();
        let mut data = match msg {
            Message::Data(d) => d,
            _ => panic!("expected a DATA message"),
        };
        data.mac[0] ^= 0xff;
        assert!(matches!(bob.receive(&mut OsRng, &data), Err(SessionError::MacVerification)));
    }

    #[test]
    fn disconnect_tlv_finishes_the_session() {
        let (mut alice, mut bob) = paired_sessions();
        let msg = alice.send_disconnect().unwrap();
        let data = match msg {
            Message::Data(d) => d,
            _ => panic!("expected a DATA message"),
        };
        let (_, events) = bob.receive(&mut OsRng, &data).unwrap();
        assert!(matches!(events[0], SessionEvent::PeerDisconnected));
        assert!(!bob.is_encrypted());
    }
}
