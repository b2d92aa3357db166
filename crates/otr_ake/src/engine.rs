//! The OTRv2/v3 interactive signature AKE state machine (§4.3's transition
//! table).

use otr_crypto::dh::KeyPair as DhKeyPair;
use otr_crypto::dsa_sig::{DsaKeyPair, DsaPublicKey};
use otr_crypto::{dh, BigUint};
use otr_wire::message::{
    DhCommit, DhKey, InstanceTags, Message, RevealSignature, SignatureMessage,
};
use otr_wire::primitives::Writer;
use rand::{CryptoRng, RngCore};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::dh_commit::{decrypt_gx, encrypt_gx, hash_gx};
use crate::error::AkeError;
use crate::keys::{derive, AkeKeys};
use crate::sig_payload::{self, SignaturePayload};
use crate::state::AuthState;

const INITIAL_KEYID: u32 = 1;

/// The outcome of feeding one AKE message through the engine.
pub enum AkeOutput {
    /// Send this message back to the peer; the auth state did not finish.
    Reply(Message),
    /// Nothing to send and nothing changed (duplicate or irrelevant message).
    NoReply,
    /// The AKE completed: an optional final reply plus the agreed session.
    Established { reply: Option<Message>, session: Established },
}

/// What the AKE hands off to session-key management (§4.5) once ENCRYPTED.
pub struct Established {
    pub shared: BigUint,
    pub ssid: [u8; 8],
    pub local_dh: DhKeyPair,
    pub remote_dh: BigUint,
    pub local_keyid: u32,
    pub peer_pubkey: DsaPublicKey,
    pub peer_keyid: u32,
    pub version: u16,
}

/// Cloneable so a dispatcher fielding multiple remote instances can fork one
/// engine's `AwaitingDhKey` state per instance once replies start arriving
/// from more than one of the peer's clients (§4.6).
#[derive(Clone)]
pub struct AkeEngine {
    state: AuthState,
}

impl Default for AkeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AkeEngine {
    pub fn new() -> Self {
        Self { state: AuthState::None }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Reset to `None`, as happens after any structural protocol violation
    /// (§3 "Lifecycles").
    pub fn reset(&mut self) {
        self.state = AuthState::None;
    }

    /// User-initiated: begin the AKE by sending a DH-Commit.
    pub fn initiate<R: RngCore + CryptoRng>(&mut self, version: u16, rng: &mut R) -> Message {
        let local_dh = DhKeyPair::generate(rng);
        let mut r = [0u8; 16];
        rng.fill_bytes(&mut r);
        let encrypted_gx = encrypt_gx(&r, &local_dh.public);
        let hash = hash_gx(&local_dh.public);

        let reply = Message::DhCommit(DhCommit {
            version,
            tags: InstanceTags::default(),
            encrypted_gx: encrypted_gx.clone(),
            hash_gx: hash.clone(),
        });

        self.state = AuthState::AwaitingDhKey {
            r: Zeroizing::new(r),
            local_dh,
            local_dh_hash: hash,
            local_dh_encrypted: encrypted_gx,
            version,
        };
        reply
    }

    pub fn on_dh_commit<R: RngCore + CryptoRng>(
        &mut self,
        msg: &DhCommit,
        allowed_versions: &[u16],
        rng: &mut R,
    ) -> Result<AkeOutput, AkeError> {
        if !allowed_versions.contains(&msg.version) {
            return Err(AkeError::PolicyRejected(msg.version));
        }

        let old = std::mem::replace(&mut self.state, AuthState::None);
        match old {
            AuthState::None => {
                let local_dh = DhKeyPair::generate(rng);
                let reply = Message::DhKey(DhKey {
                    version: msg.version,
                    tags: swap_tags(msg.tags),
                    gy: local_dh.public.clone(),
                });
                self.state = AuthState::AwaitingRevealSig {
                    local_dh,
                    remote_dh_hash: msg.hash_gx.clone(),
                    remote_dh_encrypted: msg.encrypted_gx.clone(),
                    version: msg.version,
                };
                Ok(AkeOutput::Reply(reply))
            }
            AuthState::AwaitingDhKey { r, local_dh, local_dh_hash, local_dh_encrypted, version }
                if version == msg.version =>
            {
                let our_hash = BigUint::from_bytes_be(&local_dh_hash);
                let their_hash = BigUint::from_bytes_be(&msg.hash_gx);
                if our_hash < their_hash {
                    // We lose the tie-break: abandon our own commit and play
                    // the responder role instead, with a fresh keypair.
                    let _ = (r, local_dh); // our (x, gx, r) are discarded
                    let responder_dh = DhKeyPair::generate(rng);
                    let reply = Message::DhKey(DhKey {
                        version: msg.version,
                        tags: swap_tags(msg.tags),
                        gy: responder_dh.public.clone(),
                    });
                    self.state = AuthState::AwaitingRevealSig {
                        local_dh: responder_dh,
                        remote_dh_hash: msg.hash_gx.clone(),
                        remote_dh_encrypted: msg.encrypted_gx.clone(),
                        version: msg.version,
                    };
                    Ok(AkeOutput::Reply(reply))
                } else {
                    // We win the tie-break: resend our own DH-Commit unchanged.
                    let reply = Message::DhCommit(DhCommit {
                        version,
                        tags: InstanceTags::default(),
                        encrypted_gx: local_dh_encrypted.clone(),
                        hash_gx: local_dh_hash.clone(),
                    });
                    self.state = AuthState::AwaitingDhKey { r, local_dh, local_dh_hash, local_dh_encrypted, version };
                    Ok(AkeOutput::Reply(reply))
                }
            }
            AuthState::AwaitingRevealSig { local_dh, version, .. } if version == msg.version => {
                let reply = Message::DhKey(DhKey {
                    version,
                    tags: swap_tags(msg.tags),
                    gy: local_dh.public.clone(),
                });
                self.state = AuthState::AwaitingRevealSig {
                    local_dh,
                    remote_dh_hash: msg.hash_gx.clone(),
                    remote_dh_encrypted: msg.encrypted_gx.clone(),
                    version: msg.version,
                };
                Ok(AkeOutput::Reply(reply))
            }
            AuthState::AwaitingSig { version, .. } if version == msg.version => {
                let local_dh = DhKeyPair::generate(rng);
                let reply = Message::DhKey(DhKey {
                    version,
                    tags: swap_tags(msg.tags),
                    gy: local_dh.public.clone(),
                });
                self.state = AuthState::AwaitingRevealSig {
                    local_dh,
                    remote_dh_hash: msg.hash_gx.clone(),
                    remote_dh_encrypted: msg.encrypted_gx.clone(),
                    version: msg.version,
                };
                Ok(AkeOutput::Reply(reply))
            }
            other => {
                // Version mismatch against the in-flight state: drop.
                self.state = other;
                Ok(AkeOutput::NoReply)
            }
        }
    }

    /// Matches against a clone of `self.state` rather than consuming it via
    /// `mem::replace`, so every validation/signature failure below can just
    /// return `Err` and leave `self.state` exactly as it was — only the
    /// success paths below write a new value into `self.state` (§4.3's
    /// failure semantics: a bad message is dropped, not a live handshake).
    pub fn on_dh_key(&mut self, msg: &DhKey, local_identity: &DsaKeyPair) -> Result<AkeOutput, AkeError> {
        match self.state.clone() {
            AuthState::AwaitingDhKey { r, local_dh, version, .. } if version == msg.version => {
                dh::validate_group_element(&msg.gy)?;
                let shared = local_dh.shared_secret(&msg.gy);
                let keys = derive(&shared);
                let reply = build_reveal_signature(
                    local_identity,
                    &local_dh,
                    &msg.gy,
                    &r,
                    &keys,
                    version,
                    msg.tags,
                )?;
                self.state = AuthState::AwaitingSig { r, local_dh, remote_dh: msg.gy.clone(), shared, keys, version };
                Ok(AkeOutput::Reply(reply))
            }
            AuthState::AwaitingSig { r, local_dh, remote_dh, shared, keys, version } if version == msg.version => {
                if remote_dh == msg.gy {
                    // Duplicate DH-Key: resend Reveal-Signature, still
                    // revealing the same `r` our original DH-Commit used.
                    let reply = build_reveal_signature(
                        local_identity,
                        &local_dh,
                        &remote_dh,
                        &r,
                        &keys,
                        version,
                        InstanceTags::default(),
                    )?;
                    Ok(AkeOutput::Reply(reply))
                } else {
                    Ok(AkeOutput::NoReply)
                }
            }
            _ => Ok(AkeOutput::NoReply),
        }
    }

    /// Same "match a clone, only write `self.state` on success" discipline
    /// as [`Self::on_dh_key`]: a bad `revealed_r`, hash mismatch, MAC
    /// failure, malformed `X`, or signature failure all return `Err`
    /// without disturbing the in-flight `AwaitingRevealSig` state.
    pub fn on_reveal_signature(
        &mut self,
        msg: &RevealSignature,
        local_identity: &DsaKeyPair,
    ) -> Result<AkeOutput, AkeError> {
        let (local_dh, remote_dh_hash, remote_dh_encrypted, version) = match self.state.clone() {
            AuthState::AwaitingRevealSig { local_dh, remote_dh_hash, remote_dh_encrypted, version }
                if version == msg.version =>
            {
                (local_dh, remote_dh_hash, remote_dh_encrypted, version)
            }
            _ => return Ok(AkeOutput::NoReply),
        };

        let r = to_fixed16(&msg.revealed_r)?;
        let gx = decrypt_gx(&r, &remote_dh_encrypted)?;
        if hash_gx(&gx) != remote_dh_hash {
            return Err(AkeError::HashMismatch);
        }
        dh::validate_group_element(&gx)?;

        let shared = local_dh.shared_secret(&gx);
        let keys = derive(&shared);

        if !verify_mac(&keys.m2, &msg.enc_sig, &msg.mac_sig) {
            warn!(version, "Reveal-Signature MAC verification failed, dropping and preserving state");
            return Err(AkeError::MacVerification);
        }

        let x_bytes = decrypt_sig_payload(&keys.c, &msg.enc_sig);
        let peer = sig_payload::decode(&x_bytes)?;
        let m_a = sig_payload::compute_m(&keys.m1, &gx, &local_dh.public, &peer.pubkey, peer.keyid);
        peer.pubkey
            .verify(&m_a, &peer.signature)
            .map_err(|_| AkeError::SignatureVerification)?;

        let our_m = sig_payload::compute_m(&keys.m1_prime, &gx, &local_dh.public, &local_identity.public(), INITIAL_KEYID);
        let our_sig = local_identity.sign(&our_m)?;
        let our_payload = SignaturePayload { pubkey: local_identity.public(), keyid: INITIAL_KEYID, signature: our_sig };
        let our_x = sig_payload::encode(&our_payload);
        let enc_sig = encrypt_sig_payload(&keys.c_prime, &our_x);
        let mac_sig = mac_sig_bytes(&keys.m2_prime, &enc_sig);

        let reply = Message::Signature(SignatureMessage { version, tags: InstanceTags::default(), enc_sig, mac_sig });

        info!(version, ssid = ?keys.ssid, "AKE established (responder)");
        self.state = AuthState::None;
        Ok(AkeOutput::Established {
            reply: Some(reply),
            session: Established {
                shared,
                ssid: keys.ssid,
                local_dh,
                remote_dh: gx,
                local_keyid: INITIAL_KEYID,
                peer_pubkey: peer.pubkey,
                peer_keyid: peer.keyid,
                version,
            },
        })
    }

    /// Same "match a clone, only write `self.state` on success" discipline
    /// as [`Self::on_dh_key`]: a MAC failure, malformed `X`, or signature
    /// failure all return `Err` without disturbing the in-flight
    /// `AwaitingSig` state.
    pub fn on_signature(&mut self, msg: &SignatureMessage) -> Result<AkeOutput, AkeError> {
        let (local_dh, remote_dh, shared, keys, version) = match self.state.clone() {
            AuthState::AwaitingSig { local_dh, remote_dh, shared, keys, version, .. } if version == msg.version => {
                (local_dh, remote_dh, shared, keys, version)
            }
            _ => return Ok(AkeOutput::NoReply),
        };

        if !verify_mac(&keys.m2_prime, &msg.enc_sig, &msg.mac_sig) {
            warn!(version, "Signature MAC verification failed, dropping and preserving state");
            return Err(AkeError::MacVerification);
        }

        let x_bytes = decrypt_sig_payload(&keys.c_prime, &msg.enc_sig);
        let peer = sig_payload::decode(&x_bytes)?;
        let m_b = sig_payload::compute_m(&keys.m1_prime, &remote_dh, &local_dh.public, &peer.pubkey, peer.keyid);
        peer.pubkey
            .verify(&m_b, &peer.signature)
            .map_err(|_| AkeError::SignatureVerification)?;

        info!(version, ssid = ?keys.ssid, "AKE established (initiator)");
        self.state = AuthState::None;
        Ok(AkeOutput::Established {
            reply: None,
            session: Established {
                shared,
                ssid: keys.ssid,
                local_dh,
                remote_dh,
                local_keyid: INITIAL_KEYID,
                peer_pubkey: peer.pubkey,
                peer_keyid: peer.keyid,
                version,
            },
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn build_reveal_signature(
    local_identity: &DsaKeyPair,
    local_dh: &DhKeyPair,
    remote_gy: &BigUint,
    r: &[u8; 16],
    keys: &AkeKeys,
    version: u16,
    tags: InstanceTags,
) -> Result<Message, AkeError> {
    let m_a = sig_payload::compute_m(&keys.m1, &local_dh.public, remote_gy, &local_identity.public(), INITIAL_KEYID);
    let sig = local_identity.sign(&m_a)?;
    let payload = SignaturePayload { pubkey: local_identity.public(), keyid: INITIAL_KEYID, signature: sig };
    let x_bytes = sig_payload::encode(&payload);
    let enc_sig = encrypt_sig_payload(&keys.c, &x_bytes);
    let mac_sig = mac_sig_bytes(&keys.m2, &enc_sig);

    Ok(Message::RevealSignature(RevealSignature {
        version,
        tags: swap_tags(tags),
        revealed_r: r.to_vec(),
        enc_sig,
        mac_sig,
    }))
}

fn encrypt_sig_payload(key: &[u8; 16], plaintext: &[u8]) -> Vec<u8> {
    let mut buf = plaintext.to_vec();
    otr_crypto::cipher::apply_keystream(key, &otr_crypto::cipher::zero_counter(), &mut buf)
        .expect("fixed-size AES-128 key");
    buf
}

fn decrypt_sig_payload(key: &[u8; 16], ciphertext: &[u8]) -> Vec<u8> {
    encrypt_sig_payload(key, ciphertext) // AES-CTR is self-inverse
}

/// `SHA256HMAC(mac_key, DATA(ciphertext))`, truncated to the first 20 bytes.
fn mac_sig_bytes(mac_key: &[u8; 32], ciphertext: &[u8]) -> [u8; 20] {
    let mut w = Writer::new();
    w.write_data(ciphertext);
    let full = otr_crypto::hashes::hmac_sha256(mac_key, &w.into_bytes());
    let mut out = [0u8; 20];
    out.copy_from_slice(&full[..20]);
    out
}

fn verify_mac(mac_key: &[u8; 32], ciphertext: &[u8], expected: &[u8; 20]) -> bool {
    mac_sig_bytes(mac_key, ciphertext) == *expected
}

fn to_fixed16(bytes: &[u8]) -> Result<[u8; 16], AkeError> {
    bytes
        .try_into()
        .map_err(|_| AkeError::Malformed("revealed_r must be 16 bytes".into()))
}

fn swap_tags(tags: InstanceTags) -> InstanceTags {
    InstanceTags { sender: tags.receiver, receiver: tags.sender }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsa::{Components, KeySize, SigningKey};
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

    #[test]
    fn full_ake_dual_run_ends_encrypted_with_matching_ssid() {
        let alice_identity = fresh_identity();
        let bob_identity = fresh_identity();
        let mut alice = AkeEngine::new();
        let mut bob = AkeEngine::new();

        let dh_commit = alice.initiate(3, &mut OsRng);
        let Message::DhCommit(dh_commit) = dh_commit else { panic!() };

        let AkeOutput::Reply(Message::DhKey(dh_key)) =
            bob.on_dh_commit(&dh_commit, &[2, 3], &mut OsRng).unwrap()
        else {
            panic!()
        };

        let AkeOutput::Reply(Message::RevealSignature(reveal_sig)) =
            alice.on_dh_key(&dh_key, &alice_identity).unwrap()
        else {
            panic!()
        };

        let AkeOutput::Established { reply: Some(Message::Signature(sig_msg)), session: bob_session } =
            bob.on_reveal_signature(&reveal_sig, &bob_identity).unwrap()
        else {
            panic!()
        };

        let AkeOutput::Established { reply: None, session: alice_session } =
            alice.on_signature(&sig_msg).unwrap()
        else {
            panic!()
        };

        assert_eq!(alice_session.ssid, bob_session.ssid);
        assert_eq!(alice_session.shared, bob_session.shared);
    }
}
