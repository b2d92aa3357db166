//! Per-(localKeyId, remoteKeyId) session keys (§3 "Session keys (v2/v3)",
//! §4.5): up to four concurrent DH key pairs, each combination producing its
//! own AES/MAC keyset from that pairing's shared secret. §4.5's single
//! formula ("AES = SHA1(0x01 || SHA1(raw_gxy))") is completed here into the
//! real protocol's two-key split — one derived value per direction — so a
//! send and a receive stream under the same key pairing never reuse a
//! keystream; which of the two computed values is "send" and which is
//! "recv" is decided the same way the AKE breaks a DH-Commit tie (§4.3):
//! by comparing the two sides' public DH values.

use std::collections::HashMap;

use otr_ake::Established;
use otr_crypto::dh::KeyPair as DhKeyPair;
use otr_crypto::hashes::sha1;
use otr_crypto::BigUint;
use rand::{CryptoRng, RngCore};

use crate::error::SessionError;

pub struct KeySet {
    pub send_aes: [u8; 16],
    pub send_mac: [u8; 20],
    pub recv_aes: [u8; 16],
    pub recv_mac: [u8; 20],
}

fn tagged_hash(tag: u8, secbytes: &[u8]) -> [u8; 20] {
    let mut buf = Vec::with_capacity(1 + secbytes.len());
    buf.push(tag);
    buf.extend_from_slice(secbytes);
    sha1(&buf)
}

fn derive_key_set(local_pub: &BigUint, remote_pub: &BigUint, raw_gxy: &BigUint) -> KeySet {
    let secbytes = raw_gxy.to_bytes_be();
    let k1 = tagged_hash(0x01, &secbytes);
    let k2 = tagged_hash(0x02, &secbytes);
    let (send_full, recv_full) = if local_pub > remote_pub { (k1, k2) } else { (k2, k1) };
    let mut send_aes = [0u8; 16];
    send_aes.copy_from_slice(&send_full[..16]);
    let mut recv_aes = [0u8; 16];
    recv_aes.copy_from_slice(&recv_full[..16]);
    KeySet { send_aes, send_mac: sha1(&send_aes), recv_aes, recv_mac: sha1(&recv_aes) }
}

/// A 32-byte key derivable by both sides without further negotiation (§4.5
/// "Extra symmetric key"), delivered to the host on demand and signalled to
/// the peer via TLV type 8.
pub fn extra_symmetric_key(raw_gxy: &BigUint) -> [u8; 32] {
    let secbytes = raw_gxy.to_bytes_be();
    let mut buf = Vec::with_capacity(1 + secbytes.len());
    buf.push(0xff);
    buf.extend_from_slice(&secbytes);
    otr_crypto::hashes::sha256(&buf)
}

pub struct SessionKeys {
    local_old: Option<(u32, DhKeyPair)>,
    local_new: (u32, DhKeyPair),
    local_next: (u32, DhKeyPair),
    remote_old: Option<(u32, BigUint)>,
    remote_new: (u32, BigUint),
    remote_next: Option<(u32, BigUint)>,
    send_counter: u64,
    recv_counters: HashMap<u32, u64>,
    mac_keys_to_reveal: Vec<[u8; 20]>,
}

impl SessionKeys {
    pub fn new<R: RngCore + CryptoRng>(rng: &mut R, established: &Established) -> Self {
        Self {
            local_old: None,
            local_new: (established.local_keyid, established.local_dh.clone()),
            local_next: (established.local_keyid + 1, DhKeyPair::generate(rng)),
            remote_old: None,
            remote_new: (established.peer_keyid, established.remote_dh.clone()),
            remote_next: None,
            send_counter: 0,
            recv_counters: HashMap::new(),
            mac_keys_to_reveal: Vec::new(),
        }
    }

    fn lookup_local(&self, keyid: u32) -> Option<&DhKeyPair> {
        if self.local_new.0 == keyid {
            Some(&self.local_new.1)
        } else if self.local_old.as_ref().is_some_and(|(id, _)| *id == keyid) {
            self.local_old.as_ref().map(|(_, kp)| kp)
        } else if self.local_next.0 == keyid {
            Some(&self.local_next.1)
        } else {
            None
        }
    }

    fn lookup_remote(&self, keyid: u32) -> Option<&BigUint> {
        if self.remote_new.0 == keyid {
            Some(&self.remote_new.1)
        } else if self.remote_old.as_ref().is_some_and(|(id, _)| *id == keyid) {
            self.remote_old.as_ref().map(|(_, pk)| pk)
        } else if self.remote_next.as_ref().is_some_and(|(id, _)| *id == keyid) {
            self.remote_next.as_ref().map(|(_, pk)| pk)
        } else {
            None
        }
    }

    /// The keyset and counter to use for the next outbound DATA message, and
    /// our currently advertised "next" public DH value to attach as
    /// `next_dh` so the peer can pre-stage its own rotation.
    pub fn prepare_outbound(&mut self) -> (u32, u32, KeySet, BigUint, u64) {
        let keyset = derive_key_set(
            &self.local_new.1.public,
            &self.remote_new.1,
            &self.local_new.1.shared_secret(&self.remote_new.1),
        );
        self.send_counter += 1;
        (self.local_new.0, self.remote_new.0, keyset, self.local_next.1.public.clone(), self.send_counter)
    }

    /// §4.5 "old MAC keys to be revealed": drained once attached to an
    /// outbound message.
    pub fn take_mac_keys_to_reveal(&mut self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.mac_keys_to_reveal.len() * 20);
        for key in self.mac_keys_to_reveal.drain(..) {
            out.extend_from_slice(&key);
        }
        out
    }

    /// The keyset to verify/decrypt an inbound message's (sender_keyid,
    /// recipient_keyid) pairing against, checked for replay but without
    /// promoting any "next" key into current use (§4.5: reject replay,
    /// verify MAC, decrypt, *then* rotate — a forged message must not be
    /// able to desync our keyid bookkeeping before it has even been
    /// authenticated). `local_next`/`remote_next` are consulted directly so
    /// a message that legitimately references them can still be verified
    /// before [`Self::commit_inbound`] promotes them.
    pub fn inbound_keyset(&self, sender_keyid: u32, recipient_keyid: u32, counter: u64) -> Result<KeySet, SessionError> {
        if let Some(last_seen) = self.recv_counters.get(&sender_keyid) {
            if counter <= *last_seen {
                return Err(SessionError::Replay);
            }
        }

        let local_kp = self.lookup_local(recipient_keyid).ok_or(SessionError::UnknownKeyId(recipient_keyid, sender_keyid))?;
        let remote_pub = self.lookup_remote(sender_keyid).ok_or(SessionError::UnknownKeyId(recipient_keyid, sender_keyid))?;
        Ok(derive_key_set(&local_kp.public, remote_pub, &local_kp.shared_secret(remote_pub)))
    }

    /// Promote announced next keys into current use once a message
    /// referencing them has been authenticated, and advance replay
    /// protection. Only call this after the MAC computed from
    /// [`Self::inbound_keyset`] has verified.
    pub fn commit_inbound<R: RngCore + CryptoRng>(&mut self, rng: &mut R, sender_keyid: u32, recipient_keyid: u32, counter: u64) {
        if let Some((next_id, _)) = self.remote_next {
            if sender_keyid == next_id {
                let (next_id, next_pub) = self.remote_next.take().expect("checked above");
                let retiring = std::mem::replace(&mut self.remote_new, (next_id, next_pub));
                self.remote_old = Some(retiring);
            }
        }
        if recipient_keyid == self.local_next.0 {
            let fresh = (self.local_next.0 + 1, DhKeyPair::generate(rng));
            let promoted = std::mem::replace(&mut self.local_next, fresh);
            let retiring = std::mem::replace(&mut self.local_new, promoted);
            if let Some((_, old_kp)) = self.local_old.replace(retiring) {
                let stale = derive_key_set(&old_kp.public, &self.remote_new.1, &old_kp.shared_secret(&self.remote_new.1));
                self.mac_keys_to_reveal.push(stale.recv_mac);
            }
        }

        self.recv_counters.insert(sender_keyid, counter);
    }

    /// Record the peer's announced next public key (§4.5 "`next_dh`"), used
    /// once a later message's `sender_keyid` actually adopts it.
    pub fn record_remote_next(&mut self, sender_keyid: u32, next_dh: &BigUint) {
        self.remote_next = Some((sender_keyid + 1, next_dh.clone()));
    }

    /// The shared secret for the currently active outbound pairing, used to
    /// derive the extra symmetric key (§4.5).
    pub fn raw_shared_secret(&self) -> BigUint {
        self.local_new.1.shared_secret(&self.remote_new.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsa::{Components, KeySize, SigningKey};
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

    fn fresh_established() -> Established {
        let local_dh = DhKeyPair::generate(&mut OsRng);
        let remote_dh = DhKeyPair::generate(&mut OsRng);
        let identity = fresh_identity();
        Established {
            shared: local_dh.shared_secret(&remote_dh.public),
            ssid: [0u8; 8],
            local_dh,
            remote_dh: remote_dh.public,
            local_keyid: 1,
            peer_pubkey: identity.public(),
            peer_keyid: 1,
            version: 3,
        }
    }

    #[test]
    fn outbound_and_inbound_keysets_agree_on_first_message() {
        let established_for_alice = fresh_established();
        let mut alice = SessionKeys::new(&mut OsRng, &established_for_alice);
        let (local_keyid, remote_keyid, alice_keyset, _next, counter) = alice.prepare_outbound();

        let mut bob = SessionKeys::new(&mut OsRng, &established_for_alice);
        let bob_keyset = bob.inbound_keyset(local_keyid, remote_keyid, counter).unwrap();
        bob.commit_inbound(&mut OsRng, local_keyid, remote_keyid, counter);

        assert_eq!(alice_keyset.send_aes, bob_keyset.recv_aes);
        assert_eq!(alice_keyset.send_mac, bob_keyset.recv_mac);
    }

    #[test]
    fn replayed_counter_is_rejected() {
        let established = fresh_established();
        let mut bob = SessionKeys::new(&mut OsRng, &established);
        bob.inbound_keyset(1, 1, 5).unwrap();
        bob.commit_inbound(&mut OsRng, 1, 1, 5);
        assert!(matches!(bob.inbound_keyset(1, 1, 5), Err(SessionError::Replay)));
        assert!(matches!(bob.inbound_keyset(1, 1, 4), Err(SessionError::Replay)));
    }
}
