//! The multi-instance dispatcher (§4.6, §8 scenarios S1-S6): routes inbound
//! lines to per-remote-instance sub-sessions, drives the AKE and message
//! engines one layer down, and is the only place in the crate that reaches
//! out to a [`Host`]. Structurally one level above `otr_ake::AkeEngine` and
//! `otr_session::Session`'s own "one struct, fallible `on_*` methods" shape:
//! a `Conversation` owns one `AkeEngine`/`Session` pair per remote instance
//! tag instead of just one of each.

use std::collections::HashMap;

use otr_ake::{AkeEngine, AkeOutput, AuthState, Established};
use otr_crypto::dsa_sig::DsaPublicKey;
use otr_crypto::hashes::sha1;
use otr_fragment::{Accumulated, Assembler};
use otr_session::{Session, SessionEvent};
use otr_smp::SmpResult;
use otr_wire::dsa::write_dsa_pubkey;
use otr_wire::message::{InstanceTags, Message};
use otr_wire::primitives::Writer;
use otr_wire::text::{append_whitespace_tag, format_error, format_query};
use rand::{CryptoRng, RngCore};
use tracing::warn;

use crate::error::OtrError;
use crate::host::{Host, SessionId};
use crate::policy::Policy;

/// §3 "Instance tag": valid non-zero values are `>= 0x100`; sample until one
/// lands in range rather than masking, so the distribution stays uniform.
pub fn generate_instance_tag<R: RngCore>(rng: &mut R) -> u32 {
    loop {
        let tag = rng.next_u32();
        if tag >= 0x100 {
            return tag;
        }
    }
}

/// SHA1 over the wire encoding of a DSA public key (§3 "SSID"'s sibling
/// concept, the long-term key fingerprint shown to users for verification).
fn fingerprint(pubkey: &DsaPublicKey) -> Vec<u8> {
    let mut w = Writer::new();
    write_dsa_pubkey(&mut w, pubkey);
    sha1(&w.into_bytes()).to_vec()
}

fn message_meta(msg: &Message) -> (u16, InstanceTags) {
    match msg {
        Message::DhCommit(m) => (m.version, m.tags),
        Message::DhKey(m) => (m.version, m.tags),
        Message::RevealSignature(m) => (m.version, m.tags),
        Message::Signature(m) => (m.version, m.tags),
        Message::Data(m) => (m.version, m.tags),
        Message::IdentityMessage(m) => (4, m.tags),
        Message::AuthR(m) => (4, m.tags),
        Message::AuthI(m) => (4, m.tags),
        Message::DataV4(m) => (4, m.tags),
        Message::Plaintext { .. } | Message::Query { .. } | Message::Error { .. } => {
            (0, InstanceTags::default())
        }
    }
}

fn stamp_sender_tag(msg: &mut Message, local_instance_tag: u32) {
    let tags = match msg {
        Message::DhCommit(m) => &mut m.tags,
        Message::DhKey(m) => &mut m.tags,
        Message::RevealSignature(m) => &mut m.tags,
        Message::Signature(m) => &mut m.tags,
        Message::Data(m) => &mut m.tags,
        Message::IdentityMessage(m) => &mut m.tags,
        Message::AuthR(m) => &mut m.tags,
        Message::AuthI(m) => &mut m.tags,
        Message::DataV4(m) => &mut m.tags,
        Message::Plaintext { .. } | Message::Query { .. } | Message::Error { .. } => return,
    };
    tags.sender = local_instance_tag;
}

fn negotiate_version(offered: &[u16], policy: &Policy) -> Option<u16> {
    policy.allowed_versions().into_iter().find(|v| offered.contains(v))
}

/// One AKE/message-state pair, either the master (instance tag 0, the
/// rendezvous used before any peer instance tag is known) or a sub-session
/// bound to one specific remote instance (§3 "Session identity").
struct SubSession {
    instance_tag: u32,
    auth: AkeEngine,
    session: Option<Session>,
    peer_fingerprint: Option<Vec<u8>>,
}

impl SubSession {
    fn new(instance_tag: u32) -> Self {
        Self { instance_tag, auth: AkeEngine::new(), session: None, peer_fingerprint: None }
    }
}

/// Find-or-create the sub-session for `sender` (§4.6's "find or create the
/// sub-session keyed by sender tag"); v2 has no instance tags and always
/// uses the master. Takes disjoint field references rather than `&mut
/// Conversation` so callers in `dispatch` can keep reading other fields
/// (the session id, in particular) while the returned borrow is still live.
fn find_or_create_sub<'a>(
    master: &'a mut SubSession,
    instances: &'a mut HashMap<u32, SubSession>,
    announced: &mut bool,
    host: &mut dyn Host,
    id: &SessionId,
    version: u16,
    sender: u32,
) -> &'a mut SubSession {
    if version < 3 {
        return master;
    }
    if !instances.contains_key(&sender) {
        instances.insert(sender, SubSession::new(sender));
        if !*announced && instances.len() >= 2 {
            *announced = true;
            host.multiple_instances_detected(id);
        }
    }
    instances.get_mut(&sender).expect("just inserted")
}

/// DH-Key is special: the first reply from a previously-unseen instance
/// while the master is `AwaitingDhKey` forks the master's in-flight AKE
/// state rather than starting a fresh one, so the master stays available
/// to answer further instances of the same broadcast DH-Commit (§4.6).
fn find_or_fork_dh_key_sub<'a>(
    master: &'a mut SubSession,
    instances: &'a mut HashMap<u32, SubSession>,
    version: u16,
    sender: u32,
) -> &'a mut SubSession {
    if version < 3 {
        return master;
    }
    if !instances.contains_key(&sender) {
        let forked = if matches!(master.auth.state(), AuthState::AwaitingDhKey { .. }) {
            SubSession { instance_tag: sender, auth: master.auth.clone(), session: None, peer_fingerprint: None }
        } else {
            SubSession::new(sender)
        };
        instances.insert(sender, forked);
    }
    instances.get_mut(&sender).expect("just inserted")
}

/// One conversation with a single remote account: the master sub-session
/// plus one sub-session per remote instance tag discovered so far (§3
/// "A session is a mapping from remote instance tag to a sub-session").
pub struct Conversation {
    id: SessionId,
    local_instance_tag: u32,
    assembler: Assembler,
    master: SubSession,
    instances: HashMap<u32, SubSession>,
    outbound_target: Option<u32>,
    multiple_instances_announced: bool,
}

impl Conversation {
    pub fn new(id: SessionId, local_instance_tag: u32) -> Self {
        Self {
            id,
            local_instance_tag,
            assembler: Assembler::new(local_instance_tag),
            master: SubSession::new(0),
            instances: HashMap::new(),
            outbound_target: None,
            multiple_instances_announced: false,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Send this conversation's `?OTRvXY?` query tag (§8 S1). The actual
    /// DH-Commit is sent by whichever side receives the tag, not by us.
    pub fn start_session(&mut self, host: &mut dyn Host) -> Result<(), OtrError> {
        let policy = host.get_session_policy(&self.id)?;
        if policy.disables_otr() {
            return Err(OtrError::Policy("policy allows no OTR version".into()));
        }
        let text = format_query(&policy.allowed_versions());
        host.inject_message(&self.id, &text)?;
        Ok(())
    }

    /// Disconnect the active outbound sub-session, if any, sending a
    /// disconnect TLV (§4.4 "Cancellation is cooperative").
    pub fn end_session<R: RngCore + CryptoRng>(&mut self, host: &mut dyn Host, rng: &mut R) -> Result<(), OtrError> {
        let Some(sub) = self.outbound_sub_mut() else { return Ok(()) };
        let Some(session) = sub.session.as_mut() else { return Ok(()) };
        let tag = sub.instance_tag;
        let msg = session.send_disconnect()?;
        self.send_encoded_to(host, rng, msg, Some(tag))
    }

    pub fn send_message<R: RngCore + CryptoRng>(
        &mut self,
        host: &mut dyn Host,
        rng: &mut R,
        plaintext: &str,
    ) -> Result<(), OtrError> {
        let policy = host.get_session_policy(&self.id)?;
        let sub: &mut SubSession = match self.outbound_target {
            Some(tag) if self.instances.contains_key(&tag) => self.instances.get_mut(&tag).expect("checked above"),
            _ => &mut self.master,
        };

        match sub.session.as_mut() {
            Some(session) if session.is_encrypted() => {
                let msg = session.send(plaintext.as_bytes(), Vec::new())?;
                let tag = sub.instance_tag;
                self.send_encoded_to(host, rng, msg, Some(tag))
            }
            Some(_finished) => {
                host.finished_session_message(&self.id, plaintext);
                Err(OtrError::Policy("session is finished; restart it before sending".into()))
            }
            None if policy.require_encryption => {
                host.require_encrypted_message(&self.id, plaintext);
                Err(OtrError::Policy("policy requires an encrypted channel".into()))
            }
            None => {
                let text = if policy.send_whitespace_tag {
                    append_whitespace_tag(plaintext, &policy.allowed_versions())
                } else {
                    plaintext.to_string()
                };
                host.inject_message(&self.id, &text)?;
                Ok(())
            }
        }
    }

    pub fn init_smp<R: RngCore + CryptoRng>(
        &mut self,
        host: &mut dyn Host,
        rng: &mut R,
        secret: &[u8],
    ) -> Result<(), OtrError> {
        let sub = self.outbound_sub_mut().ok_or_else(|| OtrError::Policy("no active session".into()))?;
        let session = sub.session.as_mut().ok_or(otr_session::SessionError::WrongState)?;
        let msg = session.start_smp(secret, rng)?;
        let tag = sub.instance_tag;
        self.send_encoded_to(host, rng, msg, Some(tag))
    }

    pub fn respond_smp<R: RngCore + CryptoRng>(
        &mut self,
        host: &mut dyn Host,
        rng: &mut R,
        secret: &[u8],
    ) -> Result<(), OtrError> {
        let sub = self.outbound_sub_mut().ok_or_else(|| OtrError::Policy("no active session".into()))?;
        let session = sub.session.as_mut().ok_or(otr_session::SessionError::WrongState)?;
        let msg = session.answer_smp(secret, rng)?;
        let tag = sub.instance_tag;
        self.send_encoded_to(host, rng, msg, Some(tag))
    }

    pub fn abort_smp<R: RngCore + CryptoRng>(&mut self, host: &mut dyn Host, rng: &mut R) -> Result<(), OtrError> {
        let sub = self.outbound_sub_mut().ok_or_else(|| OtrError::Policy("no active session".into()))?;
        let session = sub.session.as_mut().ok_or(otr_session::SessionError::WrongState)?;
        let msg = session.abort_smp()?;
        let tag = sub.instance_tag;
        self.send_encoded_to(host, rng, msg, Some(tag))
    }

    fn outbound_sub_mut(&mut self) -> Option<&mut SubSession> {
        match self.outbound_target {
            Some(tag) => self.instances.get_mut(&tag),
            None => Some(&mut self.master),
        }
    }

    /// Feed one inbound transport line through reassembly, parsing, and
    /// dispatch. Protocol/crypto failures are logged and dropped here
    /// (§7); only host-callback failures from this call itself propagate.
    pub fn receive_line<R: RngCore + CryptoRng>(
        &mut self,
        host: &mut dyn Host,
        rng: &mut R,
        line: &str,
    ) -> Result<Option<String>, OtrError> {
        let complete = match self.assembler.accumulate(line) {
            Ok(Accumulated::Complete(full)) => full,
            Ok(Accumulated::Partial) | Ok(Accumulated::UnknownInstance) => return Ok(None),
            Ok(Accumulated::NotAFragment) => line.to_string(),
            Err(e) => {
                warn!(session = ?self.id, error = %e, "dropping malformed fragment");
                return Ok(None);
            }
        };

        let message = match otr_wire::parse(&complete) {
            Ok(m) => m,
            Err(e) => {
                warn!(session = ?self.id, error = %e, "dropping unparseable line");
                return Ok(None);
            }
        };

        self.dispatch(host, rng, message)
    }

    fn dispatch<R: RngCore + CryptoRng>(
        &mut self,
        host: &mut dyn Host,
        rng: &mut R,
        message: Message,
    ) -> Result<Option<String>, OtrError> {
        // Cloned up front: several arms below hold a `&mut SubSession`
        // borrowed from `self.master`/`self.instances` and still need the
        // session id for host callbacks in the meantime.
        let id = self.id.clone();

        match message {
            Message::Query { versions } => {
                self.initiate_ake(host, rng, &versions)?;
                Ok(None)
            }
            Message::Plaintext { text, versions } => {
                if !versions.is_empty() {
                    let policy = match host.get_session_policy(&id) {
                        Ok(p) => p,
                        Err(e) => {
                            warn!(session = ?id, error = %e, "host policy lookup failed");
                            return Ok(Some(text));
                        }
                    };
                    if policy.whitespace_start_ake {
                        self.initiate_ake(host, rng, &versions)?;
                    }
                    return Ok(Some(text));
                }
                let policy = match host.get_session_policy(&id) {
                    Ok(p) => p,
                    Err(_) => return Ok(Some(text)),
                };
                if policy.require_encryption {
                    host.unencrypted_message_received(&id, &text);
                    Ok(None)
                } else {
                    Ok(Some(text))
                }
            }
            Message::Error { text } => {
                host.show_error(&id, &text);
                let policy = host.get_session_policy(&id)?;
                if policy.error_start_ake {
                    self.start_session(host)?;
                }
                Ok(None)
            }
            Message::DhCommit(m) => {
                let (version, tags) = (m.version, m.tags);
                if version >= 3 && tags.sender == 0 {
                    return Ok(None);
                }
                if version >= 3 && tags.receiver != 0 && tags.receiver != self.local_instance_tag {
                    return Ok(None);
                }
                let sub = find_or_create_sub(
                    &mut self.master,
                    &mut self.instances,
                    &mut self.multiple_instances_announced,
                    host,
                    &id,
                    version,
                    tags.sender,
                );
                let policy = match host.get_session_policy(&id) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(session = ?id, error = %e, "host policy lookup failed");
                        return Ok(None);
                    }
                };
                match sub.auth.on_dh_commit(&m, &policy.allowed_versions(), rng) {
                    Ok(AkeOutput::Reply(reply)) => {
                        let tag = sub.instance_tag;
                        self.send_encoded_to(host, rng, reply, Some(tag))?;
                    }
                    Ok(AkeOutput::NoReply) => {}
                    Ok(AkeOutput::Established { .. }) => {
                        unreachable!("DH-Commit never completes the AKE")
                    }
                    Err(e) => warn!(session = ?id, error = %e, "dropping DH-Commit"),
                }
                Ok(None)
            }
            Message::DhKey(m) => {
                let (version, tags) = (m.version, m.tags);
                if version >= 3 && (tags.sender == 0 || (tags.receiver != 0 && tags.receiver != self.local_instance_tag)) {
                    return Ok(None);
                }
                let sub = find_or_fork_dh_key_sub(&mut self.master, &mut self.instances, version, tags.sender);
                let local_identity = match host.get_local_key_pair(&id) {
                    Ok(k) => k,
                    Err(e) => {
                        warn!(session = ?id, error = %e, "host key lookup failed");
                        return Ok(None);
                    }
                };
                match sub.auth.on_dh_key(&m, &local_identity) {
                    Ok(AkeOutput::Reply(reply)) => {
                        let tag = sub.instance_tag;
                        self.send_encoded_to(host, rng, reply, Some(tag))?;
                    }
                    Ok(AkeOutput::NoReply) => {}
                    Ok(AkeOutput::Established { .. }) => unreachable!("DH-Key never completes the AKE"),
                    Err(e) => warn!(session = ?id, error = %e, "dropping DH-Key"),
                }
                Ok(None)
            }
            Message::RevealSignature(m) => {
                let (version, tags) = (m.version, m.tags);
                if version >= 3 && (tags.sender == 0 || (tags.receiver != 0 && tags.receiver != self.local_instance_tag)) {
                    return Ok(None);
                }
                let sub = find_or_create_sub(
                    &mut self.master,
                    &mut self.instances,
                    &mut self.multiple_instances_announced,
                    host,
                    &id,
                    version,
                    tags.sender,
                );
                let local_identity = match host.get_local_key_pair(&id) {
                    Ok(k) => k,
                    Err(e) => {
                        warn!(session = ?id, error = %e, "host key lookup failed");
                        return Ok(None);
                    }
                };
                match sub.auth.on_reveal_signature(&m, &local_identity) {
                    Ok(AkeOutput::Reply(reply)) => {
                        let tag = sub.instance_tag;
                        self.finish_ake(host, rng, tag, None, Some(reply))?;
                    }
                    Ok(AkeOutput::NoReply) => {}
                    Ok(AkeOutput::Established { reply, session }) => {
                        let tag = sub.instance_tag;
                        self.finish_ake(host, rng, tag, Some(session), reply)?;
                    }
                    Err(e) => warn!(session = ?id, error = %e, "dropping Reveal-Signature"),
                }
                Ok(None)
            }
            Message::Signature(m) => {
                let (version, tags) = (m.version, m.tags);
                if version >= 3 && (tags.sender == 0 || (tags.receiver != 0 && tags.receiver != self.local_instance_tag)) {
                    return Ok(None);
                }
                let sub = find_or_create_sub(
                    &mut self.master,
                    &mut self.instances,
                    &mut self.multiple_instances_announced,
                    host,
                    &id,
                    version,
                    tags.sender,
                );
                match sub.auth.on_signature(&m) {
                    Ok(AkeOutput::Established { reply, session }) => {
                        let tag = sub.instance_tag;
                        self.finish_ake(host, rng, tag, Some(session), reply)?;
                    }
                    Ok(AkeOutput::NoReply) => {}
                    Ok(AkeOutput::Reply(_)) => unreachable!("Signature either finishes the AKE or is ignored"),
                    Err(e) => warn!(session = ?id, error = %e, "dropping Signature"),
                }
                Ok(None)
            }
            Message::Data(m) => {
                let (version, tags) = (m.version, m.tags);
                if version >= 3 && (tags.sender == 0 || (tags.receiver != 0 && tags.receiver != self.local_instance_tag)) {
                    return Ok(None);
                }
                let from_another_instance = version >= 3
                    && self.outbound_target.is_some()
                    && self.outbound_target != Some(tags.sender)
                    && self.instances.contains_key(&tags.sender);
                let sub = find_or_create_sub(
                    &mut self.master,
                    &mut self.instances,
                    &mut self.multiple_instances_announced,
                    host,
                    &id,
                    version,
                    tags.sender,
                );

                let Some(session) = sub.session.as_mut() else {
                    host.unreadable_message_received(&id);
                    let error_text = host.get_reply_for_unreadable_message(&id);
                    host.inject_message(&id, &format_error(&error_text))?;
                    return Ok(None);
                };
                if !session.is_encrypted() {
                    host.unreadable_message_received(&id);
                    let error_text = host.get_reply_for_unreadable_message(&id);
                    host.inject_message(&id, &format_error(&error_text))?;
                    return Ok(None);
                }

                match session.receive(rng, &m) {
                    Ok((body, events)) => {
                        if from_another_instance {
                            host.message_from_another_instance(&id);
                        }
                        let instance_tag = sub.instance_tag;
                        self.handle_session_events(host, instance_tag, events);
                        Ok(body.map(|b| String::from_utf8_lossy(&b).into_owned()))
                    }
                    Err(e) => {
                        warn!(session = ?id, error = %e, "dropping undecryptable DATA message");
                        host.unreadable_message_received(&id);
                        Ok(None)
                    }
                }
            }
            Message::IdentityMessage(_) | Message::AuthR(_) | Message::AuthI(_) | Message::DataV4(_) => {
                warn!(session = ?id, "OTRv4 message received; this build only constructs v4 DAKE messages and cannot drive them, dropping");
                Ok(None)
            }
        }
    }

    fn handle_session_events(&self, host: &mut dyn Host, instance_tag: u32, events: Vec<SessionEvent>) {
        for event in events {
            match event {
                SessionEvent::SmpProgress => {}
                SessionEvent::SmpFinished(SmpResult::Succeeded) => {
                    if let Some(fp) = self.peer_fingerprint(instance_tag) {
                        host.verify(&self.id, &fp);
                    }
                }
                SessionEvent::SmpFinished(SmpResult::Failed) => {
                    if let Some(fp) = self.peer_fingerprint(instance_tag) {
                        host.unverify(&self.id, &fp);
                    }
                }
                SessionEvent::SmpFinished(SmpResult::Cheated) => {
                    host.smp_error(&self.id, 0, true);
                }
                SessionEvent::ExtraKeyReceived(..) => {}
                SessionEvent::PeerDisconnected => {
                    host.session_status_changed(&self.id, instance_tag);
                }
            }
        }
    }

    fn peer_fingerprint(&self, instance_tag: u32) -> Option<Vec<u8>> {
        let sub = if instance_tag == 0 { &self.master } else { self.instances.get(&instance_tag)? };
        sub.peer_fingerprint.clone()
    }

    fn initiate_ake<R: RngCore + CryptoRng>(
        &mut self,
        host: &mut dyn Host,
        rng: &mut R,
        offered: &[u16],
    ) -> Result<(), OtrError> {
        let policy = host.get_session_policy(&self.id)?;
        let Some(version) = negotiate_version(offered, &policy) else {
            return Ok(());
        };
        self.master.auth.reset();
        let reply = self.master.auth.initiate(version, rng);
        self.send_encoded_to(host, rng, reply, None)
    }

    fn finish_ake<R: RngCore + CryptoRng>(
        &mut self,
        host: &mut dyn Host,
        rng: &mut R,
        instance_tag: u32,
        established: Option<Established>,
        reply: Option<Message>,
    ) -> Result<(), OtrError> {
        if let Some(established) = established {
            let local_identity = host.get_local_key_pair(&self.id)?;
            let local_fp = fingerprint(&local_identity.public());
            let peer_fp = fingerprint(&established.peer_pubkey);
            let version = established.version;
            let tags = InstanceTags { sender: self.local_instance_tag, receiver: instance_tag };

            let sub = if instance_tag == 0 { &mut self.master } else { self.instances.entry(instance_tag).or_insert_with(|| SubSession::new(instance_tag)) };
            let mut session = Session::new(version, tags);
            session.establish(rng, established, local_fp, peer_fp.clone());
            sub.session = Some(session);
            sub.peer_fingerprint = Some(peer_fp);

            if self.outbound_target.is_none() {
                self.outbound_target = Some(instance_tag);
            }
            host.session_status_changed(&self.id, instance_tag);
        }

        if let Some(reply) = reply {
            self.send_encoded_to(host, rng, reply, Some(instance_tag))?;
        }
        Ok(())
    }

    fn send_encoded_to<R: RngCore + CryptoRng>(
        &mut self,
        host: &mut dyn Host,
        rng: &mut R,
        mut msg: Message,
        instance_tag: Option<u32>,
    ) -> Result<(), OtrError> {
        stamp_sender_tag(&mut msg, self.local_instance_tag);
        let (version, tags) = message_meta(&msg);
        let bytes = otr_wire::message::encode(&msg)?;
        let envelope = otr_wire::text::format_encoded(&bytes);
        let max_fragment_size = host.max_fragment_size(&self.id);
        let receiver = instance_tag.unwrap_or(tags.receiver);
        let fragments = otr_fragment::fragment(version.max(2), &envelope, self.local_instance_tag, receiver, max_fragment_size, rng)?;
        for frag in fragments {
            host.inject_message(&self.id, &frag)?;
        }
        Ok(())
    }
}

/// A host's whole set of conversations, one per [`SessionId`] (SPEC naming:
/// `otr_core::Account`/`otr_core::Conversation`).
#[derive(Default)]
pub struct Account {
    conversations: HashMap<SessionId, Conversation>,
}

impl Account {
    pub fn new() -> Self {
        Self { conversations: HashMap::new() }
    }

    /// Get or create the conversation for `id`, generating a fresh local
    /// instance tag the first time it's seen.
    pub fn conversation<R: RngCore>(&mut self, id: &SessionId, rng: &mut R) -> &mut Conversation {
        self.conversations
            .entry(id.clone())
            .or_insert_with(|| Conversation::new(id.clone(), generate_instance_tag(rng)))
    }

    pub fn remove(&mut self, id: &SessionId) {
        self.conversations.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_instance_tags_stay_above_reserved_range() {
        let mut rng = rand::rngs::OsRng;
        for _ in 0..64 {
            assert!(generate_instance_tag(&mut rng) >= 0x100);
        }
    }

    #[test]
    fn negotiate_prefers_v3_when_both_offered() {
        let policy = Policy::default();
        assert_eq!(negotiate_version(&[2, 3], &policy), Some(3));
        assert_eq!(negotiate_version(&[2], &policy), Some(2));
        assert_eq!(negotiate_version(&[], &policy), None);
    }
}
