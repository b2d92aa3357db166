use std::collections::VecDeque;

use dsa::{Components, KeySize, SigningKey};
use otr_core::{Account, Host, HostError, OtrError, Policy, SessionId};
use otr_crypto::dsa_sig::{DsaKeyPair, DsaPublicKey};
use rand::rngs::OsRng;

/// An in-memory host: owns one party's long-term key, queues outgoing lines
/// for the other party to deliver, and records the notifications a real UI
/// would surface (verified fingerprints, SMP outcomes, status changes).
struct TestHost {
    key_pair_components: (DsaPublicKey, num_bigint_dig::BigUint),
    policy: Policy,
    max_fragment_size: usize,
    outbox: VecDeque<(SessionId, String)>,
    verified: Vec<Vec<u8>>,
    status_changes: Vec<u32>,
    multiple_instances_seen: bool,
}

impl TestHost {
    fn new(policy: Policy) -> Self {
        let components = Components::generate(&mut OsRng, KeySize::DSA_1024_160);
        let signing_key = SigningKey::generate(&mut OsRng, components);
        let public = DsaPublicKey {
            p: signing_key.verifying_key().components().p().clone(),
            q: signing_key.verifying_key().components().q().clone(),
            g: signing_key.verifying_key().components().g().clone(),
            y: signing_key.verifying_key().y().clone(),
        };
        Self {
            key_pair_components: (public, signing_key.x().clone()),
            policy,
            max_fragment_size: usize::MAX,
            outbox: VecDeque::new(),
            verified: Vec::new(),
            status_changes: Vec::new(),
            multiple_instances_seen: false,
        }
    }
}

impl Host for TestHost {
    fn inject_message(&mut self, session: &SessionId, text: &str) -> Result<(), HostError> {
        self.outbox.push_back((session.clone(), text.to_string()));
        Ok(())
    }

    fn get_local_key_pair(&mut self, _session: &SessionId) -> Result<DsaKeyPair, HostError> {
        let (public, x) = &self.key_pair_components;
        DsaKeyPair::from_components(public, x.clone()).map_err(|e| HostError(e.to_string()))
    }

    fn get_session_policy(&mut self, _session: &SessionId) -> Result<Policy, HostError> {
        Ok(self.policy)
    }

    fn max_fragment_size(&mut self, _session: &SessionId) -> usize {
        self.max_fragment_size
    }

    fn verify(&mut self, _session: &SessionId, fingerprint: &[u8]) {
        self.verified.push(fingerprint.to_vec());
    }

    fn session_status_changed(&mut self, _session: &SessionId, instance: u32) {
        self.status_changes.push(instance);
    }

    fn multiple_instances_detected(&mut self, _session: &SessionId) {
        self.multiple_instances_seen = true;
    }
}

fn alice_id() -> SessionId {
    SessionId { local_account: "alice@example.org".into(), remote_account: "bob@example.org".into(), protocol: "xmpp".into() }
}

fn bob_id() -> SessionId {
    SessionId { local_account: "bob@example.org".into(), remote_account: "alice@example.org".into(), protocol: "xmpp".into() }
}

/// Pumps every queued outbound line from `from_host`'s outbox through
/// `to_account`/`to_host`, returning whatever plaintext bodies came back out
/// (used by callers that want to assert on a delivered message).
fn pump<R: rand::RngCore + rand::CryptoRng>(
    from_host: &mut TestHost,
    to_account: &mut Account,
    to_host: &mut TestHost,
    to_id: &SessionId,
    rng: &mut R,
) -> Vec<String> {
    let mut delivered = Vec::new();
    while let Some((_, line)) = from_host.outbox.pop_front() {
        let convo = to_account.conversation(to_id, rng);
        if let Some(text) = convo.receive_line(to_host, rng, &line).unwrap() {
            delivered.push(text);
        }
    }
    delivered
}

/// Runs the AKE to completion between two freshly-created conversations by
/// repeatedly pumping each side's outbox until both go quiet (§8 S1).
fn establish<R: rand::RngCore + rand::CryptoRng>(
    alice_account: &mut Account,
    alice_host: &mut TestHost,
    bob_account: &mut Account,
    bob_host: &mut TestHost,
    rng: &mut R,
) {
    alice_account.conversation(&alice_id(), rng).start_session(alice_host).unwrap();
    for _ in 0..8 {
        pump(alice_host, bob_account, bob_host, &bob_id(), rng);
        pump(bob_host, alice_account, alice_host, &alice_id(), rng);
        if alice_host.outbox.is_empty() && bob_host.outbox.is_empty() {
            break;
        }
    }
}

#[test]
fn s1_query_start_establishes_an_encrypted_session() {
    let mut rng = OsRng;
    let mut alice_account = Account::new();
    let mut bob_account = Account::new();
    let mut alice_host = TestHost::new(Policy::default());
    let mut bob_host = TestHost::new(Policy::default());

    establish(&mut alice_account, &mut alice_host, &mut bob_account, &mut bob_host, &mut rng);

    assert!(!alice_host.status_changes.is_empty());
    assert!(!bob_host.status_changes.is_empty());

    let alice_convo = alice_account.conversation(&alice_id(), &mut rng);
    alice_convo.send_message(&mut alice_host, &mut rng, "hello bob").unwrap();
    let delivered = pump(&mut alice_host, &mut bob_account, &mut bob_host, &bob_id(), &mut rng);
    assert_eq!(delivered, vec!["hello bob".to_string()]);
}

#[test]
fn s3_simultaneous_dh_commit_tie_break_still_establishes() {
    let mut rng = OsRng;
    let mut alice_account = Account::new();
    let mut bob_account = Account::new();
    // v2 has no instance tags, so both sides' commits route straight into
    // their own master `AkeEngine` rather than a fresh per-instance
    // sub-session — the same engine instance that is already `AwaitingDhKey`
    // from having sent its own commit, which is what actually exercises the
    // §4.3 tie-break branch (v3's per-remote-instance routing would instead
    // hand the peer's commit to a brand-new sub-session in state `None`).
    let v2_only = Policy { allow_v3: false, ..Policy::default() };
    let mut alice_host = TestHost::new(v2_only);
    let mut bob_host = TestHost::new(v2_only);

    // Both sides start before either has seen a single byte from the other,
    // so each replies to the other's query with its own independently
    // generated DH-Commit — neither has a chance to adopt the other's
    // handshake first, forcing the §4.3 tie-break the moment the two
    // DH-Commits cross in flight.
    alice_account.conversation(&alice_id(), &mut rng).start_session(&mut alice_host).unwrap();
    bob_account.conversation(&bob_id(), &mut rng).start_session(&mut bob_host).unwrap();

    for _ in 0..8 {
        pump(&mut alice_host, &mut bob_account, &mut bob_host, &bob_id(), &mut rng);
        pump(&mut bob_host, &mut alice_account, &mut alice_host, &alice_id(), &mut rng);
        if alice_host.outbox.is_empty() && bob_host.outbox.is_empty() {
            break;
        }
    }

    assert!(!alice_host.status_changes.is_empty());
    assert!(!bob_host.status_changes.is_empty());

    let alice_convo = alice_account.conversation(&alice_id(), &mut rng);
    alice_convo.send_message(&mut alice_host, &mut rng, "hello after the race").unwrap();
    let delivered = pump(&mut alice_host, &mut bob_account, &mut bob_host, &bob_id(), &mut rng);
    assert_eq!(delivered, vec!["hello after the race".to_string()]);
}

#[test]
fn s2_fragmented_messages_reassemble() {
    let mut rng = OsRng;
    let mut alice_account = Account::new();
    let mut bob_account = Account::new();
    let mut alice_host = TestHost::new(Policy::default());
    let mut bob_host = TestHost::new(Policy::default());

    establish(&mut alice_account, &mut alice_host, &mut bob_account, &mut bob_host, &mut rng);
    alice_host.outbox.clear();
    bob_host.outbox.clear();

    // Force Alice's next encode through a transport that only carries
    // 64-byte lines, so the DATA message must be fragmented.
    alice_host.max_fragment_size = 64;
    let alice_convo = alice_account.conversation(&alice_id(), &mut rng);
    alice_convo.send_message(&mut alice_host, &mut rng, "a fragmented greeting from alice to bob").unwrap();
    assert!(alice_host.outbox.len() > 1, "a 64-byte cap should force more than one fragment");

    let delivered = pump(&mut alice_host, &mut bob_account, &mut bob_host, &bob_id(), &mut rng);
    assert_eq!(delivered, vec!["a fragmented greeting from alice to bob".to_string()]);
}

#[test]
fn s4_smp_success_verifies_the_peer_fingerprint() {
    let mut rng = OsRng;
    let mut alice_account = Account::new();
    let mut bob_account = Account::new();
    let mut alice_host = TestHost::new(Policy::default());
    let mut bob_host = TestHost::new(Policy::default());

    establish(&mut alice_account, &mut alice_host, &mut bob_account, &mut bob_host, &mut rng);

    alice_account.conversation(&alice_id(), &mut rng).init_smp(&mut alice_host, &mut rng, b"shared-secret").unwrap();
    for _ in 0..8 {
        pump(&mut alice_host, &mut bob_account, &mut bob_host, &bob_id(), &mut rng);
        pump(&mut bob_host, &mut alice_account, &mut alice_host, &alice_id(), &mut rng);
        if alice_host.outbox.is_empty() && bob_host.outbox.is_empty() {
            break;
        }
        if bob_host.outbox.is_empty() {
            bob_account.conversation(&bob_id(), &mut rng).respond_smp(&mut bob_host, &mut rng, b"shared-secret").ok();
        }
    }

    assert!(!alice_host.verified.is_empty() || !bob_host.verified.is_empty());
}

#[test]
fn s5_smp_with_mismatched_secrets_fails_without_crashing() {
    let mut rng = OsRng;
    let mut alice_account = Account::new();
    let mut bob_account = Account::new();
    let mut alice_host = TestHost::new(Policy::default());
    let mut bob_host = TestHost::new(Policy::default());

    establish(&mut alice_account, &mut alice_host, &mut bob_account, &mut bob_host, &mut rng);

    alice_account.conversation(&alice_id(), &mut rng).init_smp(&mut alice_host, &mut rng, b"alice-secret").unwrap();
    for _ in 0..8 {
        pump(&mut alice_host, &mut bob_account, &mut bob_host, &bob_id(), &mut rng);
        pump(&mut bob_host, &mut alice_account, &mut alice_host, &alice_id(), &mut rng);
        if alice_host.outbox.is_empty() && bob_host.outbox.is_empty() {
            break;
        }
        if bob_host.outbox.is_empty() {
            bob_account.conversation(&bob_id(), &mut rng).respond_smp(&mut bob_host, &mut rng, b"bob-secret").ok();
        }
    }

    assert!(alice_host.verified.is_empty());
    assert!(bob_host.verified.is_empty());
}

#[test]
fn s6_two_remote_instances_get_independent_sub_sessions() {
    let mut rng = OsRng;
    let mut alice_account = Account::new();
    let mut alice_host = TestHost::new(Policy::default());

    // Bob is logged in from two clients; both see Alice's single broadcast
    // query (receiver tag zero) and each reply with their own DH-Commit
    // under their own instance tag, so Alice's one `Conversation` ends up
    // routing to two independent sub-sessions (§4.6).
    let mut bob1_account = Account::new();
    let mut bob1_host = TestHost::new(Policy::default());
    let mut bob2_account = Account::new();
    let mut bob2_host = TestHost::new(Policy::default());

    alice_account.conversation(&alice_id(), &mut rng).start_session(&mut alice_host).unwrap();

    for _ in 0..8 {
        let alice_lines: Vec<String> = alice_host.outbox.drain(..).map(|(_, line)| line).collect();
        for line in &alice_lines {
            bob1_account.conversation(&bob_id(), &mut rng).receive_line(&mut bob1_host, &mut rng, line).ok();
            bob2_account.conversation(&bob_id(), &mut rng).receive_line(&mut bob2_host, &mut rng, line).ok();
        }
        pump(&mut bob1_host, &mut alice_account, &mut alice_host, &alice_id(), &mut rng);
        pump(&mut bob2_host, &mut alice_account, &mut alice_host, &alice_id(), &mut rng);
        if alice_host.outbox.is_empty() && bob1_host.outbox.is_empty() && bob2_host.outbox.is_empty() {
            break;
        }
    }

    assert!(alice_host.multiple_instances_seen);
    assert!(alice_host.status_changes.len() >= 2);
}

#[test]
fn policy_disabling_all_versions_rejects_start_session() {
    let mut rng = OsRng;
    let mut account = Account::new();
    let mut host = TestHost::new(Policy { allow_v2: false, allow_v3: false, ..Policy::default() });
    let convo = account.conversation(&alice_id(), &mut rng);
    let err = convo.start_session(&mut host).unwrap_err();
    assert!(matches!(err, OtrError::Policy(_)));
}

#[test]
fn plaintext_with_no_query_tag_passes_through_unchanged() {
    let mut rng = OsRng;
    let mut account = Account::new();
    let mut host = TestHost::new(Policy::default());
    let convo = account.conversation(&bob_id(), &mut rng);
    let out = convo.receive_line(&mut host, &mut rng, "just a plain chat line").unwrap();
    assert_eq!(out, Some("just a plain chat line".to_string()));
}

