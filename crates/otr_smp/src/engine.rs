//! The v3 SMP state machine (§4.4): `start`/`answer`/`on_smpN`, one method
//! per table row, mirroring the AKE engine's `std::mem::replace`-then-match
//! shape (`otr_ake::engine`).

use otr_crypto::BigUint;
use rand::RngCore;
use tracing::{info, warn};

use crate::error::SmpError;
use crate::group::{check_group_element, divide, g1, modulus, random_exponent};
use crate::messages::{Smp1, Smp2, Smp3, Smp4};
use crate::state::SmpState;
use crate::zkp::{prove_coords, prove_discrete_log, prove_equal_logs, verify_coords, verify_discrete_log, verify_equal_logs};

// Proof-step version bytes, one per §4.4's "1-8".
const V_G2A: u8 = 1;
const V_G3A: u8 = 2;
const V_G2B: u8 = 3;
const V_G3B: u8 = 4;
const V_PQ_BOB: u8 = 5;
const V_PQ_ALICE: u8 = 6;
const V_RA: u8 = 7;
const V_RB: u8 = 8;

/// TLV types carrying SMP payloads (§4.5 "TLVs carried inside a DATA message").
pub const TLV_SMP1: u16 = 0x0002;
pub const TLV_SMP2: u16 = 0x0003;
pub const TLV_SMP3: u16 = 0x0004;
pub const TLV_SMP4: u16 = 0x0005;
pub const TLV_SMP_ABORT: u16 = 0x0006;

pub enum SmpOutput {
    /// Send this TLV to the peer.
    SendTlv { tlv_type: u16, payload: Vec<u8> },
    /// SMP1 was received; the host must call `answer` with its own secret.
    AwaitSecret,
    /// The comparison finished; the dispatcher should verify/unverify the
    /// peer's fingerprint accordingly.
    Finished(SmpResult),
    /// Nothing to do (duplicate or otherwise ignorable message).
    Nothing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmpResult {
    Succeeded,
    Failed,
    Cheated,
}

pub struct SmpEngine {
    state: SmpState,
}

impl Default for SmpEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SmpEngine {
    pub fn new() -> Self {
        Self { state: SmpState::Expect1 }
    }

    pub fn state(&self) -> &SmpState {
        &self.state
    }

    /// §4.4 "Receiving an abort resets" / local `abort_smp()`.
    pub fn abort(&mut self) {
        self.state = SmpState::Expect1;
    }

    /// Alice: `Expect1` + local `start(secret)` -> SMP1, `Expect2(a2,a3)`.
    pub fn start<R: RngCore>(&mut self, secret: &BigUint, rng: &mut R) -> Result<SmpOutput, SmpError> {
        if !matches!(self.state, SmpState::Expect1) {
            return Err(SmpError::UnexpectedMessage);
        }
        let a2 = random_exponent(rng);
        let a3 = random_exponent(rng);
        let g2a = g1().modpow(&a2, &modulus());
        let g3a = g1().modpow(&a3, &modulus());
        let g2a_proof = prove_discrete_log(rng, V_G2A, &g1(), &a2);
        let g3a_proof = prove_discrete_log(rng, V_G3A, &g1(), &a3);

        let payload = crate::messages::encode_smp1(&Smp1 { g2a, g3a, g2a_proof, g3a_proof });
        self.state = SmpState::Expect2 { a2, a3, secret: secret.clone() };
        Ok(SmpOutput::SendTlv { tlv_type: TLV_SMP1, payload })
    }

    /// Bob: `Expect1` + receive SMP1 -> `Expect1-answered`.
    pub fn on_smp1(&mut self, payload: &[u8]) -> Result<SmpOutput, SmpError> {
        if !matches!(self.state, SmpState::Expect1) {
            self.abort();
            return Ok(SmpOutput::SendTlv { tlv_type: TLV_SMP_ABORT, payload: Vec::new() });
        }
        let msg = crate::messages::decode_smp1(payload).map_err(|e| {
            self.abort();
            e
        })?;
        if let Err(e) = check_group_element(&msg.g2a).and_then(|_| check_group_element(&msg.g3a)) {
            self.abort();
            return Err(e);
        }
        if verify_discrete_log(V_G2A, &g1(), &msg.g2a, &msg.g2a_proof).is_err()
            || verify_discrete_log(V_G3A, &g1(), &msg.g3a, &msg.g3a_proof).is_err()
        {
            warn!("SMP1 discrete-log proof failed to verify, marking session cheated");
            self.state = SmpState::Cheated;
            return Ok(SmpOutput::SendTlv { tlv_type: TLV_SMP_ABORT, payload: Vec::new() });
        }
        self.state = SmpState::Expect1Answered { g2a: msg.g2a, g3a: msg.g3a };
        Ok(SmpOutput::AwaitSecret)
    }

    /// Bob: `Expect1-answered` + local `answer(secret)` -> SMP2, `Expect3(...)`.
    pub fn answer<R: RngCore>(&mut self, secret: &BigUint, rng: &mut R) -> Result<SmpOutput, SmpError> {
        let (g2a, g3a) = match std::mem::replace(&mut self.state, SmpState::Expect1) {
            SmpState::Expect1Answered { g2a, g3a } => (g2a, g3a),
            other => {
                self.state = other;
                return Err(SmpError::UnexpectedMessage);
            }
        };

        let b2 = random_exponent(rng);
        let b3 = random_exponent(rng);
        let g2b = g1().modpow(&b2, &modulus());
        let g3b = g1().modpow(&b3, &modulus());
        let g2b_proof = prove_discrete_log(rng, V_G2B, &g1(), &b2);
        let g3b_proof = prove_discrete_log(rng, V_G3B, &g1(), &b3);

        let g2 = g2a.modpow(&b2, &modulus());
        let g3 = g3a.modpow(&b3, &modulus());
        let r = random_exponent(rng);
        let pb = g3.modpow(&r, &modulus());
        let qb = (g1().modpow(&r, &modulus()) * g2.modpow(secret, &modulus())) % modulus();
        let pq_proof = prove_coords(rng, V_PQ_BOB, &g2, &g3, &r, secret);

        let payload = crate::messages::encode_smp2(&Smp2 {
            g2b,
            g2b_proof,
            g3b,
            g3b_proof,
            pb: pb.clone(),
            qb: qb.clone(),
            pq_proof,
        });
        self.state = SmpState::Expect3 { b3, g2, g3, g3a, pb, qb };
        Ok(SmpOutput::SendTlv { tlv_type: TLV_SMP2, payload })
    }

    /// Alice: `Expect2` + receive SMP2 -> SMP3, `Expect4(...)`.
    pub fn on_smp2<R: RngCore>(&mut self, payload: &[u8], rng: &mut R) -> Result<SmpOutput, SmpError> {
        let (a2, a3, secret) = match std::mem::replace(&mut self.state, SmpState::Expect1) {
            SmpState::Expect2 { a2, a3, secret } => (a2, a3, secret),
            other => {
                self.state = other;
                self.abort();
                return Ok(SmpOutput::SendTlv { tlv_type: TLV_SMP_ABORT, payload: Vec::new() });
            }
        };
        let msg = match crate::messages::decode_smp2(payload) {
            Ok(m) => m,
            Err(e) => {
                self.abort();
                return Err(e);
            }
        };
        for g in [&msg.g2b, &msg.g3b, &msg.pb, &msg.qb] {
            if check_group_element(g).is_err() {
                self.abort();
                return Err(SmpError::RangeCheck);
            }
        }

        let g2 = msg.g2b.modpow(&a2, &modulus());
        let g3 = msg.g3b.modpow(&a3, &modulus());

        let proofs_ok = verify_discrete_log(V_G2B, &g1(), &msg.g2b, &msg.g2b_proof).is_ok()
            && verify_discrete_log(V_G3B, &g1(), &msg.g3b, &msg.g3b_proof).is_ok()
            && verify_coords(V_PQ_BOB, &g2, &g3, &msg.pb, &msg.qb, &msg.pq_proof).is_ok();
        if !proofs_ok {
            self.state = SmpState::Cheated;
            return Ok(SmpOutput::SendTlv { tlv_type: TLV_SMP_ABORT, payload: Vec::new() });
        }

        let s = random_exponent(rng);
        let pa = g3.modpow(&s, &modulus());
        let qa = (g1().modpow(&s, &modulus()) * g2.modpow(&secret, &modulus())) % modulus();
        let pq_proof = prove_coords(rng, V_PQ_ALICE, &g2, &g3, &s, &secret);

        let h = divide(&qa, &msg.qb);
        let ra = h.modpow(&a3, &modulus());
        let ra_proof = prove_equal_logs(rng, V_RA, &h, &a3);

        let payload = crate::messages::encode_smp3(&Smp3 {
            pa: pa.clone(),
            qa: qa.clone(),
            pq_proof,
            ra,
            ra_proof,
        });
        self.state = SmpState::Expect4 { a3, g3b: msg.g3b, pa, pb: msg.pb, qa, qb: msg.qb };
        Ok(SmpOutput::SendTlv { tlv_type: TLV_SMP3, payload })
    }

    /// Bob: `Expect3` + receive SMP3 -> SMP4; mark Succeeded/Failed, `Expect1`.
    pub fn on_smp3<R: RngCore>(&mut self, payload: &[u8], rng: &mut R) -> Result<SmpOutput, SmpError> {
        let (b3, g2, g3, g3a, pb, qb) = match std::mem::replace(&mut self.state, SmpState::Expect1) {
            SmpState::Expect3 { b3, g2, g3, g3a, pb, qb } => (b3, g2, g3, g3a, pb, qb),
            other => {
                self.state = other;
                self.abort();
                return Ok(SmpOutput::SendTlv { tlv_type: TLV_SMP_ABORT, payload: Vec::new() });
            }
        };
        let msg = match crate::messages::decode_smp3(payload) {
            Ok(m) => m,
            Err(e) => {
                self.abort();
                return Err(e);
            }
        };
        for g in [&msg.pa, &msg.qa, &msg.ra] {
            if check_group_element(g).is_err() {
                self.abort();
                return Err(SmpError::RangeCheck);
            }
        }

        let h = divide(&msg.qa, &qb);
        let proofs_ok = verify_coords(V_PQ_ALICE, &g2, &g3, &msg.pa, &msg.qa, &msg.pq_proof).is_ok()
            && verify_equal_logs(V_RA, &g3a, &h, &msg.ra, &msg.ra_proof).is_ok();
        if !proofs_ok {
            self.state = SmpState::Cheated;
            return Ok(SmpOutput::SendTlv { tlv_type: TLV_SMP_ABORT, payload: Vec::new() });
        }

        let rab = msg.ra.modpow(&b3, &modulus());
        let matches = rab == divide(&msg.pa, &pb);

        let rb = h.modpow(&b3, &modulus());
        let rb_proof = prove_equal_logs(rng, V_RB, &h, &b3);
        let smp4_payload = crate::messages::encode_smp4(&Smp4 { rb, rb_proof });

        info!(matches, "SMP comparison complete on responder side");
        self.state = if matches { SmpState::Succeeded } else { SmpState::Failed };
        Ok(SmpOutput::SendTlv { tlv_type: TLV_SMP4, payload: smp4_payload })
    }

    /// Alice: `Expect4` + receive SMP4 -> mark Succeeded/Failed, `Expect1`.
    pub fn on_smp4(&mut self, payload: &[u8]) -> Result<SmpOutput, SmpError> {
        let (a3, g3b, pa, pb, qa, qb) = match std::mem::replace(&mut self.state, SmpState::Expect1) {
            SmpState::Expect4 { a3, g3b, pa, pb, qa, qb } => (a3, g3b, pa, pb, qa, qb),
            other => {
                self.state = other;
                self.abort();
                return Ok(SmpOutput::SendTlv { tlv_type: TLV_SMP_ABORT, payload: Vec::new() });
            }
        };
        let msg = match crate::messages::decode_smp4(payload) {
            Ok(m) => m,
            Err(e) => {
                self.abort();
                return Err(e);
            }
        };
        if check_group_element(&msg.rb).is_err() {
            self.abort();
            return Err(SmpError::RangeCheck);
        }

        let h = divide(&qa, &qb);
        if verify_equal_logs(V_RB, &g3b, &h, &msg.rb, &msg.rb_proof).is_err() {
            warn!("SMP4 equal-logs proof failed to verify, marking session cheated");
            self.state = SmpState::Cheated;
            return Ok(SmpOutput::Finished(SmpResult::Cheated));
        }

        let rab = msg.rb.modpow(&a3, &modulus());
        let matches = rab == divide(&pa, &pb);
        info!(matches, "SMP comparison complete on initiator side");
        self.state = if matches { SmpState::Succeeded } else { SmpState::Failed };
        Ok(SmpOutput::Finished(if matches { SmpResult::Succeeded } else { SmpResult::Failed }))
    }

    /// The final result once the state machine reaches a terminal state.
    pub fn result(&self) -> Option<SmpResult> {
        match self.state {
            SmpState::Succeeded => Some(SmpResult::Succeeded),
            SmpState::Failed => Some(SmpResult::Failed),
            SmpState::Cheated => Some(SmpResult::Cheated),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::derive_secret;
    use rand::rngs::OsRng;

    #[test]
    fn full_dual_run_matches_when_secrets_agree() {
        let mut alice = SmpEngine::new();
        let mut bob = SmpEngine::new();
        let ssid = [1u8; 8];
        let x = derive_secret(b"alice-fp", b"bob-fp", &ssid, b"swordfish");
        let y = derive_secret(b"alice-fp", b"bob-fp", &ssid, b"swordfish");

        let SmpOutput::SendTlv { payload: smp1, .. } = alice.start(&x, &mut OsRng).unwrap() else { panic!() };
        let SmpOutput::AwaitSecret = bob.on_smp1(&smp1).unwrap() else { panic!() };
        let SmpOutput::SendTlv { payload: smp2, .. } = bob.answer(&y, &mut OsRng).unwrap() else { panic!() };
        let SmpOutput::SendTlv { payload: smp3, .. } = alice.on_smp2(&smp2, &mut OsRng).unwrap() else { panic!() };
        let SmpOutput::SendTlv { payload: smp4, .. } = bob.on_smp3(&smp3, &mut OsRng).unwrap() else { panic!() };
        let SmpOutput::Finished(alice_result) = alice.on_smp4(&smp4).unwrap() else { panic!() };

        assert_eq!(alice_result, SmpResult::Succeeded);
        assert_eq!(bob.result(), Some(SmpResult::Succeeded));
    }

    #[test]
    fn dual_run_fails_when_secrets_differ() {
        let mut alice = SmpEngine::new();
        let mut bob = SmpEngine::new();
        let ssid = [2u8; 8];
        let x = derive_secret(b"alice-fp", b"bob-fp", &ssid, b"swordfish");
        let y = derive_secret(b"alice-fp", b"bob-fp", &ssid, b"password");

        let SmpOutput::SendTlv { payload: smp1, .. } = alice.start(&x, &mut OsRng).unwrap() else { panic!() };
        bob.on_smp1(&smp1).unwrap();
        let SmpOutput::SendTlv { payload: smp2, .. } = bob.answer(&y, &mut OsRng).unwrap() else { panic!() };
        let SmpOutput::SendTlv { payload: smp3, .. } = alice.on_smp2(&smp2, &mut OsRng).unwrap() else { panic!() };
        let SmpOutput::SendTlv { payload: smp4, .. } = bob.on_smp3(&smp3, &mut OsRng).unwrap() else { panic!() };
        let SmpOutput::Finished(alice_result) = alice.on_smp4(&smp4).unwrap() else { panic!() };

        assert_eq!(alice_result, SmpResult::Failed);
        assert_eq!(bob.result(), Some(SmpResult::Failed));
    }

    #[test]
    fn restarting_after_abort_is_tolerated() {
        let mut alice = SmpEngine::new();
        alice.abort();
        assert!(alice.start(&BigUint::from(1u8), &mut OsRng).is_ok());
    }
}
