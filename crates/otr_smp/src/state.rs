//! The SMP state machine's variants (§4.4's state table). As with the AKE,
//! a few fields beyond the table's abbreviated listing are carried because
//! a later step needs them to verify a proof (`g3a` in `Expect3`, so Bob can
//! check Alice's `Ra` proof against the base she committed to in SMP1).

use otr_crypto::BigUint;

pub enum SmpState {
    Expect1,
    /// Bob has received SMP1 and is waiting for the local application to
    /// supply its side of the secret.
    Expect1Answered { g2a: BigUint, g3a: BigUint },
    /// Alice, after sending SMP1. `secret` is carried from `start()` so the
    /// caller only supplies it once, at the start of the exchange.
    Expect2 { a2: BigUint, a3: BigUint, secret: BigUint },
    /// Bob, after sending SMP2.
    Expect3 { b3: BigUint, g2: BigUint, g3: BigUint, g3a: BigUint, pb: BigUint, qb: BigUint },
    /// Alice, after sending SMP3.
    Expect4 { a3: BigUint, g3b: BigUint, pa: BigUint, pb: BigUint, qa: BigUint, qb: BigUint },
    Succeeded,
    Failed,
    Cheated,
}

impl SmpState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SmpState::Succeeded | SmpState::Failed | SmpState::Cheated)
    }
}
