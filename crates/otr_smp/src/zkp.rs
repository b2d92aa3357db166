//! The Schnorr-like zero-knowledge proofs carried in every SMP message
//! (§4.4): `c = H(version_byte, t1, [t2])`, SHA-256 over the MPI encodings
//! of the commitment values, each proof step tagged with its own version
//! byte (1-8) so a transcript from one step can't be replayed into another.

use otr_crypto::hashes::{mpi_bytes, sha256};
use otr_crypto::BigUint;
use rand::RngCore;

use crate::error::SmpError;
use crate::group::{g1, modulus, order, random_exponent};

fn challenge(version: u8, ts: &[&BigUint]) -> BigUint {
    let mut buf = vec![version];
    for t in ts {
        buf.extend_from_slice(&mpi_bytes(t));
    }
    BigUint::from_bytes_be(&sha256(&buf)) % order()
}

/// A proof of knowledge of `x` such that `pub_value = base^x`.
pub struct DiscreteLogProof {
    pub c: BigUint,
    pub d: BigUint,
}

pub fn prove_discrete_log<R: RngCore>(rng: &mut R, version: u8, base: &BigUint, x: &BigUint) -> DiscreteLogProof {
    let r = random_exponent(rng);
    let t = base.modpow(&r, &modulus());
    let c = challenge(version, &[&t]);
    let d = sub_mod_q(&r, &mul_mod_q(x, &c));
    DiscreteLogProof { c, d }
}

pub fn verify_discrete_log(version: u8, base: &BigUint, pub_value: &BigUint, proof: &DiscreteLogProof) -> Result<(), SmpError> {
    let t = (base.modpow(&proof.d, &modulus()) * pub_value.modpow(&proof.c, &modulus())) % modulus();
    if challenge(version, &[&t]) == proof.c {
        Ok(())
    } else {
        Err(SmpError::ProofFailed)
    }
}

/// A proof of knowledge of `(r, s)` such that `p_val = g3^r` and
/// `q_val = g1^r * g2^s` (the "coordinates" proof behind `(Pb,Qb)`/`(Pa,Qa)`).
pub struct CoordsProof {
    pub c: BigUint,
    pub d_r: BigUint,
    pub d_s: BigUint,
}

#[allow(clippy::too_many_arguments)]
pub fn prove_coords<R: RngCore>(
    rng: &mut R,
    version: u8,
    g2: &BigUint,
    g3: &BigUint,
    r: &BigUint,
    s: &BigUint,
) -> CoordsProof {
    let rr = random_exponent(rng);
    let sr = random_exponent(rng);
    let t1 = g3.modpow(&rr, &modulus());
    let t2 = (g1().modpow(&rr, &modulus()) * g2.modpow(&sr, &modulus())) % modulus();
    let c = challenge(version, &[&t1, &t2]);
    let d_r = sub_mod_q(&rr, &mul_mod_q(r, &c));
    let d_s = sub_mod_q(&sr, &mul_mod_q(s, &c));
    CoordsProof { c, d_r, d_s }
}

#[allow(clippy::too_many_arguments)]
pub fn verify_coords(
    version: u8,
    g2: &BigUint,
    g3: &BigUint,
    p_val: &BigUint,
    q_val: &BigUint,
    proof: &CoordsProof,
) -> Result<(), SmpError> {
    let t1 = (g3.modpow(&proof.d_r, &modulus()) * p_val.modpow(&proof.c, &modulus())) % modulus();
    let t2 = (g1().modpow(&proof.d_r, &modulus()) * g2.modpow(&proof.d_s, &modulus()) * q_val.modpow(&proof.c, &modulus()))
        % modulus();
    if challenge(version, &[&t1, &t2]) == proof.c {
        Ok(())
    } else {
        Err(SmpError::ProofFailed)
    }
}

/// A proof of knowledge of `x3` such that `g3_own = g1^x3` AND
/// `r_val = other_base^x3` (the same exponent in two different bases; the
/// proof behind `Ra`/`Rb`).
pub struct EqualLogsProof {
    pub c: BigUint,
    pub d: BigUint,
}

pub fn prove_equal_logs<R: RngCore>(rng: &mut R, version: u8, other_base: &BigUint, x3: &BigUint) -> EqualLogsProof {
    let r = random_exponent(rng);
    let t1 = g1().modpow(&r, &modulus());
    let t2 = other_base.modpow(&r, &modulus());
    let c = challenge(version, &[&t1, &t2]);
    let d = sub_mod_q(&r, &mul_mod_q(x3, &c));
    EqualLogsProof { c, d }
}

pub fn verify_equal_logs(
    version: u8,
    g3_own: &BigUint,
    other_base: &BigUint,
    r_val: &BigUint,
    proof: &EqualLogsProof,
) -> Result<(), SmpError> {
    let t1 = (g1().modpow(&proof.d, &modulus()) * g3_own.modpow(&proof.c, &modulus())) % modulus();
    let t2 = (other_base.modpow(&proof.d, &modulus()) * r_val.modpow(&proof.c, &modulus())) % modulus();
    if challenge(version, &[&t1, &t2]) == proof.c {
        Ok(())
    } else {
        Err(SmpError::ProofFailed)
    }
}

fn mul_mod_q(a: &BigUint, b: &BigUint) -> BigUint {
    (a * b) % order()
}

fn sub_mod_q(a: &BigUint, b: &BigUint) -> BigUint {
    let q = order();
    let a = a % &q;
    let b = b % &q;
    if a >= b {
        a - b
    } else {
        &q - (b - a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn discrete_log_proof_roundtrips() {
        let x = random_exponent(&mut OsRng);
        let base = g1();
        let pub_value = base.modpow(&x, &modulus());
        let proof = prove_discrete_log(&mut OsRng, 1, &base, &x);
        verify_discrete_log(1, &base, &pub_value, &proof).unwrap();
    }

    #[test]
    fn discrete_log_proof_rejects_wrong_version() {
        let x = random_exponent(&mut OsRng);
        let base = g1();
        let pub_value = base.modpow(&x, &modulus());
        let proof = prove_discrete_log(&mut OsRng, 1, &base, &x);
        assert!(verify_discrete_log(2, &base, &pub_value, &proof).is_err());
    }

    #[test]
    fn coords_proof_roundtrips() {
        let g2 = g1().modpow(&random_exponent(&mut OsRng), &modulus());
        let g3 = g1().modpow(&random_exponent(&mut OsRng), &modulus());
        let r = random_exponent(&mut OsRng);
        let s = random_exponent(&mut OsRng);
        let p_val = g3.modpow(&r, &modulus());
        let q_val = (g1().modpow(&r, &modulus()) * g2.modpow(&s, &modulus())) % modulus();
        let proof = prove_coords(&mut OsRng, 5, &g2, &g3, &r, &s);
        verify_coords(5, &g2, &g3, &p_val, &q_val, &proof).unwrap();
    }

    #[test]
    fn equal_logs_proof_roundtrips() {
        let other_base = g1().modpow(&random_exponent(&mut OsRng), &modulus());
        let x3 = random_exponent(&mut OsRng);
        let g3_own = g1().modpow(&x3, &modulus());
        let r_val = other_base.modpow(&x3, &modulus());
        let proof = prove_equal_logs(&mut OsRng, 7, &other_base, &x3);
        verify_equal_logs(7, &g3_own, &other_base, &r_val, &proof).unwrap();
    }
}
