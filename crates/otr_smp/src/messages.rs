//! SMP1-SMP4 payloads (§4.4). On the wire these travel as TLV values inside
//! a DATA message (types 0x0002-0x0005, owned by `otr_session`); this module
//! only defines the MPI-list layout of each payload and its encode/decode.

use otr_crypto::BigUint;
use otr_wire::primitives::{Reader, Writer};

use crate::error::SmpError;
use crate::zkp::{CoordsProof, DiscreteLogProof, EqualLogsProof};

pub struct Smp1 {
    pub g2a: BigUint,
    pub g2a_proof: DiscreteLogProof,
    pub g3a: BigUint,
    pub g3a_proof: DiscreteLogProof,
}

pub struct Smp2 {
    pub g2b: BigUint,
    pub g2b_proof: DiscreteLogProof,
    pub g3b: BigUint,
    pub g3b_proof: DiscreteLogProof,
    pub pb: BigUint,
    pub qb: BigUint,
    pub pq_proof: CoordsProof,
}

pub struct Smp3 {
    pub pa: BigUint,
    pub qa: BigUint,
    pub pq_proof: CoordsProof,
    pub ra: BigUint,
    pub ra_proof: EqualLogsProof,
}

pub struct Smp4 {
    pub rb: BigUint,
    pub rb_proof: EqualLogsProof,
}

pub fn encode_smp1(msg: &Smp1) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_mpi(&msg.g2a);
    w.write_mpi(&msg.g2a_proof.c);
    w.write_mpi(&msg.g2a_proof.d);
    w.write_mpi(&msg.g3a);
    w.write_mpi(&msg.g3a_proof.c);
    w.write_mpi(&msg.g3a_proof.d);
    w.into_bytes()
}

pub fn decode_smp1(bytes: &[u8]) -> Result<Smp1, SmpError> {
    let mut r = Reader::new(bytes);
    let g2a = r.read_mpi()?;
    let g2a_proof = DiscreteLogProof { c: r.read_mpi()?, d: r.read_mpi()? };
    let g3a = r.read_mpi()?;
    let g3a_proof = DiscreteLogProof { c: r.read_mpi()?, d: r.read_mpi()? };
    r.expect_exhausted()?;
    Ok(Smp1 { g2a, g2a_proof, g3a, g3a_proof })
}

pub fn encode_smp2(msg: &Smp2) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_mpi(&msg.g2b);
    w.write_mpi(&msg.g2b_proof.c);
    w.write_mpi(&msg.g2b_proof.d);
    w.write_mpi(&msg.g3b);
    w.write_mpi(&msg.g3b_proof.c);
    w.write_mpi(&msg.g3b_proof.d);
    w.write_mpi(&msg.pb);
    w.write_mpi(&msg.qb);
    w.write_mpi(&msg.pq_proof.c);
    w.write_mpi(&msg.pq_proof.d_r);
    w.write_mpi(&msg.pq_proof.d_s);
    w.into_bytes()
}

pub fn decode_smp2(bytes: &[u8]) -> Result<Smp2, SmpError> {
    let mut r = Reader::new(bytes);
    let g2b = r.read_mpi()?;
    let g2b_proof = DiscreteLogProof { c: r.read_mpi()?, d: r.read_mpi()? };
    let g3b = r.read_mpi()?;
    let g3b_proof = DiscreteLogProof { c: r.read_mpi()?, d: r.read_mpi()? };
    let pb = r.read_mpi()?;
    let qb = r.read_mpi()?;
    let pq_proof = CoordsProof { c: r.read_mpi()?, d_r: r.read_mpi()?, d_s: r.read_mpi()? };
    r.expect_exhausted()?;
    Ok(Smp2 { g2b, g2b_proof, g3b, g3b_proof, pb, qb, pq_proof })
}

pub fn encode_smp3(msg: &Smp3) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_mpi(&msg.pa);
    w.write_mpi(&msg.qa);
    w.write_mpi(&msg.pq_proof.c);
    w.write_mpi(&msg.pq_proof.d_r);
    w.write_mpi(&msg.pq_proof.d_s);
    w.write_mpi(&msg.ra);
    w.write_mpi(&msg.ra_proof.c);
    w.write_mpi(&msg.ra_proof.d);
    w.into_bytes()
}

pub fn decode_smp3(bytes: &[u8]) -> Result<Smp3, SmpError> {
    let mut r = Reader::new(bytes);
    let pa = r.read_mpi()?;
    let qa = r.read_mpi()?;
    let pq_proof = CoordsProof { c: r.read_mpi()?, d_r: r.read_mpi()?, d_s: r.read_mpi()? };
    let ra = r.read_mpi()?;
    let ra_proof = EqualLogsProof { c: r.read_mpi()?, d: r.read_mpi()? };
    r.expect_exhausted()?;
    Ok(Smp3 { pa, qa, pq_proof, ra, ra_proof })
}

pub fn encode_smp4(msg: &Smp4) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_mpi(&msg.rb);
    w.write_mpi(&msg.rb_proof.c);
    w.write_mpi(&msg.rb_proof.d);
    w.into_bytes()
}

pub fn decode_smp4(bytes: &[u8]) -> Result<Smp4, SmpError> {
    let mut r = Reader::new(bytes);
    let rb = r.read_mpi()?;
    let rb_proof = EqualLogsProof { c: r.read_mpi()?, d: r.read_mpi()? };
    r.expect_exhausted()?;
    Ok(Smp4 { rb, rb_proof })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smp1_roundtrips() {
        let msg = Smp1 {
            g2a: BigUint::from(2u8),
            g2a_proof: DiscreteLogProof { c: BigUint::from(3u8), d: BigUint::from(4u8) },
            g3a: BigUint::from(5u8),
            g3a_proof: DiscreteLogProof { c: BigUint::from(6u8), d: BigUint::from(7u8) },
        };
        let bytes = encode_smp1(&msg);
        let decoded = decode_smp1(&bytes).unwrap();
        assert_eq!(decoded.g2a, msg.g2a);
        assert_eq!(decoded.g3a_proof.d, msg.g3a_proof.d);
    }

    #[test]
    fn smp4_roundtrips() {
        let msg = Smp4 { rb: BigUint::from(42u8), rb_proof: EqualLogsProof { c: BigUint::from(1u8), d: BigUint::from(2u8) } };
        let bytes = encode_smp4(&msg);
        let decoded = decode_smp4(&bytes).unwrap();
        assert_eq!(decoded.rb, msg.rb);
    }
}
