//! `DSA-PUBKEY` (§4.1): `SHORT type=0 | MPI p | MPI q | MPI g | MPI y`.

use otr_crypto::dsa_sig::DsaPublicKey;

use crate::error::WireError;
use crate::primitives::{Reader, Writer};

const DSA_PUBKEY_TYPE: u16 = 0;

pub fn read_dsa_pubkey(r: &mut Reader) -> Result<DsaPublicKey, WireError> {
    let kind = r.read_short()?;
    if kind != DSA_PUBKEY_TYPE {
        return Err(WireError::Malformed(format!(
            "unsupported public key type {kind}"
        )));
    }
    let p = r.read_mpi()?;
    let q = r.read_mpi()?;
    let g = r.read_mpi()?;
    let y = r.read_mpi()?;
    Ok(DsaPublicKey { p, q, g, y })
}

pub fn write_dsa_pubkey(w: &mut Writer, key: &DsaPublicKey) {
    w.write_short(DSA_PUBKEY_TYPE);
    w.write_mpi(&key.p);
    w.write_mpi(&key.q);
    w.write_mpi(&key.g);
    w.write_mpi(&key.y);
}
