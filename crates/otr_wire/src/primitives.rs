//! Binary primitive reader/writer for the types named in §4.1: BYTE, SHORT,
//! INT, LONG, DATA, MPI, CTR, MAC, MAC-OTR4, DH-PUBKEY, Ed448-POINT,
//! Ed448-SCALAR, Ed448-SIG, SSID, FINGERPRINT, NONCE. DSA-PUBKEY lives in
//! `dsa.rs` since it composes several of these primitives.

use byteorder::{BigEndian, ByteOrder};
use otr_crypto::BigUint;

use crate::error::WireError;

/// Maximum decoded DATA length: `2^31 - 8` (§4.1).
pub const MAX_DATA_LEN: u32 = (1u32 << 31) - 8;

pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if self.pos + n > self.buf.len() {
            return Err(WireError::UnexpectedEof);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_byte(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_short(&mut self) -> Result<u16, WireError> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    pub fn read_int(&mut self) -> Result<u32, WireError> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    pub fn read_long(&mut self) -> Result<u64, WireError> {
        Ok(BigEndian::read_u64(self.take(8)?))
    }

    pub fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let slice = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    pub fn read_data(&mut self) -> Result<Vec<u8>, WireError> {
        let len = self.read_int()?;
        if len > MAX_DATA_LEN {
            return Err(WireError::LengthTooLarge(len));
        }
        Ok(self.take(len as usize)?.to_vec())
    }

    pub fn read_mpi(&mut self) -> Result<BigUint, WireError> {
        let len = self.read_int()?;
        if len > MAX_DATA_LEN {
            return Err(WireError::LengthTooLarge(len));
        }
        let bytes = self.take(len as usize)?;
        Ok(BigUint::from_bytes_be(bytes))
    }

    /// `DH-PUBKEY` is an MPI (§4.1).
    pub fn read_dh_pubkey(&mut self) -> Result<BigUint, WireError> {
        self.read_mpi()
    }

    pub fn read_ctr(&mut self) -> Result<[u8; 8], WireError> {
        self.read_fixed::<8>()
    }

    pub fn read_mac(&mut self) -> Result<[u8; 20], WireError> {
        self.read_fixed::<20>()
    }

    pub fn read_mac4(&mut self) -> Result<[u8; 64], WireError> {
        self.read_fixed::<64>()
    }

    pub fn read_ed448_point(&mut self) -> Result<[u8; 57], WireError> {
        self.read_fixed::<57>()
    }

    pub fn read_ed448_scalar(&mut self) -> Result<[u8; 57], WireError> {
        self.read_fixed::<57>()
    }

    pub fn read_ed448_sig(&mut self) -> Result<[u8; 114], WireError> {
        self.read_fixed::<114>()
    }

    pub fn read_ssid(&mut self) -> Result<[u8; 8], WireError> {
        self.read_fixed::<8>()
    }

    pub fn read_nonce(&mut self) -> Result<[u8; 24], WireError> {
        self.read_fixed::<24>()
    }

    /// `FINGERPRINT` is 20 bytes for v2/v3, 56 bytes for v4 (§4.1).
    pub fn read_fingerprint_v3(&mut self) -> Result<[u8; 20], WireError> {
        self.read_fixed::<20>()
    }

    pub fn read_fingerprint_v4(&mut self) -> Result<[u8; 56], WireError> {
        self.read_fixed::<56>()
    }

    /// Fail if any bytes remain — used at the outermost level of a message
    /// that must consume the entire buffer (§4.1 "trailing bytes ...
    /// tolerated at outermost level" is the caller's choice; this helper
    /// makes that check explicit where callers want it).
    pub fn expect_exhausted(&self) -> Result<(), WireError> {
        if self.pos != self.buf.len() {
            return Err(WireError::TrailingBytes);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_byte(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn write_short(&mut self, v: u16) -> &mut Self {
        let mut tmp = [0u8; 2];
        BigEndian::write_u16(&mut tmp, v);
        self.buf.extend_from_slice(&tmp);
        self
    }

    pub fn write_int(&mut self, v: u32) -> &mut Self {
        let mut tmp = [0u8; 4];
        BigEndian::write_u32(&mut tmp, v);
        self.buf.extend_from_slice(&tmp);
        self
    }

    pub fn write_long(&mut self, v: u64) -> &mut Self {
        let mut tmp = [0u8; 8];
        BigEndian::write_u64(&mut tmp, v);
        self.buf.extend_from_slice(&tmp);
        self
    }

    pub fn write_fixed(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn write_data(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_int(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn write_mpi(&mut self, n: &BigUint) -> &mut Self {
        let magnitude = n.to_bytes_be();
        let magnitude: &[u8] = if magnitude == [0u8] { &[] } else { &magnitude };
        self.write_int(magnitude.len() as u32);
        self.buf.extend_from_slice(magnitude);
        self
    }

    pub fn write_dh_pubkey(&mut self, n: &BigUint) -> &mut Self {
        self.write_mpi(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_roundtrips() {
        let mut w = Writer::new();
        w.write_int(0xDEADBEEF);
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_int().unwrap(), 0xDEADBEEF);
        r.expect_exhausted().unwrap();
    }

    #[test]
    fn mpi_roundtrips_including_zero() {
        for n in [0u64, 1, 255, 256, 0xFFFF_FFFF] {
            let mut w = Writer::new();
            w.write_mpi(&BigUint::from(n));
            let bytes = w.into_bytes();
            let mut r = Reader::new(&bytes);
            assert_eq!(r.read_mpi().unwrap(), BigUint::from(n));
        }
    }

    #[test]
    fn data_roundtrips() {
        let payload = b"off the record".to_vec();
        let mut w = Writer::new();
        w.write_data(&payload);
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_data().unwrap(), payload);
    }

    #[test]
    fn data_length_too_large_is_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(MAX_DATA_LEN + 1).to_be_bytes());
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_data().unwrap_err(), WireError::LengthTooLarge(MAX_DATA_LEN + 1));
    }

    #[test]
    fn truncated_input_is_unexpected_eof() {
        let bytes = [0u8; 2];
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_int().unwrap_err(), WireError::UnexpectedEof);
    }
}
