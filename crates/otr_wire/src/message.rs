//! The encoded-message tagged union (§4.1, wire byte layouts in §6).
//!
//! `[tags]_v3` in §6 means the sender/receiver instance tags are present for
//! protocol version 3 and above; OTRv2 messages carry no instance tags.

use otr_crypto::dsa_sig::DsaPublicKey;
use otr_crypto::ed448::RingSignature;
use otr_crypto::BigUint;

use crate::dsa::{read_dsa_pubkey, write_dsa_pubkey};
use crate::error::WireError;
use crate::primitives::{Reader, Writer};

const TYPE_DH_COMMIT: u8 = 0x02;
const TYPE_DATA: u8 = 0x03;
const TYPE_DH_KEY: u8 = 0x0a;
const TYPE_REVEAL_SIGNATURE: u8 = 0x11;
const TYPE_SIGNATURE: u8 = 0x12;
const TYPE_IDENTITY: u8 = 0x35;
const TYPE_AUTH_R: u8 = 0x36;
const TYPE_AUTH_I: u8 = 0x37;

const VERSION_2: u16 = 2;
const VERSION_3: u16 = 3;
const VERSION_4: u16 = 4;

/// Sender/receiver instance tags, present on every v3+ encoded message
/// (§3 "Instance tag", §4.6 dispatcher routing).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct InstanceTags {
    pub sender: u32,
    pub receiver: u32,
}

impl InstanceTags {
    fn read(r: &mut Reader) -> Result<Self, WireError> {
        let sender = r.read_int()?;
        let receiver = r.read_int()?;
        Ok(Self { sender, receiver })
    }

    fn write(&self, w: &mut Writer) {
        w.write_int(self.sender);
        w.write_int(self.receiver);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DhCommit {
    pub version: u16,
    pub tags: InstanceTags,
    pub encrypted_gx: Vec<u8>,
    pub hash_gx: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DhKey {
    pub version: u16,
    pub tags: InstanceTags,
    pub gy: BigUint,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealSignature {
    pub version: u16,
    pub tags: InstanceTags,
    pub revealed_r: Vec<u8>,
    pub enc_sig: Vec<u8>,
    pub mac_sig: [u8; 20],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureMessage {
    pub version: u16,
    pub tags: InstanceTags,
    pub enc_sig: Vec<u8>,
    pub mac_sig: [u8; 20],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataMessage {
    pub version: u16,
    pub tags: InstanceTags,
    pub flags: u8,
    pub sender_keyid: u32,
    pub recipient_keyid: u32,
    pub next_dh: BigUint,
    pub ctr: [u8; 8],
    pub enc_msg: Vec<u8>,
    pub mac: [u8; 20],
    pub old_mac_keys: Vec<u8>,
}

/// OTRv4 Identity message (DAKE, partial support, §4.3/§6): carries the
/// ECDH point `Y` and the DH-3072 public value `B`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityMessage {
    pub tags: InstanceTags,
    pub y: [u8; 57],
    pub b: BigUint,
}

/// OTRv4 Auth-R message: the initiator's ephemeral material plus the ring
/// signature over the DAKE transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthR {
    pub tags: InstanceTags,
    pub x: [u8; 57],
    pub a: BigUint,
    pub sigma: RingSignature,
}

/// OTRv4 Auth-I message: the responder's ring signature closing the DAKE.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthI {
    pub tags: InstanceTags,
    pub sigma: RingSignature,
}

/// OTRv4 DATA message: same shape as v2/v3 DATA but with a 64-byte MAC and
/// an ECDH ratchet point alongside the DH ratchet value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataMessageV4 {
    pub tags: InstanceTags,
    pub flags: u8,
    pub sender_keyid: u32,
    pub recipient_keyid: u32,
    pub next_ecdh: [u8; 57],
    pub next_dh: Option<BigUint>,
    pub ctr: [u8; 8],
    pub enc_msg: Vec<u8>,
    pub mac: [u8; 64],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    Plaintext { text: String, versions: Vec<u16> },
    Query { versions: Vec<u16> },
    Error { text: String },
    DhCommit(DhCommit),
    DhKey(DhKey),
    RevealSignature(RevealSignature),
    Signature(SignatureMessage),
    Data(DataMessage),
    IdentityMessage(IdentityMessage),
    AuthR(AuthR),
    AuthI(AuthI),
    DataV4(DataMessageV4),
}

fn has_instance_tags(version: u16) -> bool {
    version >= VERSION_3
}

/// Decode a complete encoded message body (post-base64, post-header
/// `SHORT version`). `version` has already been read by the caller so it
/// can be used for framing decisions upstream (query/fragment detection).
pub fn decode_encoded(version: u16, body: &[u8]) -> Result<Message, WireError> {
    let mut r = Reader::new(body);
    let msg_type = r.read_byte()?;
    let tags = if has_instance_tags(version) {
        InstanceTags::read(&mut r)?
    } else {
        InstanceTags::default()
    };

    let message = match msg_type {
        TYPE_DH_COMMIT => Message::DhCommit(DhCommit {
            version,
            tags,
            encrypted_gx: r.read_data()?,
            hash_gx: r.read_data()?,
        }),
        TYPE_DH_KEY => Message::DhKey(DhKey {
            version,
            tags,
            gy: r.read_dh_pubkey()?,
        }),
        TYPE_REVEAL_SIGNATURE => Message::RevealSignature(RevealSignature {
            version,
            tags,
            revealed_r: r.read_data()?,
            enc_sig: r.read_data()?,
            mac_sig: r.read_mac()?,
        }),
        TYPE_SIGNATURE => Message::Signature(SignatureMessage {
            version,
            tags,
            enc_sig: r.read_data()?,
            mac_sig: r.read_mac()?,
        }),
        TYPE_DATA if version == VERSION_4 => Message::DataV4(DataMessageV4 {
            tags,
            flags: r.read_byte()?,
            sender_keyid: r.read_int()?,
            recipient_keyid: r.read_int()?,
            next_ecdh: r.read_ed448_point()?,
            next_dh: {
                let dh = r.read_mpi()?;
                if dh == BigUint::from(0u8) {
                    None
                } else {
                    Some(dh)
                }
            },
            ctr: r.read_ctr()?,
            enc_msg: r.read_data()?,
            mac: r.read_mac4()?,
        }),
        TYPE_DATA => Message::Data(DataMessage {
            version,
            tags,
            flags: r.read_byte()?,
            sender_keyid: r.read_int()?,
            recipient_keyid: r.read_int()?,
            next_dh: r.read_mpi()?,
            ctr: r.read_ctr()?,
            enc_msg: r.read_data()?,
            mac: r.read_mac()?,
            old_mac_keys: r.read_data()?,
        }),
        TYPE_IDENTITY => Message::IdentityMessage(IdentityMessage {
            tags,
            y: r.read_ed448_point()?,
            b: r.read_mpi()?,
        }),
        TYPE_AUTH_R => Message::AuthR(AuthR {
            tags,
            x: r.read_ed448_point()?,
            a: r.read_mpi()?,
            sigma: read_ring_signature(&mut r)?,
        }),
        TYPE_AUTH_I => Message::AuthI(AuthI {
            tags,
            sigma: read_ring_signature(&mut r)?,
        }),
        other => return Err(WireError::UnknownType(other)),
    };

    r.expect_exhausted()?;
    Ok(message)
}

pub fn encode(message: &Message) -> Result<Vec<u8>, WireError> {
    let mut w = Writer::new();
    match message {
        Message::Plaintext { .. } | Message::Query { .. } | Message::Error { .. } => {
            return Err(WireError::Malformed(
                "text framings are not binary-encoded".into(),
            ))
        }
        Message::DhCommit(m) => {
            w.write_short(m.version);
            w.write_byte(TYPE_DH_COMMIT);
            write_tags(&mut w, m.version, &m.tags);
            w.write_data(&m.encrypted_gx);
            w.write_data(&m.hash_gx);
        }
        Message::DhKey(m) => {
            w.write_short(m.version);
            w.write_byte(TYPE_DH_KEY);
            write_tags(&mut w, m.version, &m.tags);
            w.write_dh_pubkey(&m.gy);
        }
        Message::RevealSignature(m) => {
            w.write_short(m.version);
            w.write_byte(TYPE_REVEAL_SIGNATURE);
            write_tags(&mut w, m.version, &m.tags);
            w.write_data(&m.revealed_r);
            w.write_data(&m.enc_sig);
            w.write_fixed(&m.mac_sig);
        }
        Message::Signature(m) => {
            w.write_short(m.version);
            w.write_byte(TYPE_SIGNATURE);
            write_tags(&mut w, m.version, &m.tags);
            w.write_data(&m.enc_sig);
            w.write_fixed(&m.mac_sig);
        }
        Message::Data(m) => {
            w.write_short(m.version);
            w.write_byte(TYPE_DATA);
            write_tags(&mut w, m.version, &m.tags);
            w.write_byte(m.flags);
            w.write_int(m.sender_keyid);
            w.write_int(m.recipient_keyid);
            w.write_mpi(&m.next_dh);
            w.write_fixed(&m.ctr);
            w.write_data(&m.enc_msg);
            w.write_fixed(&m.mac);
            w.write_data(&m.old_mac_keys);
        }
        Message::IdentityMessage(m) => {
            w.write_short(VERSION_4);
            w.write_byte(TYPE_IDENTITY);
            m.tags.write(&mut w);
            w.write_fixed(&m.y);
            w.write_mpi(&m.b);
        }
        Message::AuthR(m) => {
            w.write_short(VERSION_4);
            w.write_byte(TYPE_AUTH_R);
            m.tags.write(&mut w);
            w.write_fixed(&m.x);
            w.write_mpi(&m.a);
            write_ring_signature(&mut w, &m.sigma);
        }
        Message::AuthI(m) => {
            w.write_short(VERSION_4);
            w.write_byte(TYPE_AUTH_I);
            m.tags.write(&mut w);
            write_ring_signature(&mut w, &m.sigma);
        }
        Message::DataV4(m) => {
            w.write_short(VERSION_4);
            w.write_byte(TYPE_DATA);
            m.tags.write(&mut w);
            w.write_byte(m.flags);
            w.write_int(m.sender_keyid);
            w.write_int(m.recipient_keyid);
            w.write_fixed(&m.next_ecdh);
            w.write_mpi(m.next_dh.as_ref().unwrap_or(&BigUint::from(0u8)));
            w.write_fixed(&m.ctr);
            w.write_data(&m.enc_msg);
            w.write_fixed(&m.mac);
        }
    }
    Ok(w.into_bytes())
}

fn write_tags(w: &mut Writer, version: u16, tags: &InstanceTags) {
    if has_instance_tags(version) {
        tags.write(w);
    }
}

fn read_ring_signature(r: &mut Reader) -> Result<RingSignature, WireError> {
    Ok(RingSignature {
        c1: r.read_ed448_scalar()?,
        r1: r.read_ed448_scalar()?,
        c2: r.read_ed448_scalar()?,
        r2: r.read_ed448_scalar()?,
    })
}

fn write_ring_signature(w: &mut Writer, sigma: &RingSignature) {
    w.write_fixed(&sigma.c1);
    w.write_fixed(&sigma.r1);
    w.write_fixed(&sigma.c2);
    w.write_fixed(&sigma.r2);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dsa_pubkey_bytes() -> Vec<u8> {
        let mut w = Writer::new();
        write_dsa_pubkey(
            &mut w,
            &DsaPublicKey {
                p: BigUint::from(23u8),
                q: BigUint::from(11u8),
                g: BigUint::from(2u8),
                y: BigUint::from(17u8),
            },
        );
        w.into_bytes()
    }

    #[test]
    fn dsa_pubkey_bytes_are_well_formed() {
        assert!(!sample_dsa_pubkey_bytes().is_empty());
    }

    #[test]
    fn dh_commit_v3_roundtrips() {
        let msg = Message::DhCommit(DhCommit {
            version: 3,
            tags: InstanceTags { sender: 0x5a73a599, receiver: 0x27e31597 },
            encrypted_gx: vec![1, 2, 3, 4],
            hash_gx: vec![5, 6, 7, 8],
        });
        let bytes = encode(&msg).unwrap();
        let mut r = Reader::new(&bytes);
        let version = r.read_short().unwrap();
        assert_eq!(version, 3);
        let decoded = decode_encoded(version, r.remaining()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn dh_commit_v2_has_no_instance_tags() {
        let msg = Message::DhCommit(DhCommit {
            version: 2,
            tags: InstanceTags::default(),
            encrypted_gx: vec![9],
            hash_gx: vec![10],
        });
        let bytes = encode(&msg).unwrap();
        // version(2) + type(1) + data(4+1) + data(4+1) = 13, no 8-byte tags.
        assert_eq!(bytes.len(), 2 + 1 + (4 + 1) + (4 + 1));
    }

    #[test]
    fn data_message_v3_roundtrips() {
        let msg = Message::Data(DataMessage {
            version: 3,
            tags: InstanceTags { sender: 1, receiver: 2 },
            flags: 0,
            sender_keyid: 1,
            recipient_keyid: 1,
            next_dh: BigUint::from(99u32),
            ctr: [0; 8],
            enc_msg: vec![0xAA; 16],
            mac: [0xBB; 20],
            old_mac_keys: vec![],
        });
        let bytes = encode(&msg).unwrap();
        let mut r = Reader::new(&bytes);
        let version = r.read_short().unwrap();
        let decoded = decode_encoded(version, r.remaining()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn unknown_type_tag_is_reported() {
        let mut body = Vec::new();
        body.push(0xEE);
        body.extend_from_slice(&1u32.to_be_bytes());
        body.extend_from_slice(&2u32.to_be_bytes());
        assert_eq!(decode_encoded(3, &body).unwrap_err(), WireError::UnknownType(0xEE));
    }

    #[test]
    fn identity_message_roundtrips() {
        use otr_crypto::ed448::KeyPair;
        use rand::rngs::OsRng;
        let pair = KeyPair::generate(&mut OsRng);
        let msg = Message::IdentityMessage(IdentityMessage {
            tags: InstanceTags { sender: 0x100, receiver: 0 },
            y: pair.public().to_bytes(),
            b: BigUint::from(12345u32),
        });
        let bytes = encode(&msg).unwrap();
        let mut r = Reader::new(&bytes);
        let version = r.read_short().unwrap();
        assert_eq!(version, 4);
        assert_eq!(decode_encoded(version, r.remaining()).unwrap(), msg);
    }
}
