//! otr_session — per-peer message state, session key rotation, DATA message
//! encode/decode, and TLV dispatch (§3, §4.5).
//!
//! # Module layout
//! - `keys`           — `SessionKeys`/`KeySet`: DH key rotation and AES/MAC derivation
//! - `tlv`            — TLV record encode/decode and type constants
//! - `message_state`  — the `Plaintext`/`Encrypted`/`Finished` state
//! - `session`         — the state machine driving DATA messages and TLV dispatch
//! - `error`          — `SessionError`

pub mod error;
pub mod keys;
pub mod message_state;
pub mod session;
pub mod tlv;

pub use error::SessionError;
pub use keys::{extra_symmetric_key, KeySet, SessionKeys};
pub use message_state::{EncryptedState, MessageState};
pub use session::{Session, SessionEvent};
