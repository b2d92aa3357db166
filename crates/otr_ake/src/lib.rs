//! otr_ake — the OTR authenticated key exchange.
//!
//! # Module layout
//! - `state`       — the `AuthState` variants (§3 "Auth state (AKE)")
//! - `engine`       — the OTRv2/v3 interactive signature AKE transition table (§4.3)
//! - `keys`         — key derivation from the DH shared secret
//! - `sig_payload`  — the `X` structure signed/encrypted inside Reveal-Signature/Signature
//! - `dh_commit`    — DH-Commit's `encrypted_gx`/`hash_gx` helpers
//! - `dake`         — partial OTRv4 DAKE message construction (no ring signatures)
//! - `error`        — `AkeError`

pub mod dake;
pub mod dh_commit;
pub mod engine;
pub mod error;
pub mod keys;
pub mod sig_payload;
pub mod state;

pub use engine::{AkeEngine, AkeOutput, Established};
pub use error::AkeError;
pub use state::AuthState;
