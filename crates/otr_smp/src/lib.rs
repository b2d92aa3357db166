//! otr_smp — the Socialist Millionaires Protocol (§4.4).
//!
//! # Module layout
//! - `group`    — the 1536-bit subgroup SMP runs over
//! - `zkp`      — the three Schnorr-like proof families (discrete-log, coords, equal-logs)
//! - `secret`   — turning a host secret into the group element SMP compares
//! - `messages` — SMP1-SMP4 wire payloads
//! - `state`    — the `SmpState` variants
//! - `engine`   — the state machine (`start`/`answer`/`on_smpN`) and TLV type constants
//! - `error`    — `SmpError`

pub mod engine;
pub mod error;
pub mod group;
pub mod messages;
pub mod secret;
pub mod state;
pub mod zkp;

pub use engine::{SmpEngine, SmpOutput, SmpResult, TLV_SMP1, TLV_SMP2, TLV_SMP3, TLV_SMP4, TLV_SMP_ABORT};
pub use error::SmpError;
pub use state::SmpState;
