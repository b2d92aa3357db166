//! otr_wire — Off-the-Record protocol binary wire codec and text framings
//!
//! # Module layout
//! - `primitives` — BYTE/SHORT/INT/LONG/DATA/MPI and the fixed-width types
//! - `dsa`        — the DSA-PUBKEY composite primitive
//! - `message`    — the encoded-message tagged union and its byte layouts
//! - `text`       — query tag, whitespace tag, error message, base64 envelope
//! - `parse`      — the single parse entry point
//! - `error`      — unified error type

pub mod dsa;
pub mod error;
pub mod message;
pub mod parse;
pub mod primitives;
pub mod text;

pub use error::WireError;
pub use message::Message;
pub use parse::parse;
