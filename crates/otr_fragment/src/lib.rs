//! otr_fragment — Off-the-Record protocol message fragmentation and reassembly
//!
//! # Module layout
//! - `header`     — the three fragment header text formats (v2/v3/v4)
//! - `fragmenter` — `fragment()`, splitting an outbound encoded message
//! - `assembler`  — `Assembler::accumulate()`, reassembling inbound fragments
//! - `error`      — unified error type

pub mod assembler;
pub mod error;
pub mod fragmenter;
pub mod header;

pub use assembler::{Accumulated, Assembler};
pub use error::FragmentError;
pub use fragmenter::fragment;
