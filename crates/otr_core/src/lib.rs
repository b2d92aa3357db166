//! otr_core — the multi-instance dispatcher and host boundary that ties the
//! wire, fragmentation, AKE, SMP, and session crates into one conversation
//! API (§3, §4.6, §4.7).
//!
//! # Module layout
//! - `host`       — the `Host` trait and `SessionId` (§4.7)
//! - `policy`     — the `Policy` struct (§3 "Policy")
//! - `dispatcher` — `Conversation`/`Account`: per-instance routing and AKE/session driving (§4.6)
//! - `error`      — `OtrError`/`HostError`

pub mod dispatcher;
pub mod error;
pub mod host;
pub mod policy;

pub use dispatcher::{generate_instance_tag, Account, Conversation};
pub use error::{HostError, OtrError};
pub use host::{Host, SessionId};
pub use policy::Policy;
