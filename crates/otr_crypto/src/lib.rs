//! otr_crypto — Off-the-Record protocol cryptographic primitives
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize all secret exponents on drop.
//! - Group elements are public and modelled as plain big integers; secrets
//!   are generated into zeroizing byte buffers (§9 BigInteger hygiene).
//!
//! # Module layout
//! - `dh`       — the 1536-bit MODP group (OTRv2/v3 AKE, SMP's subgroup)
//! - `dh3072`   — the 3072-bit MODP group (OTRv4 DAKE, partial)
//! - `ed448`    — Ed448 signatures and points (OTRv4 DAKE, partial)
//! - `dsa_sig`  — DSA-SHA1 signatures (OTRv2/v3 long-term identity)
//! - `cipher`   — AES-128-CTR
//! - `hashes`   — SHA-1/SHA-256 and their HMAC variants, MPI encoding, `h2`
//! - `error`    — unified error type

pub mod cipher;
pub mod dh;
pub mod dh3072;
pub mod dsa_sig;
pub mod ed448;
pub mod error;
pub mod hashes;

pub use error::CryptoError;
pub use num_bigint_dig::BigUint;
