#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc
)]

//! Private State Token issuer - VOPRF protocol codec and key lifecycle
//!
//! This crate implements the issuer/redeemer side of the Private State Token
//! (trust token) protocol: the binary wire formats for issuance and
//! redemption, the rotating key store with embedded key ids, issuance
//! orchestration and redemption verification.

// Fixed protocol choices:
// - VOPRF: RFC 9497 verifiable mode, OPRF(P-384, SHA-384)
// - Byte order: big-endian for every integer field
// - Key material: BE32(key_id) || raw key, for both halves of a key pair
// - Batch size: 1 token per issuance
//
// The VOPRF primitive sits behind `VoprfSuite`; everything else is pure
// byte handling over a read-only key store and is safe to call concurrently.

// Core modules
pub mod types;
pub mod errors;
pub mod ser;
pub mod key_material;
pub mod messages;
pub mod voprf;
pub mod p384_sha384;
pub mod key_store;
pub mod issuer;
pub mod redeemer;
pub mod client;
pub mod config;
pub mod service;

// Re-export commonly used types and functions
pub use types::*;
pub use errors::PstError;
pub use key_material::{embed_key_id, extract_key_id, extract_raw_key, KeyedMaterial};
pub use messages::{IssueRequest, IssueResponse, RedeemerRequest, RedeemerResponse};
pub use crate::voprf::{BlindEvaluation, DleqProof, GroupElement, RawKeyPair, VoprfError, VoprfSuite};
pub use p384_sha384::P384Sha384;
pub use key_store::{generate_keyed_pair, CommitmentDocument, KeyEntry, KeyStore, RawKeyEntry};
pub use issuer::PstIssuer;
pub use redeemer::PstRedeemer;
pub use client::{PstClient, Token};
pub use config::IssuerConfig;
pub use service::{decode_header, parse_redemption_record, PstService, RedemptionPolicy};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
