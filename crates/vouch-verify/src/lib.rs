//! # vouch-verify
//!
//! The verification orchestrator: walks a `Schema` in declared order,
//! resolves every field from a `FieldSource`, dispatches scalar rules to the
//! common pipeline and recurses into nested object and list rules.
//!
//! The first violation aborts the whole call. There is no partial output.

pub mod engine;

pub use engine::{Verifier, DEFAULT_MAX_DEPTH};
