//! # vouch-request
//!
//! A framework-agnostic request adapter for the vouch validation engine.
//!
//! Web frameworks extract query strings, form bodies, headers and JSON from
//! their own request types; this crate takes those plain values, validates
//! each source against its own `Schema`, and collects the results in a
//! [`Params`] context for the handler. No HTTP types are involved.
//!
//! Two modes are provided:
//!
//! 1. **Per-source** — [`RequestRules::apply`] with one schema per source.
//! 2. **Merged** — [`merged`] with a single schema over whichever body the
//!    request carries.

pub mod request;
pub mod rules;

pub use request::{Headers, Params, RequestData};
pub use rules::{merged, RequestRules};

// ── Tests ─────────────────────────────────────────────────────────────────────
