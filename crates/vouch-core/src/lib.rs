//! # vouch-core
//!
//! The rule records and per-field pipeline of the vouch validation engine.
//!
//! This crate provides:
//! - The two core traits (`FieldSource`, `Parse`)
//! - The closed `Rule` family and the ordered `Schema` mapping
//! - The common pipeline (`required → nullability → default → parse → hooks`)
//!
//! Recursion over nested schemas lives in `vouch-verify`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vouch_core::rule::{Configure, IntRule, Schema, StrRule};
//!
//! let schema = Schema::new()
//!     .field("name", StrRule::new().strip().required(true))
//!     .field("age", IntRule::new().gte(0).default_value(18));
//! ```

pub mod pipeline;
pub mod rule;
pub mod traits;

pub use rule::{Configure, Rule, Schema};
pub use traits::{FieldSource, Parse};
