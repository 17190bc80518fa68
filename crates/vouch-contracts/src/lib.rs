//! # vouch-contracts
//!
//! Shared types for the vouch validation engine.
//!
//! All crates in the workspace import from here. No validation logic lives in
//! this crate: only the value model, the error taxonomy, and the message
//! catalog used to render violations.

pub mod error;
pub mod message;
pub mod value;

pub use error::{Violation, ViolationKind, VouchError, VouchResult};
pub use message::{MessageCatalog, MessageKey};
pub use value::{is_null_value, Map, Value};
