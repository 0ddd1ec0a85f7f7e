//! Local campaign records as published by the campaign manager.
//!
//! These types describe what the caller wants on air. They carry only local
//! identifiers; translating them to remote identifiers is the job of the
//! [`crate::mapping`] module during an integration run.

mod types;

pub use types::*;
