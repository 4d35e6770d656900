//! Domain layer containing the session monitor's business logic and types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, enums, errors)
//! - `session` - Session events, the summary read model and the fold step

pub mod foundation;
pub mod session;
